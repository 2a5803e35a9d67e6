use std::error::Error;
use std::fmt::{self, Display};
use std::num::NonZeroUsize;

use scheduler::{Algorithm, Delays, IoReadmit, ParseAlgorithmError};

/// Number of ticks simulated when no budget is given.
pub const DEFAULT_TICK_BUDGET: usize = 1000;

/// Everything the driver needs besides the workload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    pub algorithm: Algorithm,
    pub cores: NonZeroUsize,
    /// Last tick to simulate, [`DEFAULT_TICK_BUDGET`] if `None`.
    pub tick_budget: Option<usize>,
    pub delays: Delays,
    pub io_readmit: IoReadmit,
}

impl Default for SimulationConfig {
    fn default() -> SimulationConfig {
        SimulationConfig {
            algorithm: Algorithm::default(),
            cores: NonZeroUsize::MIN,
            tick_budget: None,
            delays: Delays::default(),
            io_readmit: IoReadmit::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new(algorithm: Algorithm) -> SimulationConfig {
        SimulationConfig {
            algorithm,
            ..SimulationConfig::default()
        }
    }

    /// Builds a configuration from unchecked values, as typed by a user.
    ///
    /// * `policy` - `F`, `P`, `S`, `R<n>` or one of the long names
    /// * `cores` - number of CPU cores, at least 1
    pub fn from_args(policy: &str, cores: usize) -> Result<SimulationConfig, ConfigError> {
        let algorithm = policy.parse().map_err(ConfigError::Policy)?;
        let cores = NonZeroUsize::new(cores).ok_or(ConfigError::NoCores)?;
        Ok(SimulationConfig::new(algorithm).with_cores(cores))
    }

    pub fn with_cores(mut self, cores: NonZeroUsize) -> SimulationConfig {
        self.cores = cores;
        self
    }

    pub fn with_tick_budget(mut self, ticks: usize) -> SimulationConfig {
        self.tick_budget = Some(ticks);
        self
    }

    pub fn with_delays(mut self, delays: Delays) -> SimulationConfig {
        self.delays = delays;
        self
    }

    pub fn with_io_readmit(mut self, io_readmit: IoReadmit) -> SimulationConfig {
        self.io_readmit = io_readmit;
        self
    }

    pub fn budget(&self) -> usize {
        self.tick_budget.unwrap_or(DEFAULT_TICK_BUDGET)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    Policy(ParseAlgorithmError),
    NoCores,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Policy(err) => write!(f, "{err}"),
            ConfigError::NoCores => write!(f, "at least one CPU core is required"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Policy(err) => Some(err),
            ConfigError::NoCores => None,
        }
    }
}
