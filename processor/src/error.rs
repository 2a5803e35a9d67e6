use std::error;
use std::fmt::{self, Display};

use scheduler::Violation;

use crate::config::ConfigError;
use crate::workload::WorkloadError;

/// Why a simulation could not be set up.
#[derive(Debug)]
pub enum Error {
    Workload(WorkloadError),
    Config(ConfigError),
    /// The workload breaks a machine invariant, e.g. a duplicated PID.
    Invariant(Violation),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Workload(_) => write!(f, "invalid workload"),
            Error::Config(_) => write!(f, "invalid configuration"),
            Error::Invariant(_) => write!(f, "inconsistent machine state"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Workload(err) => Some(err),
            Error::Config(err) => Some(err),
            Error::Invariant(err) => Some(err),
        }
    }
}

impl From<WorkloadError> for Error {
    fn from(err: WorkloadError) -> Error {
        Error::Workload(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl From<Violation> for Error {
    fn from(err: Violation) -> Error {
        Error::Invariant(err)
    }
}
