//! A processor simulation library
//!
//! This is used for running the policies of the [`scheduler`] crate over a
//! workload, one discrete tick at a time, and collecting what happened.

mod config;
mod driver;
mod error;
mod graph;
mod logs;
mod stats;
mod workload;

pub use config::{ConfigError, SimulationConfig, DEFAULT_TICK_BUDGET};
pub use driver::{Processor, Report};
pub use error::Error;
pub use graph::Graph;
pub use logs::{format_logs, Log, ProcessInfo};
pub use stats::{Observation, Observer, ProcessStats, Stats, Summary};
pub use workload::{Workload, WorkloadError, WorkloadErrorKind, MAX_LINE_LENGTH};

/// Loads `input` and runs it to completion.
///
/// * `config` - the simulation parameters
/// * `input` - a workload in the line format of [`Workload::parse`]
pub fn simulate(config: SimulationConfig, input: &str) -> Result<Report, Error> {
    let workload = Workload::parse(input)?;
    Ok(Processor::new(config, workload)?.run())
}
