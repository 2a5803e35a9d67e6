//! Dispatch policies
//!
//! Every policy answers one question: which entry of the ready queue, if
//! any, goes to the core being filled. The machine calls it once for every
//! eligible core, in core order, and dequeues the returned index.
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display};
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::process::{Pid, ProcessTable};
use crate::resources::{Core, Disk};

mod fcfs;
pub use fcfs::Fcfs;

mod priority;
pub use priority::Priority;

mod srb;
pub use srb::ShortestRemainingBurst;

mod round_robin;
pub use round_robin::RoundRobin;

/// What a policy sees while a core is being filled.
///
/// `ready` is mutable so that policies may reorder it; the entries
/// themselves must stay the same.
pub struct DispatchView<'a> {
    pub ready: &'a mut VecDeque<Pid>,
    pub processes: &'a ProcessTable,
    pub cores: &'a [Core],
    pub disk: &'a Disk,
    /// Index of the core being filled.
    pub core: usize,
}

/// A dispatch strategy.
pub trait Policy {
    fn name(&self) -> &'static str;

    /// Returns the index in `view.ready` of the process to run on
    /// `view.core`, or `None` to leave the core idle this tick.
    fn select_next(&mut self, view: DispatchView<'_>) -> Option<usize>;

    /// The slice length, for preemptive policies.
    fn timeslice(&self) -> Option<NonZeroUsize> {
        None
    }
}

/// The closed set of available policies.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    #[default]
    Fcfs,
    Priority,
    ShortestRemainingBurst,
    RoundRobin { timeslice: NonZeroUsize },
}

impl Algorithm {
    pub fn policy(&self) -> Box<dyn Policy> {
        match *self {
            Algorithm::Fcfs => Box::new(crate::fcfs()),
            Algorithm::Priority => Box::new(crate::priority()),
            Algorithm::ShortestRemainingBurst => Box::new(crate::shortest_remaining_burst()),
            Algorithm::RoundRobin { timeslice } => Box::new(crate::round_robin(timeslice)),
        }
    }

    pub fn timeslice(&self) -> Option<NonZeroUsize> {
        match self {
            Algorithm::RoundRobin { timeslice } => Some(*timeslice),
            _ => None,
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Fcfs => write!(f, "FCFS"),
            Algorithm::Priority => write!(f, "PRIORITY"),
            Algorithm::ShortestRemainingBurst => write!(f, "SRB"),
            Algorithm::RoundRobin { timeslice } => write!(f, "RR({timeslice})"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseAlgorithmError {
    Unknown(String),
    /// Round robin without a positive slice length.
    Timeslice(String),
}

impl Display for ParseAlgorithmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAlgorithmError::Unknown(input) => write!(f, "unknown scheduling policy `{input}`"),
            ParseAlgorithmError::Timeslice(input) => {
                write!(f, "invalid round robin time slice in `{input}`")
            }
        }
    }
}

impl Error for ParseAlgorithmError {}

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    /// Accepts `F`, `P`, `S`, `R<n>` and `fcfs`, `priority`, `srb`, `rr:<n>`.
    fn from_str(input: &str) -> Result<Algorithm, ParseAlgorithmError> {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();

        match (trimmed, lower.as_str()) {
            ("F", _) | (_, "fcfs") => return Ok(Algorithm::Fcfs),
            ("P", _) | (_, "priority") => return Ok(Algorithm::Priority),
            ("S", _) | (_, "srb") => return Ok(Algorithm::ShortestRemainingBurst),
            _ => {}
        }

        let slice = lower
            .strip_prefix("rr:")
            .or_else(|| trimmed.strip_prefix('R'))
            .ok_or_else(|| ParseAlgorithmError::Unknown(input.to_string()))?;
        slice
            .parse::<NonZeroUsize>()
            .map(|timeslice| Algorithm::RoundRobin { timeslice })
            .map_err(|_| ParseAlgorithmError::Timeslice(input.to_string()))
    }
}
