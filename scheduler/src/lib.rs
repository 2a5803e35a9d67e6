//! A CPU scheduling library.
//!
//! This library provides the process model, the ready and wait queues,
//! the CPU cores and the disk of a simulated machine, together with the
//! dispatch policies that decide which ready process runs next.
//!

use std::num::NonZeroUsize;

mod machine;
mod process;
mod resources;
mod scheduler;

pub use crate::machine::{Delays, Event, IoReadmit, Machine, Violation};
pub use crate::process::{Burst, BurstKind, Location, Pid, Process, ProcessState, ProcessTable};
pub use crate::resources::{Core, Disk};
pub use crate::scheduler::Scheduler;

mod schedulers;

pub use schedulers::{
    Algorithm, DispatchView, Fcfs, ParseAlgorithmError, Policy, Priority, RoundRobin,
    ShortestRemainingBurst,
};

/// Returns a policy that always dispatches the head of the ready queue
pub fn fcfs() -> impl Policy {
    Fcfs
}

/// Returns a policy that dispatches the ready process with the lowest
/// priority value; equal priorities keep their arrival order
pub fn priority() -> impl Policy {
    Priority
}

/// Returns a policy that dispatches the ready process with the least time
/// left in its current burst
pub fn shortest_remaining_burst() -> impl Policy {
    ShortestRemainingBurst
}

/// Returns a policy with first come, first served admission whose running
/// processes are preempted when their slice runs out
///
/// * `timeslice` - the number of ticks a process can execute before it is
///                 sent back to the tail of the ready queue. A process that
///                 is the only ready one keeps its core.
pub fn round_robin(timeslice: NonZeroUsize) -> impl Policy {
    RoundRobin::new(timeslice)
}
