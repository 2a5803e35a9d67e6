use std::collections::HashMap;
use std::fmt::{self, Display};
use std::num::NonZeroUsize;
use std::ops::Index;

use crate::machine::Violation;

/// The PID of a process
///
/// The PID cannot be 0, PIDs start from 1.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Pid(NonZeroUsize);

impl Pid {
    /// Panics if `pid` is 0. Use [`Pid::try_new`] for untrusted input.
    pub fn new(pid: usize) -> Pid {
        Pid(NonZeroUsize::new(pid).expect("PIDs start from 1"))
    }

    pub fn try_new(pid: usize) -> Option<Pid> {
        NonZeroUsize::new(pid).map(Pid)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl PartialEq<usize> for Pid {
    fn eq(&self, other: &usize) -> bool {
        self.0.get() == *other
    }
}

impl Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle state of a process.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProcessState {
    /// Known to the system and waiting for a core (or not yet arrived).
    Ready,

    /// Assigned to a core.
    Running,

    /// Waiting for, or being serviced by, the disk.
    Waiting,

    /// All bursts consumed, the process will never be scheduled again.
    Terminated,
}

impl Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Ready => write!(f, "READY"),
            ProcessState::Running => write!(f, "RUNNING"),
            ProcessState::Waiting => write!(f, "WAITING"),
            ProcessState::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// The resource a burst needs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BurstKind {
    Cpu,
    Io,
}

impl Display for BurstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BurstKind::Cpu => write!(f, "CPU"),
            BurstKind::Io => write!(f, "IO"),
        }
    }
}

/// A contiguous span of CPU or I/O demand.
///
/// `start` is measured in elapsed ticks of the process, not in simulation
/// time. A burst lasts until the next burst starts, the last one until the
/// process duration is reached.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Burst {
    pub kind: BurstKind,
    pub start: usize,
}

impl Burst {
    pub fn cpu(start: usize) -> Burst {
        Burst {
            kind: BurstKind::Cpu,
            start,
        }
    }

    pub fn io(start: usize) -> Burst {
        Burst {
            kind: BurstKind::Io,
            start,
        }
    }
}

impl Display for Burst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.kind)
    }
}

/// Which container currently holds a reference to the process.
///
/// A process lives in exactly one place at a time; the machine keeps this
/// in sync with its queues, cores and disk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// Not admitted yet.
    Outside,
    Ready,
    Wait,
    Core(usize),
    Disk,
    /// I/O finished, re-admission to the ready queue is pending.
    Interrupted,
    Done,
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Outside => write!(f, "-"),
            Location::Ready => write!(f, "ready queue"),
            Location::Wait => write!(f, "wait queue"),
            Location::Core(core) => write!(f, "core {core}"),
            Location::Disk => write!(f, "disk"),
            Location::Interrupted => write!(f, "interrupt"),
            Location::Done => write!(f, "done"),
        }
    }
}

/// The process descriptor: static workload facts plus runtime state.
#[derive(Clone, Debug, PartialEq)]
pub struct Process {
    pid: Pid,
    arrival: usize,
    duration: usize,
    priority: i32,
    bursts: Vec<Burst>,

    state: ProcessState,
    elapsed: usize,
    cursor: Option<usize>,
    location: Location,
}

impl Process {
    /// Creates a process in the `Ready` state with no elapsed time.
    ///
    /// * `arrival` - the tick at which the process becomes known
    /// * `duration` - the sum of all burst lengths
    /// * `priority` - lower value means higher priority
    /// * `bursts` - ordered by `start`, the first one starting at 0
    pub fn new(pid: Pid, arrival: usize, duration: usize, priority: i32, bursts: Vec<Burst>) -> Process {
        let cursor = if bursts.is_empty() { None } else { Some(0) };
        Process {
            pid,
            arrival,
            duration,
            priority,
            bursts,
            state: ProcessState::Ready,
            elapsed: 0,
            cursor,
            location: Location::Outside,
        }
    }

    /// A process made of a single CPU burst.
    pub fn cpu_bound(pid: Pid, arrival: usize, duration: usize, priority: i32) -> Process {
        Process::new(pid, arrival, duration, priority, vec![Burst::cpu(0)])
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn arrival(&self) -> usize {
        self.arrival
    }

    pub fn duration(&self) -> usize {
        self.duration
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn elapsed(&self) -> usize {
        self.elapsed
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn has_arrived(&self, tick: usize) -> bool {
        tick >= self.arrival
    }

    /// The next burst that has not started yet.
    pub fn next_burst(&self) -> Option<&Burst> {
        self.cursor.map(|index| &self.bursts[index])
    }

    /// The burst the process is currently in.
    pub fn current_burst(&self) -> Option<&Burst> {
        let consumed = self.cursor.unwrap_or(self.bursts.len());
        consumed.checked_sub(1).map(|index| &self.bursts[index])
    }

    /// Elapsed time at which the current burst ends.
    pub fn next_event_time(&self) -> usize {
        self.next_burst().map_or(self.duration, |burst| burst.start)
    }

    /// Time left in the current burst.
    pub fn remaining_burst(&self) -> usize {
        self.next_event_time().saturating_sub(self.elapsed)
    }

    /// The kind of the next burst if its start offset has been reached.
    pub fn due_burst(&self) -> Option<BurstKind> {
        self.next_burst()
            .filter(|burst| burst.start <= self.elapsed)
            .map(|burst| burst.kind)
    }

    /// No burst left and the whole duration consumed.
    pub fn is_finished(&self) -> bool {
        self.cursor.is_none() && self.elapsed >= self.duration
    }

    pub(crate) fn consume_burst(&mut self) {
        self.cursor = self
            .cursor
            .map(|index| index + 1)
            .filter(|&next| next < self.bursts.len());
    }

    /// Elapsed time never goes past the duration.
    pub(crate) fn advance(&mut self) {
        if self.elapsed < self.duration {
            self.elapsed += 1;
        }
    }

    pub(crate) fn set_state(&mut self, state: ProcessState) {
        self.state = state;
    }

    pub(crate) fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// Moves the process to `location`, deriving the lifecycle state from it.
    pub(crate) fn place(&mut self, location: Location) {
        let state = match location {
            Location::Outside | Location::Ready => ProcessState::Ready,
            Location::Core(_) => ProcessState::Running,
            Location::Wait | Location::Disk | Location::Interrupted => ProcessState::Waiting,
            Location::Done => ProcessState::Terminated,
        };
        self.set_state(state);
        self.set_location(location);
    }
}

/// Arena of process descriptors, indexed by PID.
///
/// Processes are kept stably sorted by arrival time, so iteration visits
/// simultaneous arrivals in workload order.
#[derive(Clone, Debug, Default)]
pub struct ProcessTable {
    processes: Vec<Process>,
    slots: HashMap<Pid, usize>,
}

impl ProcessTable {
    pub fn new(mut processes: Vec<Process>) -> Result<ProcessTable, Violation> {
        processes.sort_by_key(Process::arrival);

        let mut slots = HashMap::with_capacity(processes.len());
        for (slot, process) in processes.iter().enumerate() {
            if slots.insert(process.pid(), slot).is_some() {
                return Err(Violation::DuplicatePid(process.pid()));
            }
        }

        Ok(ProcessTable { processes, slots })
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn get(&self, pid: Pid) -> Option<&Process> {
        self.slots.get(&pid).map(|&slot| &self.processes[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.processes.iter().map(Process::pid).collect()
    }

    /// PIDs handed to this method always come from the table itself.
    pub(crate) fn slot_mut(&mut self, pid: Pid) -> &mut Process {
        let slot = self.slots[&pid];
        &mut self.processes[slot]
    }
}

impl Index<Pid> for ProcessTable {
    type Output = Process;

    fn index(&self, pid: Pid) -> &Process {
        &self.processes[self.slots[&pid]]
    }
}
