use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Display};
use std::mem;
use std::num::NonZeroUsize;

use log::trace;

use crate::process::{BurstKind, Location, Pid, Process, ProcessState, ProcessTable};
use crate::resources::{Core, Disk};
use crate::scheduler::Scheduler;
use crate::schedulers::{DispatchView, Policy};

/// Context switch costs, in ticks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Delays {
    /// Paid by a process loaded onto a cold core.
    pub switch_in: usize,
    /// Paid by a core after evicting a live process.
    pub switch_out: usize,
}

impl Default for Delays {
    fn default() -> Delays {
        Delays {
            switch_in: 1,
            switch_out: 2,
        }
    }
}

/// When a process whose I/O burst completed goes back to the ready queue.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum IoReadmit {
    /// The interrupt is handled in the completion tick and the process is
    /// re-admitted on the following one.
    #[default]
    NextTick,
    /// Re-admitted in the completion tick, before dispatch.
    SameTick,
}

/// Something that happened to a process during a tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The first CPU burst started, the process joined the ready queue.
    Arrived(Pid),
    /// An I/O burst started. `core` is the core the process has to leave.
    IoRequested { pid: Pid, core: Option<usize> },
    /// The process left its core for the wait queue.
    Evicted { pid: Pid, core: usize },
    DiskClaimed(Pid),
    /// The I/O burst ended and the disk was released.
    IoCompleted(Pid),
    /// The interrupt was handled, the process is back in the ready queue.
    Readmitted(Pid),
    Dispatched { pid: Pid, core: usize, switching: bool },
    Preempted { pid: Pid, core: usize },
    Terminated { pid: Pid, core: usize },
}

impl Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Arrived(pid) => write!(f, "{pid} arrived"),
            Event::IoRequested { pid, core: Some(core) } => {
                write!(f, "{pid} requested I/O on core {core}")
            }
            Event::IoRequested { pid, core: None } => write!(f, "{pid} requested I/O"),
            Event::Evicted { pid, core } => write!(f, "{pid} left core {core}"),
            Event::DiskClaimed(pid) => write!(f, "{pid} claimed the disk"),
            Event::IoCompleted(pid) => write!(f, "{pid} finished I/O"),
            Event::Readmitted(pid) => write!(f, "{pid} readmitted"),
            Event::Dispatched {
                pid,
                core,
                switching,
            } => {
                if *switching {
                    write!(f, "{pid} dispatched to core {core} (switching in)")
                } else {
                    write!(f, "{pid} dispatched to core {core}")
                }
            }
            Event::Preempted { pid, core } => write!(f, "{pid} preempted on core {core}"),
            Event::Terminated { pid, core } => write!(f, "{pid} terminated on core {core}"),
        }
    }
}

/// A broken machine invariant. These are logic errors, never expected
/// outside of tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    DuplicatePid(Pid),
    /// The process is referenced by two containers at once.
    Exclusivity { pid: Pid, first: Location, second: Location },
    /// The process record disagrees with the container that holds it.
    Misplaced { pid: Pid, recorded: Location, actual: Location },
    /// The lifecycle state does not match the location.
    State { pid: Pid, state: ProcessState, location: Location },
    Conservation { counted: usize, expected: usize },
    Elapsed { pid: Pid, elapsed: usize, duration: usize },
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicatePid(pid) => write!(f, "pid {pid} appears twice"),
            Violation::Exclusivity { pid, first, second } => {
                write!(f, "pid {pid} is held by {first} and {second}")
            }
            Violation::Misplaced {
                pid,
                recorded,
                actual,
            } => write!(f, "pid {pid} recorded in {recorded} but held by {actual}"),
            Violation::State {
                pid,
                state,
                location,
            } => write!(f, "pid {pid} is {state} in {location}"),
            Violation::Conservation { counted, expected } => {
                write!(f, "{counted} processes accounted for, expected {expected}")
            }
            Violation::Elapsed {
                pid,
                elapsed,
                duration,
            } => write!(f, "pid {pid} elapsed {elapsed} exceeds duration {duration}"),
        }
    }
}

impl Error for Violation {}

/// The simulated computer: process table, queues, cores and disk.
///
/// This is the context handed to dispatch policies. The simulation driver
/// sequences the phase methods; each one performs a single step of the
/// tick and reports what happened as [`Event`]s.
#[derive(Clone, Debug)]
pub struct Machine {
    table: ProcessTable,
    scheduler: Scheduler,
    cores: Vec<Core>,
    disk: Disk,
    delays: Delays,
    io_requests: Vec<Pid>,
    interrupts: Vec<(Pid, usize)>,
}

impl Machine {
    pub fn new(processes: Vec<Process>, cores: NonZeroUsize, delays: Delays) -> Result<Machine, Violation> {
        let table = ProcessTable::new(processes)?;
        let scheduler = Scheduler::with_capacity(table.len());

        Ok(Machine {
            table,
            scheduler,
            cores: (0..cores.get()).map(Core::new).collect(),
            disk: Disk::new(),
            delays,
            io_requests: Vec::new(),
            interrupts: Vec::new(),
        })
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.table
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.table.get(pid)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    pub fn disk(&self) -> &Disk {
        &self.disk
    }

    /// Processes whose I/O completed and which wait for re-admission.
    pub fn pending_interrupts(&self) -> impl Iterator<Item = Pid> + '_ {
        self.interrupts.iter().map(|&(pid, _)| pid)
    }

    pub fn all_terminated(&self) -> bool {
        self.table
            .iter()
            .all(|process| process.state() == ProcessState::Terminated)
    }

    /// Looks at the next pending burst of `pid` and starts it if due.
    ///
    /// A due CPU burst admits a new process, ends the I/O of a disk-bound
    /// one, or simply continues on the core. A due I/O burst signals an
    /// I/O request that [`Machine::dispatch`] will serve.
    pub fn process_event(&mut self, pid: Pid, tick: usize) -> Option<Event> {
        let (location, due, finished) = {
            let process = self.table.get(pid)?;
            if !process.has_arrived(tick) || process.state() == ProcessState::Terminated {
                return None;
            }
            (process.location(), process.due_burst(), process.is_finished())
        };

        match (location, due) {
            (Location::Outside, Some(BurstKind::Cpu) | None) => {
                self.table.slot_mut(pid).consume_burst();
                self.scheduler.enqueue_ready(self.table.slot_mut(pid));
                Some(Event::Arrived(pid))
            }
            (Location::Outside, Some(BurstKind::Io)) => {
                self.table.slot_mut(pid).consume_burst();
                self.scheduler.enqueue_wait(self.table.slot_mut(pid));
                Some(Event::IoRequested { pid, core: None })
            }
            (Location::Core(core), Some(kind)) => {
                self.table.slot_mut(pid).consume_burst();
                if kind == BurstKind::Cpu {
                    trace!("pid {pid} starts a new CPU burst on core {core}");
                    return None;
                }
                self.io_requests.push(pid);
                Some(Event::IoRequested {
                    pid,
                    core: Some(core),
                })
            }
            (Location::Disk, Some(BurstKind::Io)) => {
                trace!("pid {pid} starts a new I/O burst");
                self.table.slot_mut(pid).consume_burst();
                None
            }
            (Location::Disk, Some(BurstKind::Cpu)) => {
                self.table.slot_mut(pid).consume_burst();
                Some(self.complete_io(pid, tick))
            }
            (Location::Disk, None) if finished => Some(self.complete_io(pid, tick)),
            _ => None,
        }
    }

    fn complete_io(&mut self, pid: Pid, tick: usize) -> Event {
        self.disk.release();
        self.table.slot_mut(pid).place(Location::Interrupted);
        self.interrupts.push((pid, tick));
        Event::IoCompleted(pid)
    }

    /// Frees every core whose process consumed its whole duration.
    pub fn retire_finished(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        for core in self.cores.iter_mut() {
            let Some(pid) = core.process() else {
                continue;
            };
            let process = self.table.slot_mut(pid);
            if process.is_finished() && !self.io_requests.contains(&pid) {
                core.release();
                process.place(Location::Done);
                events.push(Event::Terminated { pid, core: core.id() });
            }
        }
        events
    }

    /// Preempts processes whose slice ran out, unless nobody else is ready.
    pub fn expire_slices(&mut self, timeslice: Option<NonZeroUsize>) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(timeslice) = timeslice else {
            return events;
        };

        for core in self.cores.iter_mut() {
            let Some(pid) = core.process() else {
                continue;
            };
            if core.slice_left() != Some(0) || self.io_requests.contains(&pid) {
                continue;
            }
            if self.scheduler.is_empty() {
                trace!("pid {pid} keeps core {}, nobody else is ready", core.id());
                core.refill(timeslice);
                continue;
            }

            core.evict(self.delays.switch_out);
            self.scheduler.enqueue_ready(self.table.slot_mut(pid));
            events.push(Event::Preempted { pid, core: core.id() });
        }
        events
    }

    /// Puts processes whose I/O completed back at the tail of the ready
    /// queue, according to `mode`.
    pub fn resolve_interrupts(&mut self, tick: usize, mode: IoReadmit) -> Vec<Event> {
        let mut events = Vec::new();
        let mut pending = mem::take(&mut self.interrupts);

        pending.retain(|&(pid, raised)| {
            let due = match mode {
                IoReadmit::NextTick => raised < tick,
                IoReadmit::SameTick => raised <= tick,
            };
            if due {
                self.scheduler.enqueue_ready(self.table.slot_mut(pid));
                events.push(Event::Readmitted(pid));
            }
            !due
        });

        self.interrupts = pending;
        events
    }

    /// Moves I/O requesters off their cores and feeds the disk.
    fn settle_io(&mut self) -> Vec<Event> {
        let mut events = Vec::new();

        for pid in mem::take(&mut self.io_requests) {
            if let Location::Core(core) = self.table[pid].location() {
                self.cores[core].evict(self.delays.switch_out);
                self.scheduler.enqueue_wait(self.table.slot_mut(pid));
                events.push(Event::Evicted { pid, core });
            }
        }

        if self.disk.is_idle() {
            if let Some(pid) = self.scheduler.dequeue_wait() {
                self.disk.claim(pid);
                self.table.slot_mut(pid).place(Location::Disk);
                events.push(Event::DiskClaimed(pid));
            }
        }

        events
    }

    /// Serves pending I/O requests, then lets `policy` pick at most one
    /// ready process for every eligible core, in core order.
    pub fn dispatch(&mut self, policy: &mut dyn Policy) -> Vec<Event> {
        let mut events = self.settle_io();

        for core in 0..self.cores.len() {
            if self.scheduler.is_empty() {
                break;
            }
            if !self.cores[core].is_eligible() {
                continue;
            }

            let selected = policy.select_next(DispatchView {
                ready: self.scheduler.ready_mut(),
                processes: &self.table,
                cores: &self.cores,
                disk: &self.disk,
                core,
            });
            let Some(pid) = selected.and_then(|index| self.scheduler.dequeue_ready(index)) else {
                continue;
            };

            let switching = self.cores[core].assign(pid, self.delays.switch_in, policy.timeslice());
            self.table.slot_mut(pid).place(Location::Core(core));
            events.push(Event::Dispatched {
                pid,
                core,
                switching,
            });
        }

        events
    }

    /// Ends the tick: executing and disk-bound processes advance by one,
    /// the other cores drain their delays.
    pub fn advance(&mut self) {
        for core in self.cores.iter_mut() {
            match core.process() {
                Some(pid) if core.is_executing() => {
                    self.table.slot_mut(pid).advance();
                    core.consume_slice();
                }
                _ => core.drain_delays(),
            }
        }

        if let Some(pid) = self.disk.process() {
            self.table.slot_mut(pid).advance();
        }
    }

    /// Checks queue exclusivity, state/location agreement, conservation and
    /// elapsed bounds.
    pub fn check_invariants(&self) -> Result<(), Violation> {
        let mut held: HashMap<Pid, Location> = HashMap::new();
        let mut hold = |pid: Pid, location: Location| match held.insert(pid, location) {
            Some(first) => Err(Violation::Exclusivity {
                pid,
                first,
                second: location,
            }),
            None => Ok(()),
        };

        for &pid in self.scheduler.ready() {
            hold(pid, Location::Ready)?;
        }
        for &pid in self.scheduler.waiting() {
            hold(pid, Location::Wait)?;
        }
        for core in &self.cores {
            if let Some(pid) = core.process() {
                hold(pid, Location::Core(core.id()))?;
            }
        }
        if let Some(pid) = self.disk.process() {
            hold(pid, Location::Disk)?;
        }
        for pid in self.pending_interrupts() {
            hold(pid, Location::Interrupted)?;
        }

        let mut counted = held.len();
        for process in self.table.iter() {
            let recorded = process.location();
            match held.get(&process.pid()) {
                Some(&actual) if actual != recorded => {
                    return Err(Violation::Misplaced {
                        pid: process.pid(),
                        recorded,
                        actual,
                    })
                }
                None if !matches!(recorded, Location::Outside | Location::Done) => {
                    return Err(Violation::Misplaced {
                        pid: process.pid(),
                        recorded,
                        actual: Location::Outside,
                    })
                }
                _ => {}
            }

            let expected = match recorded {
                Location::Outside | Location::Ready => ProcessState::Ready,
                Location::Core(_) => ProcessState::Running,
                Location::Wait | Location::Disk | Location::Interrupted => ProcessState::Waiting,
                Location::Done => ProcessState::Terminated,
            };
            if process.state() != expected {
                return Err(Violation::State {
                    pid: process.pid(),
                    state: process.state(),
                    location: recorded,
                });
            }

            if process.elapsed() > process.duration() {
                return Err(Violation::Elapsed {
                    pid: process.pid(),
                    elapsed: process.elapsed(),
                    duration: process.duration(),
                });
            }

            if matches!(recorded, Location::Outside | Location::Done) {
                counted += 1;
            }
        }

        // held, outside or done; pids unknown to the table break the count
        if counted != self.table.len() {
            return Err(Violation::Conservation {
                counted,
                expected: self.table.len(),
            });
        }
        Ok(())
    }
}
