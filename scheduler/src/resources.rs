use std::num::NonZeroUsize;

use crate::process::Pid;

/// One CPU execution unit.
///
/// Context switches are modelled with two countdowns. The switch-out delay
/// is paid on the idle core after an eviction and blocks new assignments.
/// The switch-in delay is paid by the next occupant of a cold core: the
/// process holds the core but does not execute until it reaches 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Core {
    id: usize,
    process: Option<Pid>,
    switch_in: usize,
    switch_out: usize,
    slice_left: Option<usize>,
    cold: bool,
}

impl Core {
    /// Cores start cold: their first occupant pays the switch-in delay.
    pub fn new(id: usize) -> Core {
        Core {
            id,
            process: None,
            switch_in: 0,
            switch_out: 0,
            slice_left: None,
            cold: true,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn process(&self) -> Option<Pid> {
        self.process
    }

    pub fn is_idle(&self) -> bool {
        self.process.is_none()
    }

    pub fn switch_in(&self) -> usize {
        self.switch_in
    }

    pub fn switch_out(&self) -> usize {
        self.switch_out
    }

    /// Ticks left in the round-robin slice, `None` without slicing.
    pub fn slice_left(&self) -> Option<usize> {
        self.slice_left
    }

    /// Idle with no pending delay.
    pub fn is_eligible(&self) -> bool {
        self.is_idle() && self.switch_in == 0 && self.switch_out == 0
    }

    /// Occupied, but still loading its process.
    pub fn is_switching(&self) -> bool {
        self.process.is_some() && self.switch_in > 0
    }

    pub fn is_executing(&self) -> bool {
        self.process.is_some() && self.switch_in == 0
    }

    /// Returns whether the new occupant has to wait for a switch-in.
    pub(crate) fn assign(&mut self, pid: Pid, switch_in: usize, timeslice: Option<NonZeroUsize>) -> bool {
        debug_assert!(self.is_eligible(), "core {} is not eligible", self.id);

        self.process = Some(pid);
        if self.cold {
            self.switch_in = switch_in;
            self.cold = false;
        }
        self.slice_left = timeslice.map(NonZeroUsize::get);
        self.switch_in > 0
    }

    /// Frees the core after its process terminated. The core stays warm.
    pub(crate) fn release(&mut self) -> Option<Pid> {
        self.slice_left = None;
        self.process.take()
    }

    /// Removes a live process and starts the switch-out countdown.
    pub(crate) fn evict(&mut self, switch_out: usize) -> Option<Pid> {
        self.switch_out = switch_out;
        self.cold = true;
        self.slice_left = None;
        self.process.take()
    }

    pub(crate) fn refill(&mut self, timeslice: NonZeroUsize) {
        self.slice_left = Some(timeslice.get());
    }

    pub(crate) fn consume_slice(&mut self) {
        if let Some(left) = self.slice_left.as_mut() {
            *left = left.saturating_sub(1);
        }
    }

    /// Switch-out drains fully before switch-in starts.
    pub(crate) fn drain_delays(&mut self) {
        if self.switch_out > 0 {
            self.switch_out -= 1;
        } else if self.switch_in > 0 {
            self.switch_in -= 1;
        }
    }
}

/// The single shared I/O device. It services one process at a time;
/// everybody else queues in the scheduler's wait queue.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Disk {
    process: Option<Pid>,
}

impl Disk {
    pub fn new() -> Disk {
        Disk { process: None }
    }

    pub fn process(&self) -> Option<Pid> {
        self.process
    }

    pub fn is_idle(&self) -> bool {
        self.process.is_none()
    }

    pub(crate) fn claim(&mut self, pid: Pid) {
        debug_assert!(self.is_idle(), "disk already busy");
        self.process = Some(pid);
    }

    pub(crate) fn release(&mut self) -> Option<Pid> {
        self.process.take()
    }
}
