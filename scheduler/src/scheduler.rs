use std::collections::VecDeque;

use log::trace;

use crate::process::{Location, Pid, Process};

/// The ready and wait queues.
///
/// Both queues hold PIDs into the machine's process table and are bounded
/// by the number of processes in the workload. Insertion order is FIFO;
/// policies that reorder do so through [`Scheduler::ready_mut`].
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    ready: VecDeque<Pid>,
    wait: VecDeque<Pid>,
    capacity: usize,
}

impl Scheduler {
    pub fn with_capacity(capacity: usize) -> Scheduler {
        Scheduler {
            ready: VecDeque::with_capacity(capacity),
            wait: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `process` to the ready queue and marks it `Ready`.
    ///
    /// Returns `false` and leaves the queue untouched if the process is
    /// already queued.
    pub fn enqueue_ready(&mut self, process: &mut Process) -> bool {
        if self.contains(process.pid()) {
            trace!("pid {} already in the ready queue", process.pid());
            return false;
        }
        debug_assert!(self.ready.len() < self.capacity, "ready queue overflow");

        self.ready.push_back(process.pid());
        process.place(Location::Ready);
        true
    }

    /// Removes the entry at `index`, keeping the order of the others.
    pub fn dequeue_ready(&mut self, index: usize) -> Option<Pid> {
        self.ready.remove(index)
    }

    /// Appends `process` to the wait queue and marks it `Waiting`.
    pub fn enqueue_wait(&mut self, process: &mut Process) {
        debug_assert!(!self.wait.contains(&process.pid()), "pid already waiting");
        debug_assert!(self.wait.len() < self.capacity, "wait queue overflow");

        self.wait.push_back(process.pid());
        process.place(Location::Wait);
    }

    /// The disk takes waiting processes in request order.
    pub fn dequeue_wait(&mut self) -> Option<Pid> {
        self.wait.pop_front()
    }

    /// Whether the ready queue is empty.
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    pub fn is_wait_empty(&self) -> bool {
        self.wait.is_empty()
    }

    /// Whether `pid` is in the ready queue.
    pub fn contains(&self, pid: Pid) -> bool {
        self.ready.contains(&pid)
    }

    pub fn ready(&self) -> &VecDeque<Pid> {
        &self.ready
    }

    pub fn waiting(&self) -> &VecDeque<Pid> {
        &self.wait
    }

    pub(crate) fn ready_mut(&mut self) -> &mut VecDeque<Pid> {
        &mut self.ready
    }
}
