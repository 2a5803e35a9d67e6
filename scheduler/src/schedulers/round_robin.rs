use std::num::NonZeroUsize;

use super::{DispatchView, Policy};

/// Round robin: FCFS admission with a fixed time slice.
///
/// Preemption itself is carried out by the machine when a core's slice
/// runs out, see [`crate::Machine::expire_slices`].
#[derive(Copy, Clone, Debug)]
pub struct RoundRobin {
    timeslice: NonZeroUsize,
}

impl RoundRobin {
    pub fn new(timeslice: NonZeroUsize) -> Self {
        RoundRobin { timeslice }
    }
}

impl Policy for RoundRobin {
    fn name(&self) -> &'static str {
        "RR"
    }

    fn select_next(&mut self, view: DispatchView<'_>) -> Option<usize> {
        if view.ready.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    fn timeslice(&self) -> Option<NonZeroUsize> {
        Some(self.timeslice)
    }
}
