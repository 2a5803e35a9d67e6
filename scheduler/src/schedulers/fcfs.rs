use super::{DispatchView, Policy};

/// First come, first served: the ready queue head, never reordered.
#[derive(Copy, Clone, Debug, Default)]
pub struct Fcfs;

impl Policy for Fcfs {
    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn select_next(&mut self, view: DispatchView<'_>) -> Option<usize> {
        if view.ready.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}
