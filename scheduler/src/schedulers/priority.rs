use log::trace;

use super::{DispatchView, Policy};

/// Non-preemptive priority scheduling. Lower values run first.
///
/// The whole ready queue is stably sorted before every pick, so processes
/// with equal priority keep their FIFO order.
#[derive(Copy, Clone, Debug, Default)]
pub struct Priority;

impl Policy for Priority {
    fn name(&self) -> &'static str {
        "PRIORITY"
    }

    fn select_next(&mut self, view: DispatchView<'_>) -> Option<usize> {
        let processes = view.processes;
        view.ready
            .make_contiguous()
            .sort_by_key(|&pid| processes[pid].priority());
        trace!("ready queue by priority: {:?}", view.ready);

        if view.ready.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Pid, Process, ProcessTable};
    use crate::resources::{Core, Disk};
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    #[test]
    fn sorts_stably_by_priority() {
        let table = ProcessTable::new(vec![
            Process::cpu_bound(Pid::new(1), 0, 1, 2),
            Process::cpu_bound(Pid::new(2), 0, 1, 1),
            Process::cpu_bound(Pid::new(3), 0, 1, 1),
            Process::cpu_bound(Pid::new(4), 0, 1, -1),
        ])
        .unwrap();
        let cores = vec![Core::new(0)];
        let disk = Disk::new();
        let mut ready: VecDeque<Pid> = table.pids().into();

        let selected = Priority.select_next(DispatchView {
            ready: &mut ready,
            processes: &table,
            cores: &cores,
            disk: &disk,
            core: 0,
        });

        assert_eq!(selected, Some(0));
        assert_eq!(
            ready.into_iter().collect::<Vec<_>>(),
            vec![Pid::new(4), Pid::new(2), Pid::new(3), Pid::new(1)]
        );
    }
}
