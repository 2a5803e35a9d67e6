use super::{DispatchView, Policy};

/// Shortest remaining burst first.
///
/// Picks the ready process whose current burst has the least time left,
/// ignoring processes with nothing left in their burst. Ties go to the
/// earliest entry. The queue itself is never reordered.
#[derive(Copy, Clone, Debug, Default)]
pub struct ShortestRemainingBurst;

impl Policy for ShortestRemainingBurst {
    fn name(&self) -> &'static str {
        "SRB"
    }

    fn select_next(&mut self, view: DispatchView<'_>) -> Option<usize> {
        let shortest = view
            .ready
            .iter()
            .enumerate()
            .map(|(index, &pid)| (index, view.processes[pid].remaining_burst()))
            .filter(|&(_, remaining)| remaining > 0)
            .min_by_key(|&(index, remaining)| (remaining, index))
            .map(|(index, _)| index);

        // processes readmitted only to exit have nothing left in their burst
        shortest.or_else(|| (!view.ready.is_empty()).then_some(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Pid, Process, ProcessTable};
    use crate::resources::{Core, Disk};
    use std::collections::VecDeque;

    fn admitted(pid: usize, duration: usize) -> Process {
        let mut process = Process::cpu_bound(Pid::new(pid), 0, duration, 0);
        process.consume_burst();
        process
    }

    fn select(table: &ProcessTable, ready: &mut VecDeque<Pid>) -> Option<usize> {
        let cores = vec![Core::new(0)];
        let disk = Disk::new();
        ShortestRemainingBurst.select_next(DispatchView {
            ready,
            processes: table,
            cores: &cores,
            disk: &disk,
            core: 0,
        })
    }

    #[test]
    fn picks_the_shortest_burst_wherever_it_is() {
        let table = ProcessTable::new(vec![admitted(1, 5), admitted(2, 2), admitted(3, 8)]).unwrap();
        let mut ready: VecDeque<Pid> = table.pids().into();

        assert_eq!(select(&table, &mut ready), Some(1));
        assert_eq!(ready.len(), 3);
    }

    #[test]
    fn ties_go_to_the_first_entry() {
        let table = ProcessTable::new(vec![admitted(1, 3), admitted(2, 2), admitted(3, 2)]).unwrap();
        let mut ready: VecDeque<Pid> = table.pids().into();

        assert_eq!(select(&table, &mut ready), Some(1));
    }

    #[test]
    fn zero_remaining_falls_back_to_the_head() {
        let mut finished = admitted(1, 1);
        finished.advance();
        let table = ProcessTable::new(vec![finished, admitted(2, 0)]).unwrap();
        let mut ready: VecDeque<Pid> = table.pids().into();

        assert_eq!(select(&table, &mut ready), Some(0));
        assert_eq!(select(&table, &mut VecDeque::new()), None);
    }
}
