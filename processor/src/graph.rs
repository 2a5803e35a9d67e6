use std::collections::BTreeMap;
use std::fmt::Write;

use scheduler::Pid;

use crate::stats::{Observation, Observer};

/// Records every observation so that a run can be drawn as a Gantt chart.
///
/// One row per process and one for the disk, one column per tick:
///
/// ```text
/// tick  0123456789
/// 1     ~0000.....
/// 2     RRRRR0000.
/// disk  ..........
/// ```
///
/// `R` ready, `W` waiting, a digit is the core (`~` while switching in),
/// `.` not arrived yet or terminated, `D` disk busy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    rows: BTreeMap<Pid, Vec<(usize, Observation)>>,
    disk: Vec<(usize, Option<Pid>)>,
}

impl Graph {
    pub fn new() -> Graph {
        Graph::default()
    }

    /// Observations of `pid`, in tick order.
    pub fn history(&self, pid: Pid) -> &[(usize, Observation)] {
        self.rows.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn disk_history(&self) -> &[(usize, Option<Pid>)] {
        &self.disk
    }

    /// Number of columns.
    pub fn ticks(&self) -> usize {
        let last = self
            .rows
            .values()
            .filter_map(|row| row.last())
            .map(|&(tick, _)| tick)
            .chain(self.disk.last().map(|&(tick, _)| tick))
            .max();
        last.map_or(0, |tick| tick + 1)
    }

    pub fn render(&self) -> String {
        let ticks = self.ticks();
        let mut chart = String::new();

        let ruler: String = (0..ticks)
            .map(|tick| char::from_digit((tick % 10) as u32, 10).unwrap_or('?'))
            .collect();
        let _ = writeln!(chart, "{:<6}{ruler}", "tick");

        for (pid, row) in &self.rows {
            let mut cells = vec!['.'; ticks];
            for &(tick, observation) in row {
                cells[tick] = cell(observation);
            }
            let _ = writeln!(chart, "{:<6}{}", pid.to_string(), cells.iter().collect::<String>());
        }

        let mut cells = vec!['.'; ticks];
        for &(tick, busy) in &self.disk {
            if busy.is_some() {
                cells[tick] = 'D';
            }
        }
        let _ = writeln!(chart, "{:<6}{}", "disk", cells.iter().collect::<String>());

        chart
    }
}

fn cell(observation: Observation) -> char {
    match observation {
        Observation::Ready => 'R',
        Observation::Running {
            switching: true, ..
        } => '~',
        Observation::Running { core, .. } => {
            char::from_digit((core % 10) as u32, 10).unwrap_or('?')
        }
        Observation::Waiting => 'W',
        Observation::Terminated => '.',
    }
}

impl Observer for Graph {
    fn observe(&mut self, tick: usize, pid: Pid, observation: Observation) {
        self.rows.entry(pid).or_default().push((tick, observation));
    }

    fn observe_disk(&mut self, tick: usize, disk: Option<Pid>) {
        self.disk.push((tick, disk));
    }
}
