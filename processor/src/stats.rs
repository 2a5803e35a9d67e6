//! Per-process performance statistics
//!
//! [`Stats`] is fed one [`Observation`] per tick for every process that has
//! arrived and accumulates waiting time, CPU time, context switches and
//! completion times from them.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Write};

use serde::{Serialize, Serializer};

use scheduler::{Pid, ProcessTable};

/// What a process was doing during a tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Observation {
    Ready,
    /// `switching` is set while the core loads the process.
    Running { core: usize, switching: bool },
    Waiting,
    Terminated,
}

/// Receives the per-tick state of the simulation.
pub trait Observer {
    /// Called exactly once per tick for every arrived process.
    fn observe(&mut self, tick: usize, pid: Pid, observation: Observation);

    /// Called exactly once per tick with the process on the disk.
    fn observe_disk(&mut self, _tick: usize, _disk: Option<Pid>) {}
}

fn serialize_pid<S: Serializer>(pid: &Pid, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(pid.get() as u64)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessStats {
    #[serde(serialize_with = "serialize_pid")]
    pub pid: Pid,
    pub priority: i32,
    pub arrival: usize,
    /// Tick of the first `Terminated` observation.
    pub finish: Option<usize>,
    pub turnaround: Option<usize>,
    pub cpu_time: usize,
    /// Ticks spent ready or waiting for I/O.
    pub waiting_time: usize,
    /// Ticks spent on a core while it was loading the process.
    pub switch_time: usize,
    pub context_switches: usize,
    #[serde(skip)]
    last: Option<Observation>,
}

impl ProcessStats {
    fn new(pid: Pid, priority: i32, arrival: usize) -> ProcessStats {
        ProcessStats {
            pid,
            priority,
            arrival,
            finish: None,
            turnaround: None,
            cpu_time: 0,
            waiting_time: 0,
            switch_time: 0,
            context_switches: 0,
            last: None,
        }
    }

    /// Average waiting time between two stays on a core.
    pub fn mean_response_time(&self) -> f64 {
        self.waiting_time as f64 / (self.context_switches + 1) as f64
    }

    fn record(&mut self, tick: usize, observation: Observation) {
        match observation {
            Observation::Ready | Observation::Waiting => {
                self.waiting_time += 1;
                if let Some(Observation::Running { .. }) = self.last {
                    self.context_switches += 1;
                }
            }
            Observation::Running {
                switching: true, ..
            } => self.switch_time += 1,
            Observation::Running { .. } => self.cpu_time += 1,
            Observation::Terminated => {
                if self.finish.is_none() {
                    self.finish = Some(tick);
                    self.turnaround = Some(tick.saturating_sub(self.arrival));
                }
            }
        }
        self.last = Some(observation);
    }
}

/// Statistics for a whole run.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    processes: BTreeMap<Pid, ProcessStats>,
    cores: usize,
    ticks: usize,
    disk_busy: usize,
}

#[derive(Serialize)]
struct ProcessRow<'a> {
    #[serde(flatten)]
    stats: &'a ProcessStats,
    mean_response_time: f64,
}

#[derive(Serialize)]
struct Export<'a> {
    processes: Vec<ProcessRow<'a>>,
    summary: Summary,
}

/// Aggregated figures over all processes.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub processes: usize,
    pub finished: usize,
    pub ticks: usize,
    pub makespan: Option<usize>,
    pub total_waiting_time: usize,
    pub average_waiting_time: f64,
    pub average_turnaround: f64,
    pub average_response_time: f64,
    pub context_switches: usize,
    pub cpu_utilisation: f64,
    pub disk_utilisation: f64,
}

impl Stats {
    pub fn new(processes: &ProcessTable, cores: usize) -> Stats {
        let processes = processes
            .iter()
            .map(|process| {
                (
                    process.pid(),
                    ProcessStats::new(process.pid(), process.priority(), process.arrival()),
                )
            })
            .collect();

        Stats {
            processes,
            cores,
            ticks: 0,
            disk_busy: 0,
        }
    }

    pub fn get(&self, pid: Pid) -> Option<&ProcessStats> {
        self.processes.get(&pid)
    }

    /// Statistics ordered by PID.
    pub fn processes(&self) -> impl Iterator<Item = &ProcessStats> {
        self.processes.values()
    }

    pub fn summary(&self) -> Summary {
        let count = self.processes.len();
        let average = |total: f64| if count == 0 { 0.0 } else { total / count as f64 };
        let finished: Vec<&ProcessStats> = self
            .processes()
            .filter(|stats| stats.finish.is_some())
            .collect();

        let total_waiting_time: usize = self.processes().map(|stats| stats.waiting_time).sum();
        let cpu_time: usize = self.processes().map(|stats| stats.cpu_time).sum();
        let turnaround: usize = finished.iter().filter_map(|stats| stats.turnaround).sum();
        let ratio = |part: usize, whole: usize| {
            if whole == 0 {
                0.0
            } else {
                part as f64 / whole as f64
            }
        };

        Summary {
            processes: count,
            finished: finished.len(),
            ticks: self.ticks,
            makespan: finished.iter().filter_map(|stats| stats.finish).max(),
            total_waiting_time,
            average_waiting_time: average(total_waiting_time as f64),
            average_turnaround: ratio(turnaround, finished.len()),
            average_response_time: average(
                self.processes()
                    .map(ProcessStats::mean_response_time)
                    .sum(),
            ),
            context_switches: self.processes().map(|stats| stats.context_switches).sum(),
            cpu_utilisation: ratio(cpu_time, self.cores * self.ticks),
            disk_utilisation: ratio(self.disk_busy, self.ticks),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Export {
            processes: self
                .processes()
                .map(|stats| ProcessRow {
                    stats,
                    mean_response_time: stats.mean_response_time(),
                })
                .collect(),
            summary: self.summary(),
        })
    }

    pub fn to_csv(&self) -> String {
        let mut csv = String::from(
            "pid,priority,arrival,finish,turnaround,cpu_time,waiting_time,switch_time,context_switches,mean_response_time\n",
        );
        for stats in self.processes() {
            let optional = |value: Option<usize>| value.map(|v| v.to_string()).unwrap_or_default();
            let _ = writeln!(
                csv,
                "{},{},{},{},{},{},{},{},{},{:.2}",
                stats.pid,
                stats.priority,
                stats.arrival,
                optional(stats.finish),
                optional(stats.turnaround),
                stats.cpu_time,
                stats.waiting_time,
                stats.switch_time,
                stats.context_switches,
                stats.mean_response_time()
            );
        }
        csv
    }
}

impl Observer for Stats {
    fn observe(&mut self, tick: usize, pid: Pid, observation: Observation) {
        self.ticks = self.ticks.max(tick + 1);
        if let Some(stats) = self.processes.get_mut(&pid) {
            stats.record(tick, observation);
        }
    }

    fn observe_disk(&mut self, tick: usize, disk: Option<Pid>) {
        self.ticks = self.ticks.max(tick + 1);
        if disk.is_some() {
            self.disk_busy += 1;
        }
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dash = |value: Option<usize>| value.map_or("-".to_string(), |v| v.to_string());

        writeln!(f, "PID\tPRI\tARRIVAL\tFINISH\tTURN\tCPU\tWAIT\tSWITCH\tCTX\tRESPONSE")?;
        for stats in self.processes() {
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}",
                stats.pid,
                stats.priority,
                stats.arrival,
                dash(stats.finish),
                dash(stats.turnaround),
                stats.cpu_time,
                stats.waiting_time,
                stats.switch_time,
                stats.context_switches,
                stats.mean_response_time()
            )?;
        }

        let summary = self.summary();
        writeln!(f)?;
        writeln!(
            f,
            "{} of {} processes finished in {} ticks",
            summary.finished, summary.processes, summary.ticks
        )?;
        writeln!(
            f,
            "average waiting {:.2}, turnaround {:.2}, response {:.2}",
            summary.average_waiting_time, summary.average_turnaround, summary.average_response_time
        )?;
        writeln!(
            f,
            "cpu utilisation {:.1}%, disk utilisation {:.1}%",
            summary.cpu_utilisation * 100.0,
            summary.disk_utilisation * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scheduler::Process;

    fn stats() -> Stats {
        let table = ProcessTable::new(vec![Process::cpu_bound(Pid::new(1), 1, 3, 4)]).unwrap();
        Stats::new(&table, 1)
    }

    #[test]
    fn accumulates_times_per_observation() {
        let mut stats = stats();
        let pid = Pid::new(1);
        let running = |switching| Observation::Running { core: 0, switching };

        stats.observe(1, pid, Observation::Ready);
        stats.observe(2, pid, running(true));
        stats.observe(3, pid, running(false));
        stats.observe(4, pid, Observation::Ready);
        stats.observe(5, pid, running(false));
        stats.observe(6, pid, Observation::Waiting);
        stats.observe(7, pid, running(false));
        stats.observe(8, pid, Observation::Terminated);
        stats.observe(9, pid, Observation::Terminated);

        let process = stats.get(pid).unwrap();
        assert_eq!(process.waiting_time, 3);
        assert_eq!(process.switch_time, 1);
        assert_eq!(process.cpu_time, 3);
        assert_eq!(process.context_switches, 2);
        assert_eq!(process.finish, Some(8));
        assert_eq!(process.turnaround, Some(7));
        assert_eq!(process.mean_response_time(), 1.0);
    }

    #[test]
    fn summary_covers_unfinished_runs() {
        let mut stats = stats();
        stats.observe(1, Pid::new(1), Observation::Ready);
        stats.observe_disk(1, None);

        let summary = stats.summary();
        assert_eq!(summary.finished, 0);
        assert_eq!(summary.makespan, None);
        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.cpu_utilisation, 0.0);
    }

    #[test]
    fn exports_json_and_csv() {
        let mut stats = stats();
        stats.observe(1, Pid::new(1), Observation::Ready);
        stats.observe(2, Pid::new(1), Observation::Ready);
        stats.observe(3, Pid::new(1), Observation::Terminated);

        let json: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
        let process = &json["processes"][0];
        assert_eq!(process["pid"], 1);
        assert_eq!(process["finish"], 3);
        assert_eq!(process["waiting_time"], 2);
        assert_eq!(process["mean_response_time"], 2.0);
        assert!(process.get("last").is_none());
        assert_eq!(json["summary"]["finished"], 1);

        let csv = stats.to_csv();
        assert_eq!(csv.lines().nth(1), Some("1,4,1,3,2,0,2,0,0,2.00"));
    }
}
