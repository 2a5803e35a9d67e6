use std::collections::BTreeMap;
use std::fmt::{self, Display};

use scheduler::{Event, Machine, Pid, ProcessState};

/// Snapshot of the machine taken in the observation phase of a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Log {
    pub tick: usize,

    /// What happened earlier in the tick.
    pub events: Vec<Event>,

    /// Every arrived process and its state.
    pub processes: BTreeMap<Pid, ProcessInfo>,

    /// The occupant of every core, by core index.
    pub cores: Vec<Option<Pid>>,

    pub disk: Option<Pid>,
    pub ready: Vec<Pid>,
    pub waiting: Vec<Pid>,
}

impl Log {
    pub(crate) fn capture(tick: usize, events: Vec<Event>, machine: &Machine) -> Log {
        let processes = machine
            .processes()
            .iter()
            .filter(|process| process.has_arrived(tick))
            .map(|process| {
                let core = machine
                    .cores()
                    .iter()
                    .find(|core| core.process() == Some(process.pid()));
                let info = ProcessInfo {
                    pid: process.pid(),
                    state: process.state(),
                    core: core.map(|core| core.id()),
                    switching: core.is_some_and(|core| core.is_switching()),
                    priority: process.priority(),
                    elapsed: process.elapsed(),
                    duration: process.duration(),
                    remaining_burst: process.remaining_burst(),
                };
                (process.pid(), info)
            })
            .collect();

        Log {
            tick,
            events,
            processes,
            cores: machine.cores().iter().map(|core| core.process()).collect(),
            disk: machine.disk().process(),
            ready: machine.scheduler().ready().iter().copied().collect(),
            waiting: machine.scheduler().waiting().iter().copied().collect(),
        }
    }
}

fn pids(pids: &[Pid]) -> String {
    pids.iter().map(Pid::to_string).collect::<Vec<_>>().join(" ")
}

impl Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "{event}")?;
        }
        writeln!(f, "PID\tSTATE\t\tPRI\tELAPSED\tTOTAL\tBURST\tCORE")?;
        for info in self.processes.values() {
            writeln!(f, "{info}")?;
        }
        for (index, core) in self.cores.iter().enumerate() {
            match core {
                Some(pid) => writeln!(f, "core {index}: {pid}")?,
                None => writeln!(f, "core {index}: idle")?,
            }
        }
        match self.disk {
            Some(pid) => writeln!(f, "disk: {pid}")?,
            None => writeln!(f, "disk: idle")?,
        }
        writeln!(f, "ready: [{}]", pids(&self.ready))?;
        writeln!(f, "waiting: [{}]", pids(&self.waiting))
    }
}

/// Information about a process state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub state: ProcessState,

    /// The core holding the process, if any.
    pub core: Option<usize>,

    /// Whether the core is still loading the process.
    pub switching: bool,

    pub priority: i32,
    pub elapsed: usize,
    pub duration: usize,

    /// Ticks left in the current burst.
    pub remaining_burst: usize,
}

impl Display for ProcessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = match (self.core, self.switching) {
            (Some(core), true) => format!("{core} (in)"),
            (Some(core), false) => core.to_string(),
            (None, _) => "-".to_string(),
        };
        write!(
            f,
            "{}\t{:<10}\t{}\t{}\t{}\t{}\t{}",
            self.pid,
            self.state.to_string(),
            self.priority,
            self.elapsed,
            self.duration,
            self.remaining_burst,
            core
        )
    }
}

/// Format the [`crate::Processor`]'s logs to a [`String`].
///
/// * `logs` - the logs of a [`crate::Report`].
///
/// ## Example
///
/// ```rust
/// use processor::{format_logs, Processor, SimulationConfig, Workload};
///
/// let workload = Workload::parse("1, 0, 2, 0, [(0, CPU)]").unwrap();
/// let report = Processor::new(SimulationConfig::default(), workload).unwrap().run();
///
/// println!("{}", format_logs(&report.logs));
/// ```
pub fn format_logs(logs: &[Log]) -> String {
    let mut s = String::new();
    for log in logs {
        s.push_str(&format!("===== Tick: {} =====\n{}\n", log.tick, log));
    }
    s
}
