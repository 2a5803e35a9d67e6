use log::{debug, info, trace, warn};

use scheduler::{Location, Machine, Pid, Policy};

use crate::config::SimulationConfig;
use crate::error::Error;
use crate::graph::Graph;
use crate::logs::Log;
use crate::stats::{Observation, Observer, Stats};
use crate::workload::Workload;

/// The outcome of a simulation.
#[derive(Clone, Debug)]
pub struct Report {
    pub config: SimulationConfig,

    /// One log per simulated tick.
    pub logs: Vec<Log>,

    pub stats: Stats,
    pub graph: Graph,

    /// The last simulated tick.
    pub last_tick: usize,

    /// `false` if the tick budget ran out before every process terminated.
    pub completed: bool,
}

/// The processor simulator.
///
/// Every tick runs the same phases, in order: burst events, termination
/// and slice expiry, interrupt re-admission, dispatch, observation and
/// finally the advance of executing processes and core delays.
pub struct Processor {
    config: SimulationConfig,
    machine: Machine,
    policy: Box<dyn Policy>,
    order: Vec<Pid>,
    stats: Stats,
    graph: Graph,
    logs: Vec<Log>,
    tick: usize,
    done: bool,
    completed: bool,
}

impl Processor {
    /// Prepares a simulation.
    ///
    /// * `config` - policy, core count, delays and tick budget
    /// * `workload` - the processes to run
    ///
    /// ## Example
    ///
    /// ```rust
    /// use processor::{Processor, SimulationConfig, Workload};
    /// use scheduler::Algorithm;
    ///
    /// let workload = Workload::parse(
    ///     "1, 0, 4, 1, [(0, CPU)]\n\
    ///      2, 0, 6, 0, [(0, CPU), (2, IO), (4, CPU)]",
    /// )
    /// .unwrap();
    /// let report = Processor::new(SimulationConfig::new(Algorithm::Priority), workload)
    ///     .unwrap()
    ///     .run();
    ///
    /// assert!(report.completed);
    /// println!("{}", report.stats);
    /// ```
    pub fn new(config: SimulationConfig, workload: Workload) -> Result<Processor, Error> {
        let machine = Machine::new(workload.into_processes(), config.cores, config.delays)?;
        let order = machine.processes().pids();
        let stats = Stats::new(machine.processes(), config.cores.get());

        Ok(Processor {
            policy: config.algorithm.policy(),
            config,
            machine,
            order,
            stats,
            graph: Graph::new(),
            logs: Vec::new(),
            tick: 0,
            done: false,
            completed: false,
        })
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// The tick that [`Processor::step`] simulates next.
    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Simulates a single tick and returns its log, or `None` once every
    /// process terminated or the budget ran out.
    pub fn step(&mut self) -> Option<&Log> {
        if self.done {
            return None;
        }
        let tick = self.tick;
        if tick == 0 {
            info!(
                "simulating {} processes with {} on {} cores",
                self.order.len(),
                self.config.algorithm,
                self.config.cores
            );
        }

        let mut events = Vec::new();
        for &pid in &self.order {
            events.extend(self.machine.process_event(pid, tick));
        }
        events.extend(self.machine.retire_finished());
        events.extend(self.machine.expire_slices(self.policy.timeslice()));
        events.extend(self.machine.resolve_interrupts(tick, self.config.io_readmit));
        events.extend(self.machine.dispatch(self.policy.as_mut()));

        for event in &events {
            debug!("tick {tick}: {event}");
        }
        debug_assert_eq!(self.machine.check_invariants(), Ok(()));

        self.observe(tick);
        self.logs.push(Log::capture(tick, events, &self.machine));

        if self.machine.all_terminated() {
            info!("all processes terminated at tick {tick}");
            self.done = true;
            self.completed = true;
        } else if tick >= self.config.budget() {
            warn!("tick budget of {} exhausted", self.config.budget());
            self.done = true;
        } else {
            self.machine.advance();
            self.tick += 1;
        }

        self.logs.last()
    }

    /// Runs the simulation to the end.
    pub fn run(mut self) -> Report {
        while self.step().is_some() {}

        Report {
            config: self.config,
            logs: self.logs,
            stats: self.stats,
            graph: self.graph,
            last_tick: self.tick,
            completed: self.completed,
        }
    }

    fn observe(&mut self, tick: usize) {
        for process in self.machine.processes().iter() {
            if !process.has_arrived(tick) {
                continue;
            }
            let observation = match process.location() {
                Location::Outside | Location::Ready => Observation::Ready,
                Location::Core(core) => Observation::Running {
                    core,
                    switching: self.machine.cores()[core].is_switching(),
                },
                Location::Wait | Location::Disk | Location::Interrupted => Observation::Waiting,
                Location::Done => Observation::Terminated,
            };
            trace!("tick {tick}: {} {:?}", process.pid(), observation);

            self.stats.observe(tick, process.pid(), observation);
            self.graph.observe(tick, process.pid(), observation);
        }

        let disk = self.machine.disk().process();
        self.stats.observe_disk(tick, disk);
        self.graph.observe_disk(tick, disk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scheduler::{Algorithm, Process, ProcessState};

    fn cpu_bound(durations: &[usize]) -> Workload {
        Workload::new(
            durations
                .iter()
                .enumerate()
                .map(|(index, &duration)| Process::cpu_bound(Pid::new(index + 1), 0, duration, 0))
                .collect(),
        )
    }

    #[test]
    fn empty_workload_completes_immediately() {
        let report = Processor::new(SimulationConfig::default(), Workload::default())
            .unwrap()
            .run();

        assert!(report.completed);
        assert_eq!(report.last_tick, 0);
        assert_eq!(report.logs.len(), 1);
    }

    #[test]
    fn step_stops_after_the_last_tick() {
        let mut processor = Processor::new(SimulationConfig::default(), cpu_bound(&[1])).unwrap();
        assert_eq!(processor.tick(), 0);

        let mut ticks = Vec::new();
        while let Some(log) = processor.step() {
            ticks.push(log.tick);
        }

        assert_eq!(ticks, vec![0, 1, 2]);
        assert!(processor.is_done());
        assert_eq!(processor.tick(), 2);
        assert_eq!(
            processor.machine().process(Pid::new(1)).map(|p| p.state()),
            Some(ProcessState::Terminated)
        );
    }

    #[test]
    fn budget_cuts_the_run() {
        let config = SimulationConfig::new(Algorithm::Fcfs).with_tick_budget(3);
        let report = Processor::new(config, cpu_bound(&[10])).unwrap().run();

        assert!(!report.completed);
        assert_eq!(report.last_tick, 3);
        assert_eq!(report.logs.len(), 4);
        assert_eq!(report.stats.get(Pid::new(1)).unwrap().finish, None);
    }

    #[test]
    fn duplicate_pids_are_rejected() {
        let workload = Workload::new(vec![
            Process::cpu_bound(Pid::new(1), 0, 1, 0),
            Process::cpu_bound(Pid::new(1), 1, 1, 0),
        ]);

        assert!(matches!(
            Processor::new(SimulationConfig::default(), workload),
            Err(Error::Invariant(_))
        ));
    }
}
