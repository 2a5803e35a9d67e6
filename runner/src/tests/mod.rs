use scheduler::{Algorithm, Pid, ProcessState};

use std::collections::HashSet;
use std::env;
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use processor::{format_logs, simulate, Report, SimulationConfig};

mod cores;

fn path(folder: &str, name: &str) -> PathBuf {
    let (timeslice, cores) = arguments();
    PathBuf::from(format!(
        "../outputs/{SCHEDULER}/{folder}/{name}___{timeslice}_{cores}.log"
    ))
}

fn write_logs(folder: &str, name: &str, logs: &str) {
    fs::create_dir_all(format!("../outputs/{SCHEDULER}/{folder}")).unwrap();
    fs::write(path(folder, name), logs).unwrap();
}

/// Checks the invariants every report has.
///
/// With `WRITE_OUTPUT` set the logs, the graph and the statistics are also
/// written under `outputs/` for inspection. The assertions of each test are
/// what decides whether it passes.
fn run(folder: &str, name: &str, report: &Report) {
    check(report);

    if env::var("WRITE_OUTPUT").is_ok() {
        let output = format!(
            "{}\n{}\n{}",
            format_logs(&report.logs),
            report.graph.render(),
            report.stats
        );
        write_logs(folder, name, &output);
    }
}

/// Invariants every report has, whatever the policy.
fn check(report: &Report) {
    let mut previous_tick = None;
    for log in &report.logs {
        assert_eq!(previous_tick.map_or(0, |tick: usize| tick + 1), log.tick);
        previous_tick = Some(log.tick);

        let mut held = HashSet::new();
        let occupants = log
            .ready
            .iter()
            .chain(&log.waiting)
            .chain(log.cores.iter().flatten())
            .chain(log.disk.iter());
        for pid in occupants {
            assert!(held.insert(*pid), "tick {}: {pid} held twice", log.tick);
        }

        for (pid, info) in &log.processes {
            assert!(info.elapsed <= info.duration);
            match info.state {
                ProcessState::Running => assert_eq!(log.cores[info.core.unwrap()], Some(*pid)),
                ProcessState::Terminated => assert!(!held.contains(pid)),
                _ => assert!(info.core.is_none()),
            }
        }
    }
    assert_eq!(report.logs.last().map(|log| log.tick), Some(report.last_tick));
}

fn finish(report: &Report, pid: usize) -> usize {
    report.stats.get(Pid::new(pid)).unwrap().finish.unwrap()
}

fn arguments() -> (usize, usize) {
    let timeslice = env::var("TIMESLICE")
        .unwrap_or("3".to_string())
        .parse::<usize>()
        .unwrap();
    let cores = env::var("CORES")
        .unwrap_or("1".to_string())
        .parse::<usize>()
        .unwrap();
    (timeslice, cores)
}

fn config(algorithm: Algorithm) -> SimulationConfig {
    let (_, cores) = arguments();
    SimulationConfig::new(algorithm).with_cores(NonZeroUsize::new(cores).unwrap())
}

fn simulation(input: &str) -> Report {
    simulate(scheduler(), input).unwrap()
}

#[cfg(feature = "round-robin")]
static SCHEDULER: &str = "round-robin";
#[cfg(feature = "round-robin")]
fn scheduler() -> SimulationConfig {
    let (timeslice, cores) = arguments();

    println!("Timeslice {timeslice}\nCores {cores}");
    config(Algorithm::RoundRobin {
        timeslice: NonZeroUsize::new(timeslice).unwrap(),
    })
}

#[cfg(feature = "priority")]
static SCHEDULER: &str = "priority";
#[cfg(feature = "priority")]
fn scheduler() -> SimulationConfig {
    let (_, cores) = arguments();

    println!("Cores {cores}");
    config(Algorithm::Priority)
}

#[cfg(feature = "srb")]
static SCHEDULER: &str = "srb";
#[cfg(feature = "srb")]
fn scheduler() -> SimulationConfig {
    let (_, cores) = arguments();

    println!("Cores {cores}");
    config(Algorithm::ShortestRemainingBurst)
}

#[cfg(not(any(feature = "round-robin", feature = "priority", feature = "srb")))]
static SCHEDULER: &str = "fcfs";
#[cfg(not(any(feature = "round-robin", feature = "priority", feature = "srb")))]
fn scheduler() -> SimulationConfig {
    let (_, cores) = arguments();

    println!("Cores {cores}");
    config(Algorithm::Fcfs)
}
