use std::num::NonZeroUsize;

use pretty_assertions::assert_eq;
use processor::{simulate, Report, SimulationConfig};
use scheduler::{Algorithm, Event, IoReadmit, Pid, ProcessState};

fn round_robin(timeslice: usize) -> Algorithm {
    Algorithm::RoundRobin {
        timeslice: NonZeroUsize::new(timeslice).unwrap(),
    }
}

fn run(config: SimulationConfig, input: &str) -> Report {
    let report = simulate(config, input).unwrap();
    assert!(report.completed, "budget exhausted");
    report
}

fn dispatch_order(report: &Report) -> Vec<Pid> {
    report
        .logs
        .iter()
        .flat_map(|log| &log.events)
        .filter_map(|event| match event {
            Event::Dispatched { pid, .. } => Some(*pid),
            _ => None,
        })
        .collect()
}

#[test]
fn fcfs_pays_one_switch_in_on_a_cold_core() {
    let report = run(
        SimulationConfig::new(Algorithm::Fcfs),
        "1, 0, 4, 0, [(0, CPU)]\n\
         2, 0, 4, 0, [(0, CPU)]",
    );

    assert_eq!(
        report.graph.render(),
        "tick  0123456789\n\
         1     ~0000.....\n\
         2     RRRRR0000.\n\
         disk  ..........\n"
    );
    assert_eq!(report.last_tick, 9);

    let first = report.stats.get(Pid::new(1)).unwrap();
    assert_eq!(first.waiting_time, 0);
    assert_eq!(first.cpu_time, 4);
    assert_eq!(first.switch_time, 1);
    assert_eq!(first.finish, Some(5));

    let second = report.stats.get(Pid::new(2)).unwrap();
    assert_eq!(second.waiting_time, 5);
    assert_eq!(second.switch_time, 0);
    assert_eq!(second.finish, Some(9));
    assert_eq!(second.turnaround, Some(9));

    let last = report.logs.last().unwrap();
    assert!(last
        .processes
        .values()
        .all(|info| info.state == ProcessState::Terminated));
}

#[test]
fn round_robin_preempts_each_process_once() {
    let report = run(
        SimulationConfig::new(round_robin(2)),
        "1, 0, 4, 0, [(0, CPU)]\n\
         2, 0, 4, 0, [(0, CPU)]\n\
         3, 0, 4, 0, [(0, CPU)]",
    );

    assert_eq!(
        report.graph.render(),
        "tick  01234567890123456789012\n\
         1     ~00RRRRRRRRRRRR~00.....\n\
         2     RRRRR~00RRRRRRRRRR00...\n\
         3     RRRRRRRRRR~00RRRRRRR00.\n\
         disk  .......................\n"
    );

    let preemptions: Vec<Pid> = report
        .logs
        .iter()
        .flat_map(|log| &log.events)
        .filter_map(|event| match event {
            Event::Preempted { pid, .. } => Some(*pid),
            _ => None,
        })
        .collect();
    assert_eq!(preemptions, vec![Pid::new(1), Pid::new(2), Pid::new(3)]);

    for stats in report.stats.processes() {
        assert_eq!(stats.context_switches, 1);
        assert!(stats.finish.unwrap() >= 8);
    }
    assert_eq!(report.stats.get(Pid::new(1)).unwrap().finish, Some(18));
    assert_eq!(report.stats.get(Pid::new(3)).unwrap().waiting_time, 17);
}

#[test]
fn round_robin_keeps_a_lone_process_running() {
    let report = run(SimulationConfig::new(round_robin(1)), "1, 0, 3, 0, [(0, CPU)]");

    assert_eq!(report.stats.get(Pid::new(1)).unwrap().context_switches, 0);
    assert_eq!(report.last_tick, 4);
}

#[test]
fn srb_picks_the_shortest_burst_first() {
    let report = run(
        SimulationConfig::new(Algorithm::ShortestRemainingBurst),
        "1, 0, 5, 0, [(0, CPU)]\n\
         2, 0, 2, 0, [(0, CPU)]\n\
         3, 0, 8, 0, [(0, CPU)]",
    );

    assert_eq!(
        dispatch_order(&report),
        vec![Pid::new(2), Pid::new(1), Pid::new(3)]
    );
}

#[test]
fn priority_breaks_ties_in_arrival_order() {
    let report = run(
        SimulationConfig::new(Algorithm::Priority),
        "1, 0, 2, 2, [(0, CPU)]\n\
         2, 0, 2, 1, [(0, CPU)]\n\
         3, 0, 2, 1, [(0, CPU)]",
    );

    assert_eq!(
        dispatch_order(&report),
        vec![Pid::new(2), Pid::new(3), Pid::new(1)]
    );
}

#[test]
fn io_completion_is_readmitted_on_the_next_tick() {
    let report = run(
        SimulationConfig::new(Algorithm::Fcfs),
        "1, 0, 6, 0, [(0, CPU), (2, IO), (4, CPU)]",
    );

    assert_eq!(
        report.graph.render(),
        "tick  0123456789\n\
         1     ~00WWW~00.\n\
         disk  ...DD.....\n"
    );

    let stats = report.stats.get(Pid::new(1)).unwrap();
    assert_eq!(stats.context_switches, 1);
    assert_eq!(stats.waiting_time, 3);
    assert_eq!(stats.cpu_time, 4);
    assert_eq!(stats.switch_time, 2);
    assert_eq!(stats.finish, Some(9));
}

#[test]
fn same_tick_readmission_saves_a_tick() {
    let report = run(
        SimulationConfig::new(Algorithm::Fcfs).with_io_readmit(IoReadmit::SameTick),
        "1, 0, 6, 0, [(0, CPU), (2, IO), (4, CPU)]",
    );

    assert_eq!(
        report.graph.render(),
        "tick  012345678\n\
         1     ~00WW~00.\n\
         disk  ...DD....\n"
    );
    assert_eq!(report.stats.get(Pid::new(1)).unwrap().waiting_time, 2);
}

#[test]
fn disk_serves_requests_in_fifo_order() {
    let report = run(
        SimulationConfig::new(Algorithm::Fcfs).with_cores(NonZeroUsize::new(2).unwrap()),
        "1, 0, 4, 0, [(0, CPU), (1, IO), (3, CPU)]\n\
         2, 0, 4, 0, [(0, CPU), (1, IO), (3, CPU)]",
    );

    assert_eq!(
        report.graph.render(),
        "tick  012345678\n\
         1     ~0WWW~0..\n\
         2     ~1WWWWW0.\n\
         disk  ..DDDD...\n"
    );

    let second = report.stats.get(Pid::new(2)).unwrap();
    assert_eq!(second.waiting_time, 5);
    assert_eq!(second.switch_time, 1);
    assert_eq!(second.finish, Some(8));
}

#[test]
fn late_arrivals_are_not_observed_early() {
    let report = run(
        SimulationConfig::new(Algorithm::Fcfs),
        "1, 3, 1, 0, [(0, CPU)]",
    );

    assert!(report.logs[..3].iter().all(|log| log.processes.is_empty()));
    assert_eq!(
        report.logs[3].events,
        vec![
            Event::Arrived(Pid::new(1)),
            Event::Dispatched {
                pid: Pid::new(1),
                core: 0,
                switching: true
            }
        ]
    );
    let stats = report.stats.get(Pid::new(1)).unwrap();
    assert_eq!(stats.waiting_time, 0);
    assert_eq!(stats.finish, Some(5));
    assert_eq!(stats.turnaround, Some(2));
}
