use core::module_path;
use std::num::NonZeroUsize;

use function_name::named;
use processor::simulate;
use scheduler::Pid;

use super::{check, run, scheduler};

const WORKLOAD: &str = "1, 0, 5, 1, [(0, CPU)]\n\
                        2, 0, 5, 1, [(0, CPU), (2, IO), (3, CPU)]\n\
                        3, 1, 4, 0, [(0, CPU)]\n\
                        4, 2, 3, 2, [(0, CPU), (1, IO), (2, CPU)]";

#[test]
#[named]
pub fn more_cores_than_processes() {
    let config = scheduler().with_cores(NonZeroUsize::new(8).unwrap());
    let report = simulate(config, WORKLOAD).unwrap();

    assert!(report.completed);
    for log in &report.logs {
        assert!(log.ready.is_empty(), "tick {}: ready queue not empty", log.tick);
    }

    run(
        module_path!().split("::").last().unwrap(),
        function_name!(),
        &report,
    );
}

#[test]
#[named]
pub fn two_cores() {
    let config = scheduler().with_cores(NonZeroUsize::new(2).unwrap());
    let report = simulate(config, WORKLOAD).unwrap();

    assert!(report.completed);
    let mut first: Vec<Pid> = report.logs[0].cores.iter().flatten().copied().collect();
    first.sort();
    assert_eq!(first, vec![Pid::new(1), Pid::new(2)]);

    run(
        module_path!().split("::").last().unwrap(),
        function_name!(),
        &report,
    );
}

#[test]
pub fn cpu_time_does_not_depend_on_cores() {
    for cores in 1..=4 {
        let config = scheduler().with_cores(NonZeroUsize::new(cores).unwrap());
        let report = simulate(config, WORKLOAD).unwrap();
        check(&report);

        let cpu_time: Vec<usize> = report.stats.processes().map(|stats| stats.cpu_time).collect();
        assert_eq!(cpu_time, vec![5, 4, 4, 2], "{cores} cores");
    }
}
