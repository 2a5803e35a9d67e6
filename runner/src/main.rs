use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use log::info;
use regex::Regex;

use processor::{format_logs, Processor, SimulationConfig, Workload};
use scheduler::{Delays, IoReadmit};

fn cli() -> Command {
    Command::new("runner")
        .version(crate_version!())
        .about("Discrete-time CPU scheduling simulator")
        .arg(
            Arg::new("workload")
                .short('w')
                .long("workload")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Workload file, one `pid, arrival, duration, priority, [bursts]` per line"),
        )
        .arg(
            Arg::new("policy")
                .short('p')
                .long("policy")
                .default_value("F")
                .value_parser(valid_policy)
                .help("Scheduling policy (F, P, S or R<timeslice>)"),
        )
        .arg(
            Arg::new("cores")
                .short('c')
                .long("cores")
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Number of CPU cores"),
        )
        .arg(
            Arg::new("ticks")
                .short('t')
                .long("ticks")
                .value_parser(value_parser!(usize))
                .help("Last tick to simulate [default: 1000]"),
        )
        .arg(
            Arg::new("switch-in")
                .long("switch-in")
                .value_parser(value_parser!(usize))
                .help("Ticks needed to load a process on a core [default: 1]"),
        )
        .arg(
            Arg::new("switch-out")
                .long("switch-out")
                .value_parser(value_parser!(usize))
                .help("Ticks needed to evict a process from a core [default: 2]"),
        )
        .arg(
            Arg::new("same-tick-io")
                .long("same-tick-io")
                .action(ArgAction::SetTrue)
                .help("Readmit processes in the tick their I/O completes"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the statistics as JSON"),
        )
        .arg(
            Arg::new("csv")
                .long("csv")
                .action(ArgAction::SetTrue)
                .conflicts_with("json")
                .help("Print the statistics as CSV"),
        )
        .arg(
            Arg::new("graph")
                .long("graph")
                .action(ArgAction::SetTrue)
                .help("Print a Gantt chart of the run"),
        )
        .arg(
            Arg::new("logs")
                .long("logs")
                .action(ArgAction::SetTrue)
                .help("Print the state of the machine at every tick"),
        )
}

fn valid_policy(value: &str) -> Result<String, String> {
    let re = Regex::new(r"^([FPS]|R\d+)$").map_err(|err| err.to_string())?;
    if re.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(format!(
            "invalid scheduling policy: {value}. Must be one of F, P, S or R<timeslice>"
        ))
    }
}

fn config(matches: &ArgMatches) -> Result<SimulationConfig> {
    let policy = matches
        .get_one::<String>("policy")
        .map_or("F", String::as_str);
    let cores = matches.get_one::<usize>("cores").copied().unwrap_or(1);
    let mut config = SimulationConfig::from_args(policy, cores).context("invalid configuration")?;

    if let Some(&ticks) = matches.get_one::<usize>("ticks") {
        config = config.with_tick_budget(ticks);
    }

    let defaults = Delays::default();
    config = config.with_delays(Delays {
        switch_in: matches
            .get_one::<usize>("switch-in")
            .copied()
            .unwrap_or(defaults.switch_in),
        switch_out: matches
            .get_one::<usize>("switch-out")
            .copied()
            .unwrap_or(defaults.switch_out),
    });

    if matches.get_flag("same-tick-io") {
        config = config.with_io_readmit(IoReadmit::SameTick);
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();

    let matches = cli().get_matches();
    let config = config(&matches)?;

    let path = matches
        .get_one::<PathBuf>("workload")
        .context("missing workload file")?;
    let workload = Workload::from_path(path)
        .with_context(|| format!("failed to load workload {}", path.display()))?;
    info!("loaded {} processes from {}", workload.len(), path.display());

    let report = Processor::new(config, workload)
        .context("failed to set up the simulation")?
        .run();

    if matches.get_flag("logs") {
        println!("{}", format_logs(&report.logs));
    }
    if matches.get_flag("graph") {
        println!("{}", report.graph.render());
    }

    if matches.get_flag("json") {
        println!("{}", report.stats.to_json().context("failed to export statistics")?);
    } else if matches.get_flag("csv") {
        print!("{}", report.stats.to_csv());
    } else {
        println!("{} on {} cores", report.config.algorithm, report.config.cores);
        println!("{}", report.stats);
    }

    if !report.completed {
        eprintln!(
            "tick budget exhausted at tick {}, {} of {} processes finished",
            report.last_tick,
            report.stats.summary().finished,
            report.stats.summary().processes
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests;
