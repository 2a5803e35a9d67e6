//! Workload files
//!
//! One process per line:
//!
//! ```text
//! # pid, arrival, duration, priority, bursts
//! 1, 0, 6, 2, [(0, CPU), (2, IO), (4, CPU)]
//! ```
//!
//! Burst offsets are in elapsed ticks of the process. Blank lines and lines
//! starting with `#` are skipped.

use std::collections::HashSet;
use std::error::Error;
use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, trace};
use regex::Regex;
use scheduler::{Burst, BurstKind, Pid, Process};

/// Longest accepted line, in bytes.
pub const MAX_LINE_LENGTH: usize = 500;

const BURST_PATTERN: &str = r"\(\s*(\d+)\s*,\s*([A-Za-z]+)\s*\)";

fn burst_regex() -> &'static Regex {
    static BURST: OnceLock<Regex> = OnceLock::new();
    BURST.get_or_init(|| Regex::new(BURST_PATTERN).expect("burst pattern is valid"))
}

/// What is wrong with a workload line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkloadErrorKind {
    LineTooLong(usize),
    MissingField(&'static str),
    ExtraField(String),
    InvalidNumber { field: &'static str, value: String },
    ZeroPid,
    DuplicatePid(Pid),
    MissingBursts,
    MalformedBursts(String),
    UnknownBurstKind(String),
    FirstBurstOffset(usize),
    UnorderedBursts { previous: usize, offset: usize },
    OffsetPastDuration { offset: usize, duration: usize },
}

impl Display for WorkloadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadErrorKind::LineTooLong(length) => {
                write!(f, "line has {length} characters, at most {MAX_LINE_LENGTH} allowed")
            }
            WorkloadErrorKind::MissingField(field) => write!(f, "missing {field}"),
            WorkloadErrorKind::ExtraField(field) => {
                write!(f, "unexpected field `{field}` before the burst list")
            }
            WorkloadErrorKind::InvalidNumber { field, value } => {
                write!(f, "invalid {field} `{value}`")
            }
            WorkloadErrorKind::ZeroPid => write!(f, "PIDs start from 1"),
            WorkloadErrorKind::DuplicatePid(pid) => write!(f, "pid {pid} already defined"),
            WorkloadErrorKind::MissingBursts => write!(f, "missing burst list"),
            WorkloadErrorKind::MalformedBursts(rest) => {
                write!(f, "unexpected `{rest}` in burst list")
            }
            WorkloadErrorKind::UnknownBurstKind(kind) => write!(f, "unknown burst kind `{kind}`"),
            WorkloadErrorKind::FirstBurstOffset(offset) => {
                write!(f, "first burst starts at {offset}, expected 0")
            }
            WorkloadErrorKind::UnorderedBursts { previous, offset } => {
                write!(f, "burst at {offset} does not come after {previous}")
            }
            WorkloadErrorKind::OffsetPastDuration { offset, duration } => {
                write!(f, "burst at {offset} starts past duration {duration}")
            }
        }
    }
}

/// A workload that cannot be loaded.
#[derive(Debug)]
pub enum WorkloadError {
    Io { path: PathBuf, source: io::Error },
    /// `line` is 1-based.
    Line { line: usize, kind: WorkloadErrorKind },
}

impl WorkloadError {
    fn at(line: usize, kind: WorkloadErrorKind) -> WorkloadError {
        WorkloadError::Line { line, kind }
    }
}

impl Display for WorkloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadError::Io { path, source } => {
                write!(f, "could not read {}: {source}", path.display())
            }
            WorkloadError::Line { line, kind } => write!(f, "line {line}: {kind}"),
        }
    }
}

impl Error for WorkloadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkloadError::Io { source, .. } => Some(source),
            WorkloadError::Line { .. } => None,
        }
    }
}

/// The processes of a simulation, sorted by arrival.
#[derive(Clone, Debug, Default)]
pub struct Workload {
    processes: Vec<Process>,
}

impl Workload {
    /// Builds a workload from already constructed processes.
    pub fn new(mut processes: Vec<Process>) -> Workload {
        processes.sort_by_key(Process::arrival);
        Workload { processes }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Workload, WorkloadError> {
        let path = path.as_ref();
        let input = fs::read_to_string(path).map_err(|source| WorkloadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("parsing workload {}", path.display());
        Workload::parse(&input)
    }

    pub fn parse(input: &str) -> Result<Workload, WorkloadError> {
        let mut processes = Vec::new();
        let mut seen = HashSet::new();

        for (index, line) in input.lines().enumerate() {
            let number = index + 1;
            if line.len() > MAX_LINE_LENGTH {
                return Err(WorkloadError::at(number, WorkloadErrorKind::LineTooLong(line.len())));
            }

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let process = parse_line(line).map_err(|kind| WorkloadError::at(number, kind))?;
            if !seen.insert(process.pid()) {
                return Err(WorkloadError::at(
                    number,
                    WorkloadErrorKind::DuplicatePid(process.pid()),
                ));
            }
            trace!("line {number}: pid {} with {} bursts", process.pid(), process.bursts().len());
            processes.push(process);
        }

        Ok(Workload::new(processes))
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn into_processes(self) -> Vec<Process> {
        self.processes
    }
}

fn parse_line(line: &str) -> Result<Process, WorkloadErrorKind> {
    let (head, bursts) = match line.find('[') {
        Some(open) => (&line[..open], &line[open..]),
        None => (line, ""),
    };

    let head = head.trim_end();
    let head = head.strip_suffix(',').unwrap_or(head);

    let mut fields = head.split(',').map(str::trim);
    let pid = number(fields.next(), "pid")?;
    let arrival = number(fields.next(), "arrival time")?;
    let duration = number(fields.next(), "duration")?;
    let priority = number(fields.next(), "priority")?;
    if let Some(extra) = fields.next() {
        return Err(WorkloadErrorKind::ExtraField(extra.to_string()));
    }

    let pid = Pid::try_new(pid).ok_or(WorkloadErrorKind::ZeroPid)?;
    let bursts = parse_bursts(bursts, duration)?;

    Ok(Process::new(pid, arrival, duration, priority, bursts))
}

fn number<T: std::str::FromStr>(field: Option<&str>, name: &'static str) -> Result<T, WorkloadErrorKind> {
    let value = field
        .filter(|value| !value.is_empty())
        .ok_or(WorkloadErrorKind::MissingField(name))?;
    value.parse().map_err(|_| WorkloadErrorKind::InvalidNumber {
        field: name,
        value: value.to_string(),
    })
}

fn parse_bursts(list: &str, duration: usize) -> Result<Vec<Burst>, WorkloadErrorKind> {
    let list = list.trim();
    let inner = list
        .strip_prefix('[')
        .ok_or(WorkloadErrorKind::MissingBursts)?;
    let (inner, trailing) = inner
        .rsplit_once(']')
        .ok_or_else(|| WorkloadErrorKind::MalformedBursts(list.to_string()))?;
    if !trailing.trim().is_empty() {
        return Err(WorkloadErrorKind::MalformedBursts(trailing.trim().to_string()));
    }

    let leftover = burst_regex().replace_all(inner, "");
    if let Some(rest) = leftover
        .split(',')
        .map(str::trim)
        .find(|rest| !rest.is_empty())
    {
        return Err(WorkloadErrorKind::MalformedBursts(rest.to_string()));
    }

    let mut bursts: Vec<Burst> = Vec::new();
    for captures in burst_regex().captures_iter(inner) {
        let offset: usize = number(Some(&captures[1]), "burst offset")?;
        let kind = match captures[2].to_ascii_uppercase().as_str() {
            "CPU" => BurstKind::Cpu,
            "IO" => BurstKind::Io,
            other => return Err(WorkloadErrorKind::UnknownBurstKind(other.to_string())),
        };

        match bursts.last() {
            None if offset != 0 => return Err(WorkloadErrorKind::FirstBurstOffset(offset)),
            Some(previous) if offset <= previous.start => {
                return Err(WorkloadErrorKind::UnorderedBursts {
                    previous: previous.start,
                    offset,
                })
            }
            _ => {}
        }
        if offset >= duration && offset > 0 {
            return Err(WorkloadErrorKind::OffsetPastDuration { offset, duration });
        }

        bursts.push(Burst { kind, start: offset });
    }

    if bursts.is_empty() {
        return Err(WorkloadErrorKind::MissingBursts);
    }
    Ok(bursts)
}
