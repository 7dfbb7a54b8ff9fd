use crate::state::ProbeResult;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time;
use tracing::debug;

const LATENCY_MARKER: &str = "time=";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProbeMode {
    Reachability,
    Latency,
}

/// Sends one echo request to an address. Never fails: anything that goes
/// wrong while probing is reported as unreachable.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, address: &str, mode: ProbeMode) -> ProbeResult;
}

#[derive(Debug, Clone)]
pub struct PingProber {
    program: String,
    deadline: Duration,
}

impl PingProber {
    pub fn new(deadline: Duration) -> Self {
        Self::with_program("ping", deadline)
    }

    pub fn with_program(program: impl Into<String>, deadline: Duration) -> Self {
        Self {
            program: program.into(),
            deadline,
        }
    }

    fn command(&self, address: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(ping_args(self.deadline))
            .arg(address)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, address: &str, mode: ProbeMode) -> ProbeResult {
        // ping enforces its own deadline; the outer timeout only catches a hung process.
        let backstop = self.deadline + Duration::from_secs(1);
        let output = match time::timeout(backstop, self.command(address).output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                debug!(address = %address, program = %self.program, error = %err, "ping failed to run");
                return ProbeResult::UNREACHABLE;
            }
            Err(_elapsed) => {
                debug!(address = %address, "ping exceeded deadline");
                return ProbeResult::UNREACHABLE;
            }
        };

        if !output.status.success() {
            return ProbeResult::UNREACHABLE;
        }

        match mode {
            ProbeMode::Reachability => ProbeResult::reachable(None),
            ProbeMode::Latency => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                ProbeResult::reachable(parse_latency(&stdout))
            }
        }
    }
}

#[cfg(target_os = "windows")]
fn ping_args(deadline: Duration) -> Vec<String> {
    let millis = deadline.as_millis().max(1);
    vec![
        "-n".to_string(),
        "1".to_string(),
        "-w".to_string(),
        millis.to_string(),
    ]
}

#[cfg(target_os = "macos")]
fn ping_args(deadline: Duration) -> Vec<String> {
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-t".to_string(),
        deadline_secs(deadline).to_string(),
    ]
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn ping_args(deadline: Duration) -> Vec<String> {
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-w".to_string(),
        deadline_secs(deadline).to_string(),
    ]
}

#[cfg_attr(target_os = "windows", allow(dead_code))]
fn deadline_secs(deadline: Duration) -> u64 {
    let secs = deadline.as_secs();
    let secs = if deadline.subsec_nanos() > 0 { secs + 1 } else { secs };
    secs.max(1)
}

/// Extracts the round-trip time in milliseconds from ping output.
///
/// Only the first line carrying the `time=` marker is considered. A missing
/// marker or an unparsable value yields `None`.
pub fn parse_latency(output: &str) -> Option<f64> {
    let line = output.lines().find(|line| line.contains(LATENCY_MARKER))?;
    let (_, rest) = line.split_once(LATENCY_MARKER)?;
    let token = rest.split_whitespace().next()?;
    token.trim_end_matches("ms").parse::<f64>().ok()
}
