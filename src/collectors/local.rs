use crate::collectors::now_unix;
use crate::collectors::probe::{ProbeMode, Prober};
use crate::state::LocalStatus;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{System, SystemExt};
use thiserror::Error;
use tokio::process::Command;
use tokio::time;
use tracing::warn;

const ROOT_PATH: &str = "/";
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {output}")]
    Failed {
        program: String,
        status: String,
        output: String,
    },
    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
    #[error("{0} is not available on this host")]
    Unavailable(&'static str),
}

#[async_trait]
pub trait SystemQueries: Send + Sync {
    async fn hostname(&self) -> Result<String, QueryError>;
    async fn kernel_info(&self) -> Result<String, QueryError>;
    async fn uptime(&self) -> Result<String, QueryError>;
    async fn disk_usage(&self, path: &str) -> Result<String, QueryError>;
}

#[derive(Debug, Clone, Default)]
pub struct HostQueries;

#[async_trait]
impl SystemQueries for HostQueries {
    async fn hostname(&self) -> Result<String, QueryError> {
        System::new()
            .host_name()
            .filter(|name| !name.trim().is_empty())
            .ok_or(QueryError::Unavailable("hostname"))
    }

    async fn kernel_info(&self) -> Result<String, QueryError> {
        run_command("uname", &["-a"], QUERY_TIMEOUT).await
    }

    async fn uptime(&self) -> Result<String, QueryError> {
        run_command("uptime", &[], QUERY_TIMEOUT).await
    }

    async fn disk_usage(&self, path: &str) -> Result<String, QueryError> {
        let output = run_command("df", &["-h", path], QUERY_TIMEOUT).await?;
        Ok(output
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default()
            .to_string())
    }
}

async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, QueryError> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
    let output = match time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(QueryError::Spawn {
                program: program.to_string(),
                source,
            })
        }
        Err(_elapsed) => {
            return Err(QueryError::TimedOut {
                program: program.to_string(),
                timeout,
            })
        }
    };

    if !output.status.success() {
        return Err(QueryError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub struct LocalCollector {
    queries: Arc<dyn SystemQueries>,
    prober: Arc<dyn Prober>,
    internet_test_host: String,
}

impl LocalCollector {
    pub fn new(
        queries: Arc<dyn SystemQueries>,
        prober: Arc<dyn Prober>,
        internet_test_host: impl Into<String>,
    ) -> Self {
        Self {
            queries,
            prober,
            internet_test_host: internet_test_host.into(),
        }
    }

    pub async fn collect(&self) -> LocalStatus {
        let (hostname, kernel_info, uptime, disk, internet) = tokio::join!(
            self.queries.hostname(),
            self.queries.kernel_info(),
            self.queries.uptime(),
            self.queries.disk_usage(ROOT_PATH),
            self.prober
                .probe(&self.internet_test_host, ProbeMode::Reachability),
        );

        LocalStatus {
            hostname: degrade("hostname", hostname),
            kernel_info: degrade("kernel_info", kernel_info),
            uptime: degrade("uptime", uptime),
            disk_root_summary: degrade("disk_usage", disk),
            internet_reachable: internet.reachable,
            captured_at_epoch_seconds: now_unix(),
        }
    }
}

fn degrade(field: &str, result: Result<String, QueryError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(field = %field, error = %err, "local query failed");
            format!("error: {err}")
        }
    }
}
