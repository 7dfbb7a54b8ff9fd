use crate::collectors::probe::{ProbeMode, Prober};
use crate::state::{DeviceRecord, ProbeResult};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

pub struct Sweeper {
    prober: Arc<dyn Prober>,
    prefix: String,
    host_range: Range<u16>,
    friendly_names: Arc<HashMap<String, String>>,
    max_concurrency: usize,
}

impl Sweeper {
    pub fn new(
        prober: Arc<dyn Prober>,
        prefix: impl Into<String>,
        host_range: Range<u16>,
        friendly_names: Arc<HashMap<String, String>>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            prober,
            prefix: prefix.into(),
            host_range,
            friendly_names,
            max_concurrency,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn host_range(&self) -> Range<u16> {
        self.host_range.clone()
    }

    pub fn host_count(&self) -> usize {
        self.host_range.len()
    }

    /// Reachable devices, ordered by ascending host suffix regardless of
    /// which probe finished first.
    pub async fn sweep(&self) -> Vec<DeviceRecord> {
        let permits = self.host_count().min(self.max_concurrency).max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut tasks = JoinSet::new();

        for suffix in self.host_range.clone() {
            let address = format!("{}{}", self.prefix, suffix);
            let prober = Arc::clone(&self.prober);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (suffix, address, ProbeResult::UNREACHABLE);
                };
                let result = prober.probe(&address, ProbeMode::Latency).await;
                (suffix, address, result)
            });
        }

        let mut reachable = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((suffix, address, result)) if result.reachable => {
                    debug!(address = %address, latency_ms = ?result.latency_ms, "host reachable");
                    reachable.push((suffix, address, result.latency_ms));
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "probe task failed"),
            }
        }
        reachable.sort_by_key(|(suffix, _, _)| *suffix);

        reachable
            .into_iter()
            .map(|(_, address, latency_ms)| DeviceRecord {
                name: resolve_name(&address, &self.friendly_names),
                ip_address: address,
                reachable: true,
                latency_milliseconds: latency_ms,
            })
            .collect()
    }
}

pub fn resolve_name(address: &str, friendly_names: &HashMap<String, String>) -> String {
    friendly_names
        .get(address)
        .cloned()
        .unwrap_or_else(|| format!("Device {address}"))
}
