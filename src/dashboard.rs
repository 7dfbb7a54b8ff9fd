use crate::collectors::local::{HostQueries, LocalCollector};
use crate::collectors::probe::{PingProber, Prober};
use crate::collectors::sweep::Sweeper;
use crate::config::Config;
use crate::remote::RemoteClient;
use crate::state::{DeviceSweep, Overview};
use reqwest::Client;
use std::sync::Arc;
use std::time::SystemTime;

pub struct Dashboard {
    local: LocalCollector,
    remote: RemoteClient,
    sweeper: Sweeper,
}

impl Dashboard {
    pub fn new(local: LocalCollector, remote: RemoteClient, sweeper: Sweeper) -> Self {
        Self {
            local,
            remote,
            sweeper,
        }
    }

    pub fn from_config(cfg: &Config, client: Client) -> Self {
        let prober: Arc<dyn Prober> = Arc::new(PingProber::new(cfg.probe.timeout()));
        let local = LocalCollector::new(
            Arc::new(HostQueries),
            Arc::clone(&prober),
            cfg.internet_test_host.clone(),
        );
        let remote = RemoteClient::new(client, cfg.server_base_url.clone(), &cfg.remote);
        let sweeper = Sweeper::new(
            prober,
            cfg.network.prefix.clone(),
            cfg.network.host_range_start..cfg.network.host_range_end,
            Arc::new(cfg.network.friendly_names.clone()),
            cfg.probe.max_concurrency,
        );
        Self::new(local, remote, sweeper)
    }

    pub async fn overview(&self) -> Overview {
        let (local, server, notes) = tokio::join!(
            self.local.collect(),
            self.remote.server_status(),
            self.remote.fetch_notes_summary(),
        );
        Overview {
            local,
            server,
            notes,
            server_url: self.remote.base_url().to_string(),
            generated_at: generated_at(),
        }
    }

    pub async fn devices(&self) -> DeviceSweep {
        let devices = self.sweeper.sweep().await;
        let range = self.sweeper.host_range();
        DeviceSweep {
            devices,
            network_prefix: self.sweeper.prefix().to_string(),
            host_range_start: range.start,
            host_range_end: range.end,
            scanned: self.sweeper.host_count(),
            generated_at: generated_at(),
        }
    }
}

fn generated_at() -> String {
    humantime::format_rfc3339_seconds(SystemTime::now()).to_string()
}
