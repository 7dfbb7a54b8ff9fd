use crate::state::{DeviceSweep, Overview};
use prometheus::core::Collector;
use prometheus::{opts, Counter, CounterVec, Encoder, Gauge, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    started_at: Instant,
    pub dashboard_page_requests_total: CounterVec,
    pub dashboard_probes_total: CounterVec,
    pub dashboard_devices_reachable: Gauge,
    pub dashboard_sweep_duration_seconds: Gauge,
    pub dashboard_remote_reachable: Gauge,
    pub dashboard_internet_reachable: Gauge,
    pub dashboard_scrape_count_total: Counter,
    pub dashboard_uptime_seconds: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let dashboard_page_requests_total = CounterVec::new(
            opts!(
                "dashboard_page_requests_total",
                "Dashboard views served, by view"
            ),
            &["view"],
        )?;
        let dashboard_probes_total = CounterVec::new(
            opts!(
                "dashboard_probes_total",
                "Device sweep probes, by result (reachable/unreachable)"
            ),
            &["result"],
        )?;
        let dashboard_devices_reachable = Gauge::with_opts(opts!(
            "dashboard_devices_reachable",
            "Reachable devices found by the last sweep"
        ))?;
        let dashboard_sweep_duration_seconds = Gauge::with_opts(opts!(
            "dashboard_sweep_duration_seconds",
            "Wall-clock duration of the last device sweep"
        ))?;
        let dashboard_remote_reachable = Gauge::with_opts(opts!(
            "dashboard_remote_reachable",
            "1 if the last remote server ping succeeded"
        ))?;
        let dashboard_internet_reachable = Gauge::with_opts(opts!(
            "dashboard_internet_reachable",
            "1 if the last internet probe succeeded"
        ))?;
        let dashboard_scrape_count_total = Counter::with_opts(opts!(
            "dashboard_scrape_count_total",
            "Number of /metrics scrapes"
        ))?;
        let dashboard_uptime_seconds = Gauge::with_opts(opts!(
            "dashboard_uptime_seconds",
            "Seconds since the dashboard started"
        ))?;

        register(&registry, &dashboard_page_requests_total)?;
        register(&registry, &dashboard_probes_total)?;
        register(&registry, &dashboard_devices_reachable)?;
        register(&registry, &dashboard_sweep_duration_seconds)?;
        register(&registry, &dashboard_remote_reachable)?;
        register(&registry, &dashboard_internet_reachable)?;
        register(&registry, &dashboard_scrape_count_total)?;
        register(&registry, &dashboard_uptime_seconds)?;

        Ok(Arc::new(Self {
            registry,
            started_at: Instant::now(),
            dashboard_page_requests_total,
            dashboard_probes_total,
            dashboard_devices_reachable,
            dashboard_sweep_duration_seconds,
            dashboard_remote_reachable,
            dashboard_internet_reachable,
            dashboard_scrape_count_total,
            dashboard_uptime_seconds,
        }))
    }

    pub fn inc_page_request(&self, view: &str) {
        self.dashboard_page_requests_total
            .with_label_values(&[view])
            .inc();
    }

    pub fn record_overview(&self, overview: &Overview) {
        self.dashboard_remote_reachable
            .set(bool_gauge(overview.server.reachable));
        self.dashboard_internet_reachable
            .set(bool_gauge(overview.local.internet_reachable));
    }

    pub fn record_sweep(&self, sweep: &DeviceSweep, elapsed: Duration) {
        let reachable = sweep.devices.len();
        let unreachable = sweep.scanned.saturating_sub(reachable);
        self.dashboard_probes_total
            .with_label_values(&["reachable"])
            .inc_by(reachable as f64);
        self.dashboard_probes_total
            .with_label_values(&["unreachable"])
            .inc_by(unreachable as f64);
        self.dashboard_devices_reachable.set(reachable as f64);
        self.dashboard_sweep_duration_seconds
            .set(elapsed.as_secs_f64());
    }

    pub fn inc_scrape_count(&self) {
        self.dashboard_scrape_count_total.inc();
    }

    pub fn encode_metrics(&self) -> Result<Vec<u8>, prometheus::Error> {
        self.dashboard_uptime_seconds
            .set(self.started_at.elapsed().as_secs_f64());
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf)?;
        Ok(buf)
    }
}

fn bool_gauge(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn register<T: Collector + Clone + 'static>(
    registry: &Registry,
    collector: &T,
) -> Result<(), prometheus::Error> {
    registry.register(Box::new(collector.clone()))
}
