use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalStatus {
    pub hostname: String,
    pub kernel_info: String,
    pub uptime: String,
    pub disk_root_summary: String,
    pub internet_reachable: bool,
    pub captured_at_epoch_seconds: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerStatus {
    pub reachable: bool,
    pub status_payload: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotesSummary {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub notes: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRecord {
    pub name: String,
    pub ip_address: String,
    pub reachable: bool,
    pub latency_milliseconds: Option<f64>,
}

/// Outcome of a single probe. `latency_ms` is only ever set for reachable hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProbeResult {
    pub reachable: bool,
    pub latency_ms: Option<f64>,
}

impl ProbeResult {
    pub const UNREACHABLE: Self = Self {
        reachable: false,
        latency_ms: None,
    };

    pub fn reachable(latency_ms: Option<f64>) -> Self {
        Self {
            reachable: true,
            latency_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub local: LocalStatus,
    pub server: ServerStatus,
    pub notes: NotesSummary,
    pub server_url: String,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceSweep {
    pub devices: Vec<DeviceRecord>,
    pub network_prefix: String,
    pub host_range_start: u16,
    pub host_range_end: u16,
    pub scanned: usize,
    pub generated_at: String,
}
