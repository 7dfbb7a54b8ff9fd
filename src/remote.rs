use crate::config::RemoteConfig;
use crate::state::{NotesSummary, ServerStatus};
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

const PING_PATH: &str = "/api/ping";
const STATUS_PATH: &str = "/api/status";
const NOTES_SUMMARY_PATH: &str = "/api/notes/summary";

#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: Client,
    base_url: String,
    ping_timeout: Duration,
    status_timeout: Duration,
    notes_timeout: Duration,
}

impl RemoteClient {
    pub fn new(client: Client, base_url: impl Into<String>, cfg: &RemoteConfig) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ping_timeout: Duration::from_millis(cfg.ping_timeout_ms),
            status_timeout: Duration::from_millis(cfg.status_timeout_ms),
            notes_timeout: Duration::from_millis(cfg.notes_timeout_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn ping_server(&self) -> bool {
        self.get_json(PING_PATH, self.ping_timeout)
            .await
            .and_then(|body| body.get("ok").map(is_truthy))
            .unwrap_or(false)
    }

    pub async fn fetch_server_status(&self) -> Option<Map<String, Value>> {
        match self.get_json(STATUS_PATH, self.status_timeout).await? {
            Value::Object(map) => Some(map),
            other => {
                warn!(endpoint = STATUS_PATH, kind = json_kind(&other), "status body is not an object");
                None
            }
        }
    }

    pub async fn fetch_notes_summary(&self) -> NotesSummary {
        let Some(body) = self.get_json(NOTES_SUMMARY_PATH, self.notes_timeout).await else {
            return NotesSummary::default();
        };
        serde_json::from_value(body).unwrap_or_else(|err| {
            warn!(endpoint = NOTES_SUMMARY_PATH, error = %err, "unexpected notes summary body");
            NotesSummary::default()
        })
    }

    pub async fn server_status(&self) -> ServerStatus {
        let (reachable, status_payload) =
            tokio::join!(self.ping_server(), self.fetch_server_status());
        ServerStatus {
            reachable,
            status_payload,
        }
    }

    async fn get_json(&self, path: &str, timeout: Duration) -> Option<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = match self.client.get(&url).timeout(timeout).send().await {
            Ok(resp) => resp,
            Err(err) => {
                debug!(url = %url, error = %err, "remote request failed");
                return None;
            }
        };

        if resp.status() != StatusCode::OK {
            debug!(url = %url, status = resp.status().as_u16(), "remote request returned non-200");
            return None;
        }

        match resp.json::<Value>().await {
            Ok(body) => Some(body),
            Err(err) => {
                warn!(url = %url, error = %err, "remote response is not valid JSON");
                None
            }
        }
    }
}

/// JSON truthiness: false, null, zero and empty containers are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
