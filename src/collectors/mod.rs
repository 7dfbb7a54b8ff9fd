pub mod local;
pub mod probe;
pub mod sweep;

use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
pub mod testing {
    use super::local::{QueryError, SystemQueries};
    use super::probe::{ProbeMode, Prober};
    use crate::state::ProbeResult;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    pub struct StubProber {
        answers: HashMap<String, ProbeResult>,
        delays: HashMap<String, Duration>,
        calls: Mutex<Vec<(String, ProbeMode)>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl StubProber {
        pub fn with_reachable(mut self, address: &str, latency_ms: Option<f64>) -> Self {
            self.answers
                .insert(address.to_string(), ProbeResult::reachable(latency_ms));
            self
        }

        pub fn with_delay(mut self, address: &str, delay: Duration) -> Self {
            self.delays.insert(address.to_string(), delay);
            self
        }

        pub fn calls(&self) -> Vec<(String, ProbeMode)> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Prober for StubProber {
        async fn probe(&self, address: &str, mode: ProbeMode) -> ProbeResult {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((address.to_string(), mode));
            }

            let delay = self
                .delays
                .get(address)
                .copied()
                .unwrap_or(Duration::from_millis(5));
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let answer = self
                .answers
                .get(address)
                .copied()
                .unwrap_or(ProbeResult::UNREACHABLE);
            match mode {
                ProbeMode::Latency => answer,
                ProbeMode::Reachability if answer.reachable => ProbeResult::reachable(None),
                ProbeMode::Reachability => ProbeResult::UNREACHABLE,
            }
        }
    }

    #[derive(Default)]
    pub struct MockQueries {
        pub fail_uptime: bool,
    }

    #[async_trait]
    impl SystemQueries for MockQueries {
        async fn hostname(&self) -> Result<String, QueryError> {
            Ok("homebox".to_string())
        }

        async fn kernel_info(&self) -> Result<String, QueryError> {
            Ok("Linux homebox 6.1.0 x86_64".to_string())
        }

        async fn uptime(&self) -> Result<String, QueryError> {
            if self.fail_uptime {
                return Err(QueryError::Unavailable("uptime"));
            }
            Ok("up 3 days".to_string())
        }

        async fn disk_usage(&self, path: &str) -> Result<String, QueryError> {
            Ok(format!("/dev/sda1  100G  40G  60G  40% {path}"))
        }
    }
}
