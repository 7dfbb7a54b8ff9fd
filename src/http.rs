use crate::dashboard::Dashboard;
use crate::metrics::Metrics;
use crate::state::{DeviceSweep, Overview};
use crate::views;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Clone)]
pub struct HttpAppState {
    pub metrics: Arc<Metrics>,
    pub dashboard: Arc<Dashboard>,
}

pub fn build_router(metrics: Arc<Metrics>, dashboard: Arc<Dashboard>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/devices", get(devices_handler))
        .route("/api/overview", get(overview_api_handler))
        .route("/api/devices", get(devices_api_handler))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .with_state(HttpAppState { metrics, dashboard })
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn home_handler(State(state): State<HttpAppState>) -> Html<String> {
    state.metrics.inc_page_request("home");
    let overview = collect_overview(&state).await;
    Html(views::render_home(&overview))
}

async fn devices_handler(State(state): State<HttpAppState>) -> Html<String> {
    state.metrics.inc_page_request("devices");
    let sweep = collect_devices(&state).await;
    Html(views::render_devices(&sweep))
}

async fn overview_api_handler(State(state): State<HttpAppState>) -> Json<Overview> {
    state.metrics.inc_page_request("api_overview");
    Json(collect_overview(&state).await)
}

async fn devices_api_handler(State(state): State<HttpAppState>) -> Json<DeviceSweep> {
    state.metrics.inc_page_request("api_devices");
    Json(collect_devices(&state).await)
}

async fn collect_overview(state: &HttpAppState) -> Overview {
    let overview = state.dashboard.overview().await;
    state.metrics.record_overview(&overview);
    overview
}

async fn collect_devices(state: &HttpAppState) -> DeviceSweep {
    let start = Instant::now();
    let sweep = state.dashboard.devices().await;
    let elapsed = start.elapsed();
    state.metrics.record_sweep(&sweep, elapsed);
    info!(
        scanned = sweep.scanned,
        reachable = sweep.devices.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "device sweep finished"
    );
    sweep
}

async fn metrics_handler(State(state): State<HttpAppState>) -> Response {
    state.metrics.inc_scrape_count();
    match state.metrics.encode_metrics() {
        Ok(encoded) => {
            let mut response = Response::new(Body::from(encoded));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to encode metrics: {err}"),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::stub_dashboard;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        let metrics = Metrics::new().expect("metrics init");
        build_router(metrics, Arc::new(stub_dashboard()))
    }

    async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let (status, body) = get_text(app(), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn home_page_shows_local_and_server_state() {
        let (status, body) = get_text(app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("homebox"));
        assert!(body.contains("Unreachable"));
        assert!(body.contains("http://127.0.0.1:1"));
    }

    #[tokio::test]
    async fn devices_page_lists_reachable_hosts() {
        let (status, body) = get_text(app(), "/devices").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Device 10.0.0.2"));
        assert!(body.contains("3.5 ms"));
        assert!(!body.contains("Printer"));
    }

    #[tokio::test]
    async fn devices_api_returns_json() {
        let (status, body) = get_text(app(), "/api/devices").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["devices"][0]["ip_address"], "10.0.0.2");
        assert_eq!(value["devices"][0]["latency_milliseconds"], 3.5);
        assert_eq!(value["scanned"], 3);
    }

    #[tokio::test]
    async fn overview_api_returns_json() {
        let (status, body) = get_text(app(), "/api/overview").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["server"]["reachable"], false);
        assert_eq!(value["server"]["status_payload"], serde_json::Value::Null);
        assert_eq!(value["notes"]["count"], 0);
    }

    #[tokio::test]
    async fn metrics_counts_page_requests() {
        let metrics = Metrics::new().expect("metrics init");
        let app = build_router(metrics.clone(), Arc::new(stub_dashboard()));
        let _ = get_text(app.clone(), "/devices").await;

        let (status, body) = get_text(app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("dashboard_page_requests_total{view=\"devices\"} 1"));
        assert!(body.contains("dashboard_devices_reachable 1"));
    }
}
