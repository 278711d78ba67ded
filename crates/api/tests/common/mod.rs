use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use zoneops_api::config::ServerConfig;
use zoneops_api::router::build_app_router;
use zoneops_api::state::AppState;
use zoneops_canvas::{CanvasApi, CanvasConfig, InMemoryCanvas, RetryPolicy};
use zoneops_core::widget::{Endpoint, Point, Size, Widget, WidgetType};
use zoneops_events::EventBus;
use zoneops_ledger::DeletionLedger;
use zoneops_pipeline::{MacroEngine, MacroSettings};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        canvas: CanvasConfig {
            server_url: "http://canvas.invalid".to_string(),
            canvas_id: "test-canvas".to_string(),
            api_token: "test-token".to_string(),
            request_timeout: Duration::from_secs(5),
        },
        ledger_path: dir.path().join("deleted_records.json"),
        ledger_retention: 50,
        zone_margin: 0.0,
        retry_attempts: 1,
        retry_delay_ms: 0,
    }
}

/// Application router over an in-memory canvas.
pub struct TestApp {
    pub router: Router,
    pub canvas: Arc<InMemoryCanvas>,
    pub event_bus: Arc<EventBus>,
    _dir: TempDir,
}

/// Build the full application router with all middleware layers, backed by
/// an in-memory canvas seeded with `widgets`.
pub fn build_test_app(widgets: Vec<Widget>) -> TestApp {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = test_config(&dir);
    let canvas = Arc::new(InMemoryCanvas::with_widgets(widgets));
    let ledger = Arc::new(DeletionLedger::new(&config.ledger_path, config.ledger_retention));
    let settings = MacroSettings {
        retry: RetryPolicy::none(),
        ..config.macro_settings()
    };
    let engine = Arc::new(MacroEngine::new(
        Arc::clone(&canvas) as Arc<dyn CanvasApi>,
        ledger,
        settings,
    ));
    let event_bus = Arc::new(EventBus::default());

    let state = AppState {
        config: Arc::new(config.clone()),
        engine,
        event_bus: Arc::clone(&event_bus),
    };

    TestApp {
        router: build_app_router(state, &config),
        canvas,
        event_bus,
        _dir: dir,
    }
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty()).await
}

pub async fn delete(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Body::empty()).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Body::from(body.to_string())).await
}

async fn send(app: &TestApp, method: Method, uri: &str, body: Body) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Widget fixtures
// ---------------------------------------------------------------------------

pub fn zone(id: &str, x: f64, y: f64, width: f64, height: f64) -> Widget {
    let mut w = Widget::new(WidgetType::Anchor);
    w.id = Some(id.into());
    w.title = Some(format!("Zone {id}"));
    w.location = Some(Point { x, y });
    w.size = Some(Size { width, height });
    w
}

pub fn note(id: &str, x: f64, y: f64) -> Widget {
    let mut w = Widget::new(WidgetType::Note);
    w.id = Some(id.into());
    w.title = Some(id.to_uppercase());
    w.location = Some(Point { x, y });
    w
}

pub fn connector(id: &str, src: &str, dst: &str) -> Widget {
    let mut w = Widget::new(WidgetType::Connector);
    w.id = Some(id.into());
    w.src = Some(Endpoint::new(src));
    w.dst = Some(Endpoint::new(dst));
    w
}
