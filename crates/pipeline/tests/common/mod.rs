use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use zoneops_canvas::{CanvasApi, InMemoryCanvas, RetryPolicy};
use zoneops_core::widget::{Endpoint, Point, Size, Widget, WidgetType};
use zoneops_ledger::DeletionLedger;
use zoneops_pipeline::{MacroEngine, MacroSettings};

/// Engine wired to an in-memory canvas and a ledger in a temp directory.
pub struct Harness {
    pub canvas: Arc<InMemoryCanvas>,
    pub ledger: Arc<DeletionLedger>,
    pub engine: MacroEngine,
    _dir: TempDir,
}

pub fn harness(widgets: Vec<Widget>) -> Harness {
    harness_with_margin(widgets, 0.0)
}

/// Like [`harness`], with zone membership shrunk inward by `zone_margin`.
pub fn harness_with_margin(widgets: Vec<Widget>, zone_margin: f64) -> Harness {
    let dir = tempfile::tempdir().expect("temp dir");
    let canvas = Arc::new(InMemoryCanvas::with_widgets(widgets));
    let ledger = Arc::new(DeletionLedger::new(dir.path().join("deleted_records.json"), 50));
    let settings = MacroSettings {
        zone_margin,
        retry: RetryPolicy {
            attempts: 3,
            delay: Duration::ZERO,
        },
        ..Default::default()
    };
    let engine = MacroEngine::new(
        Arc::clone(&canvas) as Arc<dyn CanvasApi>,
        Arc::clone(&ledger),
        settings,
    );
    Harness {
        canvas,
        ledger,
        engine,
        _dir: dir,
    }
}

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
    w.text = Some(format!("text of {id}"));
    w.location = Some(Point { x, y });
    w.size = Some(Size {
        width: 300.0,
        height: 300.0,
    });
    w
}

pub fn child(id: &str, parent: &str, x: f64, y: f64) -> Widget {
    let mut w = note(id, x, y);
    w.parent_id = Some(parent.into());
    w
}

pub fn connector(id: &str, src: &str, dst: &str) -> Widget {
    let mut w = Widget::new(WidgetType::Connector);
    w.id = Some(id.into());
    w.src = Some(Endpoint::new(src));
    w.dst = Some(Endpoint::new(dst));
    w
}

/// Widgets on the canvas that were created by the engine.
pub fn created(canvas: &InMemoryCanvas) -> Vec<Widget> {
    canvas
        .widgets()
        .into_iter()
        .filter(|w| w.id().is_some_and(|id| id.starts_with("mem-")))
        .collect()
}

pub fn titled<'a>(widgets: &'a [Widget], title: &str) -> &'a Widget {
    widgets
        .iter()
        .find(|w| w.title.as_deref() == Some(title))
        .unwrap_or_else(|| panic!("no widget titled {title}"))
}
