//! In-memory [`CanvasApi`] implementation.
//!
//! Keeps widgets in insertion order, assigns sequential ids on create, and
//! records every call so tests can assert on ordering. Failures can be
//! injected per widget id (patch/delete) or per title (create).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use zoneops_core::types::WidgetId;
use zoneops_core::widget::{Widget, WidgetType, Zone};

use crate::api::CanvasApi;
use crate::error::CanvasError;

/// One recorded call against an [`InMemoryCanvas`].
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasCall {
    ListWidgets,
    ListCollection(WidgetType),
    GetZone(String),
    ListZones,
    /// A successful create, with the id that was assigned.
    Create {
        widget_type: WidgetType,
        id: WidgetId,
    },
    Update {
        id: WidgetId,
        fields: Value,
    },
    Delete {
        id: WidgetId,
    },
}

#[derive(Debug, Clone, Copy)]
struct Injected {
    remaining: u32,
    status: u16,
}

#[derive(Debug, Default)]
struct MemoryState {
    widgets: Vec<Widget>,
    next_id: u64,
    omit_create_ids: bool,
    fail_listing: Option<u16>,
    widget_failures: HashMap<WidgetId, Injected>,
    create_failures: HashMap<String, Injected>,
    calls: Vec<CanvasCall>,
}

#[derive(Debug, Default)]
pub struct InMemoryCanvas {
    state: Mutex<MemoryState>,
}

impl InMemoryCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the canvas. Widgets without an id get one assigned.
    pub fn with_widgets(widgets: impl IntoIterator<Item = Widget>) -> Self {
        let canvas = Self::new();
        for widget in widgets {
            canvas.insert(widget);
        }
        canvas
    }

    /// Insert a widget directly, bypassing call recording.
    pub fn insert(&self, mut widget: Widget) -> WidgetId {
        let mut state = self.lock();
        let id = match widget.id.clone() {
            Some(id) => id,
            None => state.allocate_id(),
        };
        widget.id = Some(id.clone());
        state.widgets.push(widget);
        id
    }

    pub fn widgets(&self) -> Vec<Widget> {
        self.lock().widgets.clone()
    }

    pub fn widget(&self, id: &str) -> Option<Widget> {
        self.lock()
            .widgets
            .iter()
            .find(|w| w.id() == Some(id))
            .cloned()
    }

    pub fn calls(&self) -> Vec<CanvasCall> {
        self.lock().calls.clone()
    }

    /// Make create responses omit the new id.
    pub fn set_omit_create_ids(&self, omit: bool) {
        self.lock().omit_create_ids = omit;
    }

    /// Make listing calls fail with `status`.
    pub fn fail_listing(&self, status: u16) {
        self.lock().fail_listing = Some(status);
    }

    /// Make the next `times` patch/delete calls on `id` fail with `status`.
    pub fn fail_widget(&self, id: &str, times: u32, status: u16) {
        self.lock().widget_failures.insert(
            id.to_string(),
            Injected {
                remaining: times,
                status,
            },
        );
    }

    /// Make the next `times` creates of a widget titled `title` fail.
    pub fn fail_create_titled(&self, title: &str, times: u32, status: u16) {
        self.lock().create_failures.insert(
            title.to_string(),
            Injected {
                remaining: times,
                status,
            },
        );
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test assertion panicked mid-call.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MemoryState {
    fn allocate_id(&mut self) -> WidgetId {
        self.next_id += 1;
        format!("mem-{}", self.next_id)
    }

    fn check_listing(&self) -> Result<(), CanvasError> {
        match self.fail_listing {
            Some(status) => Err(api_error(status, "listing failed")),
            None => Ok(()),
        }
    }

    fn position(&self, id: &str) -> Result<usize, CanvasError> {
        self.widgets
            .iter()
            .position(|w| w.id() == Some(id))
            .ok_or_else(|| api_error(404, &format!("widget {id} not found")))
    }
}

fn take_failure(failures: &mut HashMap<String, Injected>, key: &str) -> Option<CanvasError> {
    let injected = failures.get_mut(key)?;
    if injected.remaining == 0 {
        return None;
    }
    injected.remaining -= 1;
    Some(api_error(injected.status, "injected failure"))
}

fn api_error(status: u16, body: &str) -> CanvasError {
    CanvasError::Api {
        status,
        body: body.to_string(),
    }
}

fn zone_from_widget(widget: &Widget) -> Option<Zone> {
    Some(Zone {
        id: widget.id.clone()?,
        anchor_name: widget.title.clone(),
        location: widget.location?,
        size: widget.size?,
        scale: widget.scale,
    })
}

#[async_trait]
impl CanvasApi for InMemoryCanvas {
    async fn list_widgets(&self) -> Result<Vec<Widget>, CanvasError> {
        let mut state = self.lock();
        state.calls.push(CanvasCall::ListWidgets);
        state.check_listing()?;
        Ok(state.widgets.clone())
    }

    async fn list_collection(&self, widget_type: WidgetType) -> Result<Vec<Widget>, CanvasError> {
        let mut state = self.lock();
        state.calls.push(CanvasCall::ListCollection(widget_type));
        state.check_listing()?;
        Ok(state
            .widgets
            .iter()
            .filter(|w| w.widget_type == widget_type)
            .cloned()
            .collect())
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone, CanvasError> {
        let mut state = self.lock();
        state.calls.push(CanvasCall::GetZone(zone_id.to_string()));
        state
            .widgets
            .iter()
            .find(|w| w.is_anchor() && w.id() == Some(zone_id))
            .and_then(zone_from_widget)
            .ok_or_else(|| api_error(404, &format!("anchor {zone_id} not found")))
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, CanvasError> {
        let mut state = self.lock();
        state.calls.push(CanvasCall::ListZones);
        state.check_listing()?;
        Ok(state
            .widgets
            .iter()
            .filter(|w| w.is_anchor())
            .filter_map(zone_from_widget)
            .collect())
    }

    async fn create_widget(&self, payload: &Widget) -> Result<Option<WidgetId>, CanvasError> {
        let mut state = self.lock();
        if payload.widget_type.collection().is_none() {
            return Err(CanvasError::Unsupported(payload.widget_type));
        }
        if let Some(title) = payload.title.as_deref() {
            if let Some(err) = take_failure(&mut state.create_failures, title) {
                return Err(err);
            }
        }

        let id = state.allocate_id();
        let mut stored = payload.clone();
        stored.id = Some(id.clone());
        state.widgets.push(stored);
        state.calls.push(CanvasCall::Create {
            widget_type: payload.widget_type,
            id: id.clone(),
        });

        Ok((!state.omit_create_ids).then_some(id))
    }

    async fn update_widget(
        &self,
        widget_type: WidgetType,
        widget_id: &str,
        fields: &Value,
    ) -> Result<(), CanvasError> {
        let mut state = self.lock();
        if widget_type.collection().is_none() {
            return Err(CanvasError::Unsupported(widget_type));
        }
        if let Some(err) = take_failure(&mut state.widget_failures, widget_id) {
            return Err(err);
        }

        let index = state.position(widget_id)?;
        let mut merged = serde_json::to_value(&state.widgets[index])?;
        if let (Some(target), Some(patch)) = (merged.as_object_mut(), fields.as_object()) {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
        }
        state.widgets[index] = serde_json::from_value(merged)?;
        state.calls.push(CanvasCall::Update {
            id: widget_id.to_string(),
            fields: fields.clone(),
        });
        Ok(())
    }

    async fn delete_widget(&self, widget_type: WidgetType, widget_id: &str) -> Result<(), CanvasError> {
        let mut state = self.lock();
        if widget_type.collection().is_none() {
            return Err(CanvasError::Unsupported(widget_type));
        }
        if let Some(err) = take_failure(&mut state.widget_failures, widget_id) {
            return Err(err);
        }

        let index = state.position(widget_id)?;
        state.widgets.remove(index);
        state.calls.push(CanvasCall::Delete {
            id: widget_id.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use zoneops_core::widget::{Point, Size};

    use super::*;

    fn anchor(id: &str) -> Widget {
        let mut w = Widget::new(WidgetType::Anchor);
        w.id = Some(id.into());
        w.location = Some(Point { x: 0.0, y: 0.0 });
        w.size = Some(Size {
            width: 100.0,
            height: 100.0,
        });
        w
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let canvas = InMemoryCanvas::new();
        let first = canvas.create_widget(&Widget::new(WidgetType::Note)).await.unwrap();
        let second = canvas.create_widget(&Widget::new(WidgetType::Image)).await.unwrap();
        assert_eq!(first.as_deref(), Some("mem-1"));
        assert_eq!(second.as_deref(), Some("mem-2"));
        assert_eq!(canvas.widgets().len(), 2);
    }

    #[tokio::test]
    async fn omitted_ids_still_store_widget() {
        let canvas = InMemoryCanvas::new();
        canvas.set_omit_create_ids(true);
        let id = canvas.create_widget(&Widget::new(WidgetType::Note)).await.unwrap();
        assert!(id.is_none());
        assert_eq!(canvas.widgets().len(), 1);
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let canvas = InMemoryCanvas::new();
        let id = canvas.insert(Widget::new(WidgetType::Note));
        canvas
            .update_widget(WidgetType::Note, &id, &json!({"pinned": true, "scale": 2.0}))
            .await
            .unwrap();

        let widget = canvas.widget(&id).unwrap();
        assert_eq!(widget.pinned, Some(true));
        assert_eq!(widget.scale, Some(2.0));
    }

    #[tokio::test]
    async fn injected_failures_run_out() {
        let canvas = InMemoryCanvas::new();
        let id = canvas.insert(Widget::new(WidgetType::Note));
        canvas.fail_widget(&id, 1, 503);

        assert!(canvas.delete_widget(WidgetType::Note, &id).await.is_err());
        assert!(canvas.delete_widget(WidgetType::Note, &id).await.is_ok());
        assert!(canvas.widget(&id).is_none());
    }

    #[tokio::test]
    async fn zones_are_anchors() {
        let canvas = InMemoryCanvas::with_widgets([anchor("z1"), Widget::new(WidgetType::Note)]);
        assert_eq!(canvas.get_zone("z1").await.unwrap().size.width, 100.0);
        assert!(canvas.get_zone("missing").await.unwrap_err().is_not_found());
        assert_eq!(canvas.list_zones().await.unwrap().len(), 1);
    }
}
