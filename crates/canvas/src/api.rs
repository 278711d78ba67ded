use async_trait::async_trait;
use zoneops_core::types::WidgetId;
use zoneops_core::widget::{Widget, WidgetType, Zone};

use crate::error::CanvasError;

/// CRUD operations the macro engine needs from the canvas service.
///
/// Implementations are shared across concurrent macro invocations, so every
/// method takes `&self`.
#[async_trait]
pub trait CanvasApi: Send + Sync {
    /// List every widget on the canvas, all types combined.
    async fn list_widgets(&self) -> Result<Vec<Widget>, CanvasError>;

    /// List the widgets of one sub-collection.
    async fn list_collection(&self, widget_type: WidgetType) -> Result<Vec<Widget>, CanvasError>;

    /// Fetch a single anchor by id.
    async fn get_zone(&self, zone_id: &str) -> Result<Zone, CanvasError>;

    /// List all anchors.
    async fn list_zones(&self) -> Result<Vec<Zone>, CanvasError>;

    /// Create a widget and return its new id, if the service reported one.
    async fn create_widget(&self, payload: &Widget) -> Result<Option<WidgetId>, CanvasError>;

    /// Patch a subset of a widget's fields.
    async fn update_widget(
        &self,
        widget_type: WidgetType,
        widget_id: &str,
        fields: &serde_json::Value,
    ) -> Result<(), CanvasError>;

    async fn delete_widget(&self, widget_type: WidgetType, widget_id: &str)
        -> Result<(), CanvasError>;
}
