//! Widget and zone records as exchanged with the remote canvas service.
//!
//! Field names follow the remote API (snake_case). Every field the service
//! returns that is not modelled explicitly is kept in an `extra` map so a
//! widget can be re-created without losing attributes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::WidgetId;

/// Width and height used when a widget record carries no `size`.
pub const DEFAULT_WIDGET_SIZE: Size = Size {
    width: 300.0,
    height: 300.0,
};

// ---------------------------------------------------------------------------
// Widget type
// ---------------------------------------------------------------------------

/// Closed set of widget kinds known to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WidgetType {
    Note,
    Image,
    Pdf,
    Video,
    Connector,
    Anchor,
    Browser,
    SharedCanvas,
}

impl WidgetType {
    /// All recognised widget types.
    pub const ALL: [WidgetType; 8] = [
        WidgetType::Note,
        WidgetType::Image,
        WidgetType::Pdf,
        WidgetType::Video,
        WidgetType::Connector,
        WidgetType::Anchor,
        WidgetType::Browser,
        WidgetType::SharedCanvas,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WidgetType::Note => "Note",
            WidgetType::Image => "Image",
            WidgetType::Pdf => "Pdf",
            WidgetType::Video => "Video",
            WidgetType::Connector => "Connector",
            WidgetType::Anchor => "Anchor",
            WidgetType::Browser => "Browser",
            WidgetType::SharedCanvas => "SharedCanvas",
        }
    }

    /// Remote sub-collection that owns widgets of this type.
    ///
    /// Shared canvases are listed by the service but cannot be created,
    /// patched or deleted through a collection endpoint.
    pub fn collection(self) -> Option<&'static str> {
        match self {
            WidgetType::Note => Some("notes"),
            WidgetType::Image => Some("images"),
            WidgetType::Pdf => Some("pdfs"),
            WidgetType::Video => Some("videos"),
            WidgetType::Connector => Some("connectors"),
            WidgetType::Anchor => Some("anchors"),
            WidgetType::Browser => Some("browsers"),
            WidgetType::SharedCanvas => None,
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidgetType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownWidgetType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Geometry primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// One end of a connector: a reference to another widget by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: WidgetId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Endpoint {
    pub fn new(id: impl Into<WidgetId>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

/// A unit placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WidgetId>,
    pub widget_type: WidgetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<WidgetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_text_color: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Widget {
    /// Create a bare widget of the given type with no attributes set.
    pub fn new(widget_type: WidgetType) -> Self {
        Self {
            id: None,
            widget_type,
            location: None,
            size: None,
            scale: None,
            parent_id: None,
            src: None,
            dst: None,
            pinned: None,
            background_color: None,
            title: None,
            text: None,
            auto_text_color: None,
            text_color: None,
            extra: Map::new(),
        }
    }

    /// Decode a raw listing record, rejecting widget types outside the
    /// closed [`WidgetType`] set.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        let type_name = value
            .get("widget_type")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::Validation("widget record has no widget_type".into()))?;
        type_name.parse::<WidgetType>()?;

        serde_json::from_value(value)
            .map_err(|e| CoreError::Validation(format!("malformed widget record: {e}")))
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_connector(&self) -> bool {
        self.widget_type == WidgetType::Connector
    }

    pub fn is_anchor(&self) -> bool {
        self.widget_type == WidgetType::Anchor
    }

    pub fn effective_scale(&self) -> f64 {
        self.scale.unwrap_or(1.0)
    }

    pub fn effective_size(&self) -> Size {
        match self.size {
            Some(size) if size.width > 0.0 && size.height > 0.0 => size,
            _ => DEFAULT_WIDGET_SIZE,
        }
    }

    /// The `(src, dst)` widget ids of a connector.
    pub fn endpoint_ids(&self) -> Option<(&str, &str)> {
        match (&self.src, &self.dst) {
            (Some(src), Some(dst)) => Some((src.id.as_str(), dst.id.as_str())),
            _ => None,
        }
    }

    /// Deep copy suitable for submission to a create endpoint.
    ///
    /// The id is stripped, and a widget with automatic text color drops its
    /// stored text color so the service derives it afresh.
    pub fn to_create_payload(&self) -> Widget {
        let mut payload = self.clone();
        payload.id = None;
        if payload.auto_text_color == Some(true) {
            payload.text_color = None;
        }
        payload
    }
}

/// A rectangular anchor widget used as a coordinate frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: WidgetId,
    #[serde(default)]
    pub anchor_name: Option<String>,
    pub location: Point,
    pub size: Size,
    #[serde(default)]
    pub scale: Option<f64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn widget_type_round_trips_through_str() {
        for t in WidgetType::ALL {
            assert_eq!(t.as_str().parse::<WidgetType>().unwrap(), t);
        }
    }

    #[test]
    fn unknown_widget_type_is_rejected() {
        let err = "Sticker".parse::<WidgetType>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownWidgetType(ref s) if s == "Sticker"));
    }

    #[test]
    fn shared_canvas_has_no_collection() {
        assert_eq!(WidgetType::Note.collection(), Some("notes"));
        assert_eq!(WidgetType::Connector.collection(), Some("connectors"));
        assert_eq!(WidgetType::SharedCanvas.collection(), None);
    }

    #[test]
    fn unmodelled_fields_are_preserved() {
        let value = json!({
            "id": "n1",
            "widget_type": "Note",
            "location": {"x": 10, "y": 20.5},
            "depth": 3,
            "state": "normal",
        });
        let widget = Widget::from_value(value).unwrap();
        assert_eq!(widget.location, Some(Point { x: 10.0, y: 20.5 }));
        assert_eq!(widget.extra["depth"], 3);

        let back = serde_json::to_value(&widget).unwrap();
        assert_eq!(back["state"], "normal");
        assert!(back.get("title").is_none());
    }

    #[test]
    fn from_value_rejects_unknown_type() {
        let err = Widget::from_value(json!({"id": "x", "widget_type": "Hologram"})).unwrap_err();
        assert!(matches!(err, CoreError::UnknownWidgetType(_)));
    }

    #[test]
    fn create_payload_strips_id_and_stale_text_color() {
        let mut widget = Widget::new(WidgetType::Note);
        widget.id = Some("n1".into());
        widget.auto_text_color = Some(true);
        widget.text_color = Some("#000000ff".into());

        let payload = widget.to_create_payload();
        assert!(payload.id.is_none());
        assert!(payload.text_color.is_none());
        assert_eq!(widget.id.as_deref(), Some("n1"));
    }

    #[test]
    fn explicit_text_color_survives_without_auto_flag() {
        let mut widget = Widget::new(WidgetType::Note);
        widget.text_color = Some("#ff0000ff".into());
        assert_eq!(
            widget.to_create_payload().text_color.as_deref(),
            Some("#ff0000ff")
        );
    }

    #[test]
    fn missing_size_defaults() {
        let widget = Widget::new(WidgetType::Image);
        assert_eq!(widget.effective_size(), DEFAULT_WIDGET_SIZE);
        assert_eq!(widget.effective_scale(), 1.0);
    }
}
