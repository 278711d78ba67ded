//! Zone bounding boxes and zone membership.
//!
//! A widget belongs to a zone when its location lies inside the zone's
//! bounding box, shrunk by an optional inward margin. Connectors and anchors
//! are never tested by location: connectors are admitted afterwards only when
//! both of their endpoints were selected, anchors are never selected.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::widget::{Point, Widget, Zone};

/// Axis-aligned rectangle in canvas-global coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            scale: 1.0,
        }
    }

    /// Project a zone's fields into a bounding box.
    ///
    /// Fails when the zone has a non-positive width or height, since such a
    /// zone cannot act as a coordinate frame.
    pub fn of_zone(zone: &Zone) -> Result<Self, CoreError> {
        if !(zone.size.width > 0.0 && zone.size.height > 0.0) {
            return Err(CoreError::Validation(format!(
                "Zone {} has invalid size {}x{}",
                zone.id, zone.size.width, zone.size.height
            )));
        }
        Ok(Self {
            x: zone.location.x,
            y: zone.location.y,
            width: zone.size.width,
            height: zone.size.height,
            scale: zone.scale.unwrap_or(1.0),
        })
    }

    /// Whether `point` lies inside the box shrunk inward by `margin` on
    /// every side. Edges are inclusive.
    pub fn contains(&self, point: Point, margin: f64) -> bool {
        point.x >= self.x + margin
            && point.x <= self.x + self.width - margin
            && point.y >= self.y + margin
            && point.y <= self.y + self.height - margin
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Location test for a single widget. Widgets without a location are never
/// inside any zone.
pub fn is_in_zone(widget: &Widget, bbox: &BoundingBox, margin: f64) -> bool {
    widget
        .location
        .is_some_and(|location| bbox.contains(location, margin))
}

/// Widgets positioned inside the zone, excluding connectors and anchors.
///
/// This is the working set of the layout macros and of pin/unpin.
pub fn select_positioned(widgets: &[Widget], bbox: &BoundingBox, margin: f64) -> Vec<Widget> {
    widgets
        .iter()
        .filter(|w| !w.is_connector() && !w.is_anchor())
        .filter(|w| w.id.is_some() && is_in_zone(w, bbox, margin))
        .cloned()
        .collect()
}

/// Widgets positioned inside the zone plus every connector whose both
/// endpoints are among them.
///
/// This is the working set of move, copy and delete.
pub fn select_zone_members(widgets: &[Widget], bbox: &BoundingBox, margin: f64) -> Vec<Widget> {
    let mut selected = select_positioned(widgets, bbox, margin);
    let connectors = connectors_within(widgets, &selected);
    selected.extend(connectors);
    selected
}

/// Connectors from `all` whose `src` and `dst` both refer to a widget in
/// `selected`.
pub fn connectors_within(all: &[Widget], selected: &[Widget]) -> Vec<Widget> {
    let ids: HashSet<&str> = selected.iter().filter_map(Widget::id).collect();
    all.iter()
        .filter(|w| w.is_connector() && w.id.is_some())
        .filter(|w| {
            w.endpoint_ids()
                .is_some_and(|(src, dst)| ids.contains(src) && ids.contains(dst))
        })
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
