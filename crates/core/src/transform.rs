//! Zone-to-zone coordinate transform.
//!
//! Positions are mapped relative to the zone origin and scaled uniformly by
//! the ratio of the zone widths. The height ratio is ignored, so a widget
//! keeps its proportions even when the zones have different aspect ratios.

use crate::geometry::BoundingBox;
use crate::widget::{Point, Widget};

/// Uniform scale factor between two frames.
pub fn scale_factor(source: &BoundingBox, target: &BoundingBox) -> f64 {
    target.width / source.width
}

/// Map a point from the `source` frame into the `target` frame.
pub fn map_point(point: Point, source: &BoundingBox, target: &BoundingBox) -> Point {
    let factor = scale_factor(source, target);
    Point {
        x: target.x + (point.x - source.x) * factor,
        y: target.y + (point.y - source.y) * factor,
    }
}

/// Return a copy of `widget` re-expressed in the `target` frame.
///
/// Connectors are returned unchanged: their geometry is defined by their
/// endpoints.
pub fn transform(widget: &Widget, source: &BoundingBox, target: &BoundingBox) -> Widget {
    let mut moved = widget.clone();
    if widget.is_connector() {
        return moved;
    }

    moved.location = widget
        .location
        .map(|location| map_point(location, source, target));
    moved.scale = Some(widget.effective_scale() * scale_factor(source, target));
    moved
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{Endpoint, WidgetType};

    const EPS: f64 = 1e-9;

    fn widget_at(x: f64, y: f64, scale: Option<f64>) -> Widget {
        let mut w = Widget::new(WidgetType::Note);
        w.id = Some("w".into());
        w.location = Some(Point { x, y });
        w.scale = scale;
        w
    }

    #[test]
    fn move_scenario_doubles_position_and_scale() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(500.0, 0.0, 200.0, 200.0);

        let moved = transform(&widget_at(50.0, 50.0, Some(1.0)), &a, &b);
        assert_eq!(moved.location, Some(Point { x: 600.0, y: 100.0 }));
        assert_eq!(moved.scale, Some(2.0));
    }

    #[test]
    fn relative_position_is_preserved() {
        let source = BoundingBox::new(-40.0, 13.0, 320.0, 90.0);
        let target = BoundingBox::new(1000.0, -250.0, 75.0, 400.0);
        let original = widget_at(200.0, 40.0, Some(0.75));

        let moved = transform(&original, &source, &target);
        let location = moved.location.unwrap();
        let before = (200.0 - source.x) / source.width;
        let after = (location.x - target.x) / target.width;
        assert!((before - after).abs() < EPS);
        assert!((moved.scale.unwrap() - 0.75 * 75.0 / 320.0).abs() < EPS);
    }

    #[test]
    fn identity_transform_is_a_no_op() {
        let bbox = BoundingBox::new(12.5, 7.0, 640.0, 480.0);
        let original = widget_at(100.0, 200.0, Some(1.5));

        let moved = transform(&original, &bbox, &bbox);
        assert_eq!(moved.location, original.location);
        assert_eq!(moved.scale, Some(1.5));
    }

    #[test]
    fn missing_scale_defaults_to_one() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(0.0, 0.0, 300.0, 100.0);
        assert_eq!(transform(&widget_at(0.0, 0.0, None), &a, &b).scale, Some(3.0));
    }

    #[test]
    fn original_is_untouched() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(50.0, 50.0, 100.0, 100.0);
        let original = widget_at(10.0, 10.0, None);
        let _ = transform(&original, &a, &b);
        assert_eq!(original.location, Some(Point { x: 10.0, y: 10.0 }));
        assert_eq!(original.scale, None);
    }

    #[test]
    fn connectors_pass_through() {
        let mut c = Widget::new(WidgetType::Connector);
        c.src = Some(Endpoint::new("a"));
        c.dst = Some(Endpoint::new("b"));
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(0.0, 0.0, 200.0, 100.0);
        assert_eq!(transform(&c, &a, &b), c);
    }
}
