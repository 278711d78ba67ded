//! Layout macro algorithms (auto-grid, group by color, group by title).
//!
//! These functions only compute new positions and scales. Applying the
//! resulting [`Placement`]s to the remote canvas is the pipeline's job.
//!
//! Canonical policies:
//!
//! - Auto-grid picks the row count whose `cols / rows` ratio is closest to
//!   the zone's aspect ratio (`cols = ceil(n / rows)`), fills cells row-major
//!   and floors the per-widget scale at [`MIN_SCALE`].
//! - Grouping macros split the zone width evenly into one column per group
//!   and apply one uniform scale to every widget so that all columns fit.

use std::cmp::Ordering;

use crate::color::{tolerance_threshold, Rgb};
use crate::geometry::BoundingBox;
use crate::types::WidgetId;
use crate::widget::{Point, Widget};

/// Space reserved between grid cells.
pub const GRID_BUFFER: f64 = 50.0;

/// Horizontal padding inside each group column.
pub const COLUMN_PADDING: f64 = 50.0;

/// Vertical gap between stacked widgets in a group column.
pub const COLUMN_GAP: f64 = 20.0;

/// Smallest scale a layout macro will assign.
pub const MIN_SCALE: f64 = 0.1;

/// New position and scale for one widget.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub widget_id: WidgetId,
    pub location: Point,
    pub scale: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct GridSettings {
    pub buffer: f64,
    pub min_scale: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            buffer: GRID_BUFFER,
            min_scale: MIN_SCALE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSettings {
    pub padding: f64,
    pub gap: f64,
    pub min_scale: f64,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        Self {
            padding: COLUMN_PADDING,
            gap: COLUMN_GAP,
            min_scale: MIN_SCALE,
        }
    }
}

// ---------------------------------------------------------------------------
// Auto-grid
// ---------------------------------------------------------------------------

/// `(rows, cols)` for `count` items in a frame of the given aspect ratio.
///
/// Searches `rows` in `1..=count`; the first best match wins ties.
pub fn grid_dimensions(count: usize, aspect_ratio: f64) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }

    let mut best = (1, count);
    let mut best_diff = f64::INFINITY;
    for rows in 1..=count {
        let cols = count.div_ceil(rows);
        let diff = (aspect_ratio - cols as f64 / rows as f64).abs();
        if diff < best_diff {
            best_diff = diff;
            best = (rows, cols);
        }
    }
    best
}

/// Arrange widgets in a grid filling the zone.
pub fn auto_grid(widgets: &[Widget], bbox: &BoundingBox, settings: &GridSettings) -> Vec<Placement> {
    let items: Vec<&Widget> = widgets.iter().filter(|w| w.id.is_some()).collect();
    let (rows, cols) = grid_dimensions(items.len(), bbox.aspect_ratio());
    if rows == 0 {
        return Vec::new();
    }

    let cell_width = bbox.width / cols as f64;
    let cell_height = bbox.height / rows as f64;
    let usable_width = (cell_width - settings.buffer).max(0.0);
    let usable_height = (cell_height - settings.buffer).max(0.0);
    let inset = settings.buffer / 2.0;

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, widget)| {
            let size = widget.effective_size();
            let scale = (usable_height / size.height)
                .min(usable_width / size.width)
                .max(settings.min_scale);
            let (row, col) = (index / cols, index % cols);
            Some(Placement {
                widget_id: widget.id.clone()?,
                location: Point {
                    x: bbox.x + col as f64 * cell_width + inset,
                    y: bbox.y + row as f64 * cell_height + inset,
                },
                scale,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Cluster widgets by background color.
///
/// Each widget joins the first cluster whose first member is within
/// `255 * tolerance / 100` RGB distance, otherwise it starts a new cluster.
/// Widgets without a parsable color form one trailing cluster.
pub fn group_by_color(widgets: &[Widget], tolerance_percent: f64) -> Vec<Vec<&Widget>> {
    let threshold = tolerance_threshold(tolerance_percent);
    let mut clusters: Vec<(Rgb, Vec<&Widget>)> = Vec::new();
    let mut uncolored: Vec<&Widget> = Vec::new();

    for widget in widgets {
        let Some(color) = widget.background_color.as_deref().and_then(Rgb::parse_hex) else {
            uncolored.push(widget);
            continue;
        };
        match clusters
            .iter()
            .position(|(first, _)| first.distance(&color) <= threshold)
        {
            Some(index) => clusters[index].1.push(widget),
            None => clusters.push((color, vec![widget])),
        }
    }

    let mut groups: Vec<Vec<&Widget>> = clusters.into_iter().map(|(_, m)| m).collect();
    if !uncolored.is_empty() {
        groups.push(uncolored);
    }
    groups
}

/// Sort widgets by title and split them into runs of equal titles.
pub fn group_by_title(widgets: &[Widget]) -> Vec<Vec<&Widget>> {
    let mut sorted: Vec<&Widget> = widgets.iter().collect();
    sorted.sort_by(|a, b| compare_titles(title_of(a), title_of(b)));

    let mut groups: Vec<Vec<&Widget>> = Vec::new();
    for widget in sorted {
        let same_run = groups.last().is_some_and(|run| {
            compare_titles(title_of(run[0]), title_of(widget)) == Ordering::Equal
        });
        match groups.last_mut() {
            Some(run) if same_run => run.push(widget),
            _ => groups.push(vec![widget]),
        }
    }
    groups
}

fn title_of(widget: &Widget) -> &str {
    widget.title.as_deref().unwrap_or("")
}

/// Case-insensitive natural ordering: runs of digits compare by value.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        let (l, r) = match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => (l, r),
        };

        if l.is_ascii_digit() && r.is_ascii_digit() {
            let ln = take_digits(&mut left);
            let rn = take_digits(&mut right);
            let ord = compare_numeric(&ln, &rn);
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            if l != r {
                return l.cmp(&r);
            }
            left.next();
            right.next();
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// Lay groups out as equal-width columns across the zone.
///
/// Every widget receives the same scale: the largest that lets the widest
/// widget fit its column and the tallest column fit the zone height.
pub fn layout_columns(
    groups: &[Vec<&Widget>],
    bbox: &BoundingBox,
    settings: &ColumnSettings,
) -> Vec<Placement> {
    let groups: Vec<Vec<&Widget>> = groups
        .iter()
        .map(|g| g.iter().copied().filter(|w| w.id.is_some()).collect::<Vec<_>>())
        .filter(|g| !g.is_empty())
        .collect();
    if groups.is_empty() {
        return Vec::new();
    }

    let column_width = bbox.width / groups.len() as f64;
    let usable_width = (column_width - settings.padding).max(0.0);

    let widest = groups
        .iter()
        .flatten()
        .map(|w| w.effective_size().width)
        .fold(0.0_f64, f64::max);
    let mut scale = usable_width / widest;
    for group in &groups {
        let stacked: f64 = group.iter().map(|w| w.effective_size().height).sum();
        let gaps = settings.gap * (group.len() - 1) as f64;
        let usable_height = (bbox.height - settings.padding - gaps).max(0.0);
        scale = scale.min(usable_height / stacked);
    }
    let scale = scale.max(settings.min_scale);

    let inset = settings.padding / 2.0;
    let mut placements = Vec::new();
    for (column, group) in groups.iter().enumerate() {
        let x = bbox.x + column as f64 * column_width + inset;
        let mut y = bbox.y + inset;
        for widget in group {
            let Some(id) = widget.id.clone() else { continue };
            placements.push(Placement {
                widget_id: id,
                location: Point { x, y },
                scale,
            });
            y += widget.effective_size().height * scale + settings.gap;
        }
    }
    placements
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{Size, WidgetType};

    fn note(id: &str) -> Widget {
        let mut w = Widget::new(WidgetType::Note);
        w.id = Some(id.into());
        w.size = Some(Size {
            width: 300.0,
            height: 300.0,
        });
        w
    }

    fn colored(id: &str, color: &str) -> Widget {
        let mut w = note(id);
        w.background_color = Some(color.into());
        w
    }

    fn titled(id: &str, title: &str) -> Widget {
        let mut w = note(id);
        w.title = Some(title.into());
        w
    }

    fn ids<'a>(group: &[&'a Widget]) -> Vec<&'a str> {
        group.iter().filter_map(|w| w.id()).collect()
    }

    // -- Grid sizing ----------------------------------------------------------

    #[test]
    fn square_zone_prefers_square_grid() {
        assert_eq!(grid_dimensions(4, 1.0), (2, 2));
        assert_eq!(grid_dimensions(9, 1.0), (3, 3));
    }

    #[test]
    fn wide_zone_prefers_more_columns() {
        assert_eq!(grid_dimensions(6, 3.0 / 2.0), (2, 3));
        assert_eq!(grid_dimensions(3, 3.0), (1, 3));
    }

    #[test]
    fn tall_zone_prefers_more_rows() {
        assert_eq!(grid_dimensions(4, 0.25), (4, 1));
    }

    #[test]
    fn empty_grid() {
        assert_eq!(grid_dimensions(0, 1.0), (0, 0));
        assert!(auto_grid(&[], &BoundingBox::new(0.0, 0.0, 10.0, 10.0), &GridSettings::default())
            .is_empty());
    }

    #[test]
    fn grid_places_row_major_with_buffer() {
        let widgets = vec![note("a"), note("b"), note("c"), note("d")];
        let bbox = BoundingBox::new(0.0, 0.0, 1000.0, 1000.0);

        let placements = auto_grid(&widgets, &bbox, &GridSettings::default());
        let locations: Vec<(f64, f64)> = placements
            .iter()
            .map(|p| (p.location.x, p.location.y))
            .collect();
        assert_eq!(
            locations,
            vec![(25.0, 25.0), (525.0, 25.0), (25.0, 525.0), (525.0, 525.0)]
        );
        assert!(placements.iter().all(|p| p.scale == 1.5));
    }

    #[test]
    fn grid_scale_is_floored() {
        let widgets: Vec<Widget> = (0..4).map(|i| note(&format!("n{i}"))).collect();
        let bbox = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let placements = auto_grid(&widgets, &bbox, &GridSettings::default());
        assert!(placements.iter().all(|p| p.scale == MIN_SCALE));
    }

    #[test]
    fn grid_is_deterministic() {
        let widgets = vec![note("a"), note("b"), note("c")];
        let bbox = BoundingBox::new(10.0, 20.0, 900.0, 300.0);
        let settings = GridSettings::default();
        assert_eq!(
            auto_grid(&widgets, &bbox, &settings),
            auto_grid(&widgets, &bbox, &settings)
        );
    }

    // -- Color grouping -------------------------------------------------------

    #[test]
    fn identical_colors_share_a_cluster_at_zero_tolerance() {
        let widgets = vec![
            colored("w1", "#ffffffff"),
            colored("w2", "#FFFFFFFF"),
            colored("b", "#000000ff"),
        ];
        let groups = group_by_color(&widgets, 0.0);
        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups[0]), vec!["w1", "w2"]);
        assert_eq!(ids(&groups[1]), vec!["b"]);
    }

    #[test]
    fn tolerance_merges_near_colors() {
        let widgets = vec![colored("a", "#ff0000"), colored("b", "#f00a0a")];
        assert_eq!(group_by_color(&widgets, 0.0).len(), 2);
        assert_eq!(group_by_color(&widgets, 10.0).len(), 1);
    }

    #[test]
    fn comparison_uses_first_member_of_cluster() {
        // b is close to a, c is close to b but not to a.
        let widgets = vec![
            colored("a", "#000000"),
            colored("b", "#141414"),
            colored("c", "#282828"),
        ];
        let groups = group_by_color(&widgets, 15.0);
        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups[0]), vec!["a", "b"]);
        assert_eq!(ids(&groups[1]), vec!["c"]);
    }

    #[test]
    fn uncolored_widgets_trail() {
        let widgets = vec![note("plain"), colored("red", "#ff0000ff")];
        let groups = group_by_color(&widgets, 0.0);
        assert_eq!(ids(&groups[0]), vec!["red"]);
        assert_eq!(ids(&groups[1]), vec!["plain"]);
    }

    // -- Title grouping -------------------------------------------------------

    #[test]
    fn natural_order_compares_numbers_by_value() {
        assert_eq!(compare_titles("item 2", "item 10"), Ordering::Less);
        assert_eq!(compare_titles("Item 10", "item 9"), Ordering::Greater);
        assert_eq!(compare_titles("Alpha", "alpha"), Ordering::Equal);
        assert_eq!(compare_titles("a007", "a7"), Ordering::Equal);
        assert_eq!(compare_titles("", "a"), Ordering::Less);
    }

    #[test]
    fn titles_group_into_sorted_runs() {
        let widgets = vec![
            titled("1", "Task 10"),
            titled("2", "task 2"),
            titled("3", "Task 2"),
            titled("4", "Backlog"),
        ];
        let groups = group_by_title(&widgets);
        let grouped: Vec<Vec<&str>> = groups.iter().map(|g| ids(g)).collect();
        assert_eq!(grouped, vec![vec!["4"], vec!["2", "3"], vec!["1"]]);
    }

    // -- Column layout --------------------------------------------------------

    #[test]
    fn columns_split_zone_width() {
        let a = note("a");
        let b = note("b");
        let c = note("c");
        let groups = vec![vec![&a, &b], vec![&c]];
        let bbox = BoundingBox::new(0.0, 0.0, 1000.0, 1000.0);

        let placements = layout_columns(&groups, &bbox, &ColumnSettings::default());
        // Column width 500 -> width scale 450/300 = 1.5.
        // Height: (1000 - 50 - 20) / 600 = 1.55. Uniform scale is 1.5.
        assert!(placements.iter().all(|p| (p.scale - 1.5).abs() < 1e-9));
        assert_eq!(placements[0].location, Point { x: 25.0, y: 25.0 });
        assert_eq!(placements[1].location, Point { x: 25.0, y: 25.0 + 450.0 + 20.0 });
        assert_eq!(placements[2].location, Point { x: 525.0, y: 25.0 });
    }

    #[test]
    fn tall_column_limits_uniform_scale() {
        let widgets: Vec<Widget> = (0..5).map(|i| note(&format!("n{i}"))).collect();
        let groups = vec![widgets.iter().collect::<Vec<_>>()];
        let bbox = BoundingBox::new(0.0, 0.0, 1000.0, 1000.0);

        let placements = layout_columns(&groups, &bbox, &ColumnSettings::default());
        let expected = (1000.0 - 50.0 - 80.0) / 1500.0;
        assert!(placements.iter().all(|p| (p.scale - expected).abs() < 1e-9));
    }
}
