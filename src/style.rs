//! Per-node style storage and edge-resolution rules.
//!
//! Edge properties (margin, padding, border, position) are stored in a
//! 9-slot array covering the four physical edges, the direction-aware
//! logical edges (start/end), and the horizontal/vertical/all shorthands.
//! Resolution walks a fixed fallback chain from most to least specific.

use crate::enums::{
    Align, Direction, Display, Edge, FlexDirection, Gutter, Justify, Overflow, PositionType, Wrap,
};
use crate::math;
use crate::value::{self, Value};

/// Flex grow applied when neither `flex-grow` nor a positive `flex` is set.
pub const DEFAULT_FLEX_GROW: f32 = 0.0;
/// Flex shrink applied by default.
pub const DEFAULT_FLEX_SHRINK: f32 = 0.0;
/// Flex shrink applied by default under web defaults.
pub const WEB_DEFAULT_FLEX_SHRINK: f32 = 1.0;

/// 9-slot edge array indexed by [`Edge`].
pub type Edges = [Value; 9];
/// 3-slot gutter array indexed by [`Gutter`].
pub type Gutters = [Value; 3];
/// Width/height pair indexed by [`Dimension`](crate::enums::Dimension).
pub type Dimensions = [Value; 2];

// =============================================================================
// STYLE
// =============================================================================

/// Resolved style of one node. Immutable during a layout pass.
#[derive(Debug, Clone)]
pub struct Style {
    pub direction: Direction,
    pub flex_direction: FlexDirection,
    pub justify_content: Justify,
    pub align_content: Align,
    pub align_items: Align,
    pub align_self: Align,
    pub position_type: PositionType,
    pub flex_wrap: Wrap,
    pub overflow: Overflow,
    pub display: Display,
    pub flex: f32,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Value,
    pub margin: Edges,
    pub position: Edges,
    pub padding: Edges,
    pub border: Edges,
    pub gap: Gutters,
    pub dimensions: Dimensions,
    pub min_dimensions: Dimensions,
    pub max_dimensions: Dimensions,
    pub aspect_ratio: f32,
}

impl Default for Style {
    fn default() -> Style {
        Style {
            direction: Direction::Inherit,
            flex_direction: FlexDirection::Column,
            justify_content: Justify::FlexStart,
            align_content: Align::FlexStart,
            align_items: Align::Stretch,
            align_self: Align::Auto,
            position_type: PositionType::Relative,
            flex_wrap: Wrap::NoWrap,
            overflow: Overflow::Visible,
            display: Display::Flex,
            flex: math::UNDEFINED,
            flex_grow: math::UNDEFINED,
            flex_shrink: math::UNDEFINED,
            flex_basis: value::AUTO,
            margin: [value::UNDEFINED; 9],
            position: [value::UNDEFINED; 9],
            padding: [value::UNDEFINED; 9],
            border: [value::UNDEFINED; 9],
            gap: [value::UNDEFINED; 3],
            dimensions: [value::AUTO; 2],
            min_dimensions: [value::UNDEFINED; 2],
            max_dimensions: [value::UNDEFINED; 2],
            aspect_ratio: math::UNDEFINED,
        }
    }
}

impl Style {
    /// Style consistent with flexbox on the web rather than the engine's
    /// own defaults.
    pub fn web_defaults() -> Style {
        Style {
            flex_direction: FlexDirection::Row,
            align_content: Align::Stretch,
            ..Style::default()
        }
    }
}

/// Value-level equality with the layout tolerance on all float fields.
/// Drives the "only dirty when the style actually changed" setter contract.
impl PartialEq for Style {
    fn eq(&self, other: &Style) -> bool {
        self.direction == other.direction
            && self.flex_direction == other.flex_direction
            && self.justify_content == other.justify_content
            && self.align_content == other.align_content
            && self.align_items == other.align_items
            && self.align_self == other.align_self
            && self.position_type == other.position_type
            && self.flex_wrap == other.flex_wrap
            && self.overflow == other.overflow
            && self.display == other.display
            && math::floats_equal(self.flex, other.flex)
            && math::floats_equal(self.flex_grow, other.flex_grow)
            && math::floats_equal(self.flex_shrink, other.flex_shrink)
            && self.flex_basis == other.flex_basis
            && self.margin == other.margin
            && self.position == other.position
            && self.padding == other.padding
            && self.border == other.border
            && self.gap == other.gap
            && self.dimensions == other.dimensions
            && self.min_dimensions == other.min_dimensions
            && self.max_dimensions == other.max_dimensions
            && math::floats_equal(self.aspect_ratio, other.aspect_ratio)
    }
}

// =============================================================================
// EDGE RESOLUTION
// =============================================================================

/// Resolve a left/right edge: logical start/end wins, then the literal
/// edge, then the horizontal shorthand, then `all`, then the default.
pub fn compute_edge_value_for_row(
    edges: &Edges,
    row_edge: Edge,
    edge: Edge,
    default_value: Value,
) -> Value {
    if !edges[row_edge as usize].is_undefined() {
        edges[row_edge as usize]
    } else if !edges[edge as usize].is_undefined() {
        edges[edge as usize]
    } else if !edges[Edge::Horizontal as usize].is_undefined() {
        edges[Edge::Horizontal as usize]
    } else if !edges[Edge::All as usize].is_undefined() {
        edges[Edge::All as usize]
    } else {
        default_value
    }
}

/// Resolve a top/bottom edge: literal edge, then the vertical shorthand,
/// then `all`, then the default.
pub fn compute_edge_value_for_column(edges: &Edges, edge: Edge, default_value: Value) -> Value {
    if !edges[edge as usize].is_undefined() {
        edges[edge as usize]
    } else if !edges[Edge::Vertical as usize].is_undefined() {
        edges[Edge::Vertical as usize]
    } else if !edges[Edge::All as usize].is_undefined() {
        edges[Edge::All as usize]
    } else {
        default_value
    }
}

/// Row gap falls back from the row gutter to `all`.
pub fn compute_row_gap(gutters: &Gutters, default_value: Value) -> Value {
    if !gutters[Gutter::Row as usize].is_undefined() {
        gutters[Gutter::Row as usize]
    } else if !gutters[Gutter::All as usize].is_undefined() {
        gutters[Gutter::All as usize]
    } else {
        default_value
    }
}

/// Column gap falls back from the column gutter to `all`.
pub fn compute_column_gap(gutters: &Gutters, default_value: Value) -> Value {
    if !gutters[Gutter::Column as usize].is_undefined() {
        gutters[Gutter::Column as usize]
    } else if !gutters[Gutter::All as usize].is_undefined() {
        gutters[Gutter::All as usize]
    } else {
        default_value
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_fallback_order_for_row() {
        let mut edges: Edges = [value::UNDEFINED; 9];
        edges[Edge::All as usize] = Value::points(1.0);
        assert_eq!(
            compute_edge_value_for_row(&edges, Edge::Start, Edge::Left, value::ZERO),
            Value::points(1.0)
        );

        edges[Edge::Horizontal as usize] = Value::points(2.0);
        assert_eq!(
            compute_edge_value_for_row(&edges, Edge::Start, Edge::Left, value::ZERO),
            Value::points(2.0)
        );

        edges[Edge::Left as usize] = Value::points(3.0);
        assert_eq!(
            compute_edge_value_for_row(&edges, Edge::Start, Edge::Left, value::ZERO),
            Value::points(3.0)
        );

        edges[Edge::Start as usize] = Value::points(4.0);
        assert_eq!(
            compute_edge_value_for_row(&edges, Edge::Start, Edge::Left, value::ZERO),
            Value::points(4.0)
        );
    }

    #[test]
    fn edge_fallback_order_for_column() {
        let mut edges: Edges = [value::UNDEFINED; 9];
        assert_eq!(
            compute_edge_value_for_column(&edges, Edge::Top, value::ZERO),
            value::ZERO
        );

        edges[Edge::All as usize] = Value::points(1.0);
        edges[Edge::Vertical as usize] = Value::points(2.0);
        assert_eq!(
            compute_edge_value_for_column(&edges, Edge::Top, value::ZERO),
            Value::points(2.0)
        );

        edges[Edge::Top as usize] = Value::points(3.0);
        assert_eq!(
            compute_edge_value_for_column(&edges, Edge::Top, value::ZERO),
            Value::points(3.0)
        );
    }

    #[test]
    fn gap_fallback() {
        let mut gap: Gutters = [value::UNDEFINED; 3];
        assert_eq!(compute_row_gap(&gap, value::ZERO), value::ZERO);
        gap[Gutter::All as usize] = Value::points(4.0);
        assert_eq!(compute_row_gap(&gap, value::ZERO), Value::points(4.0));
        assert_eq!(compute_column_gap(&gap, value::ZERO), Value::points(4.0));
        gap[Gutter::Row as usize] = Value::points(6.0);
        assert_eq!(compute_row_gap(&gap, value::ZERO), Value::points(6.0));
        assert_eq!(compute_column_gap(&gap, value::ZERO), Value::points(4.0));
    }

    #[test]
    fn web_defaults_differ() {
        let d = Style::default();
        let w = Style::web_defaults();
        assert_eq!(d.flex_direction, FlexDirection::Column);
        assert_eq!(w.flex_direction, FlexDirection::Row);
        assert_eq!(w.align_content, Align::Stretch);
        assert_ne!(d, w);
    }

    #[test]
    fn style_equality_tolerates_noise() {
        let mut a = Style::default();
        let mut b = Style::default();
        assert_eq!(a, b);
        a.flex_grow = 1.0;
        b.flex_grow = 1.0 + 0.00001;
        assert_eq!(a, b);
        b.flex_grow = 1.1;
        assert_ne!(a, b);
    }
}
