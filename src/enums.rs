//! Style and layout enums, plus axis lookup helpers.
//!
//! The flex algorithm works on a "main" and a "cross" axis derived from the
//! flex direction and the resolved layout direction. The helpers here map an
//! axis to its leading/trailing physical edges and to its dimension.

// =============================================================================
// STYLE ENUMS
// =============================================================================

/// Layout direction of a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Inherit,
    Ltr,
    Rtl,
}

/// Main-axis orientation of a flex container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    #[default]
    Column,
    ColumnReverse,
    Row,
    RowReverse,
}

/// Main-axis distribution of free space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    FlexStart,
    Center,
    FlexEnd,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

/// Cross-axis alignment for items, self, and content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Auto,
    FlexStart,
    Center,
    FlexEnd,
    Stretch,
    Baseline,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

/// Positioning scheme of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionType {
    Static,
    #[default]
    Relative,
    Absolute,
}

/// Line wrapping behavior of a flex container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    #[default]
    NoWrap,
    Wrap,
    WrapReverse,
}

/// How content exceeding the node's bounds is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
}

/// Whether a node takes part in layout at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Flex,
    None,
}

/// Unit of a style length value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    Undefined,
    Point,
    Percent,
    Auto,
}

// =============================================================================
// LAYOUT ENUMS
// =============================================================================

/// Sizing constraint passed down during measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureMode {
    Undefined,
    Exactly,
    AtMost,
}

/// Node content kind; text nodes get asymmetric pixel rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeType {
    #[default]
    Default,
    Text,
}

/// Physical and logical edges of a box. The first four index layout output
/// arrays; the logical and shorthand edges only appear in style storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Top,
    Right,
    Bottom,
    Start,
    End,
    Horizontal,
    Vertical,
    All,
}

/// Axis dimension index (width/height).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Width,
    Height,
}

/// Gap gutter selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gutter {
    Column,
    Row,
    All,
}

/// Severity of a diagnostic routed through the config logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Verbose,
    Fatal,
}

// =============================================================================
// AXIS HELPERS
// =============================================================================

impl FlexDirection {
    #[inline]
    pub fn is_row(self) -> bool {
        matches!(self, FlexDirection::Row | FlexDirection::RowReverse)
    }

    #[inline]
    pub fn is_column(self) -> bool {
        matches!(self, FlexDirection::Column | FlexDirection::ColumnReverse)
    }

    /// Apply the resolved layout direction: RTL flips row orientations.
    pub fn resolve(self, direction: Direction) -> FlexDirection {
        if direction == Direction::Rtl {
            match self {
                FlexDirection::Row => FlexDirection::RowReverse,
                FlexDirection::RowReverse => FlexDirection::Row,
                other => other,
            }
        } else {
            self
        }
    }

    /// The axis perpendicular to this one, direction-resolved.
    pub fn cross(self, direction: Direction) -> FlexDirection {
        if self.is_column() {
            FlexDirection::Row.resolve(direction)
        } else {
            FlexDirection::Column
        }
    }

    /// Physical edge where this axis starts.
    pub fn leading_edge(self) -> Edge {
        match self {
            FlexDirection::Column => Edge::Top,
            FlexDirection::ColumnReverse => Edge::Bottom,
            FlexDirection::Row => Edge::Left,
            FlexDirection::RowReverse => Edge::Right,
        }
    }

    /// Physical edge where this axis ends.
    pub fn trailing_edge(self) -> Edge {
        match self {
            FlexDirection::Column => Edge::Bottom,
            FlexDirection::ColumnReverse => Edge::Top,
            FlexDirection::Row => Edge::Right,
            FlexDirection::RowReverse => Edge::Left,
        }
    }

    /// Dimension measured along this axis.
    #[inline]
    pub fn dimension(self) -> Dimension {
        if self.is_row() { Dimension::Width } else { Dimension::Height }
    }
}

impl Edge {
    /// Index into the 4-slot physical layout arrays. Only valid for the
    /// four physical edges.
    #[inline]
    pub fn physical_index(self) -> usize {
        debug_assert!((self as usize) < 4, "not a physical edge");
        self as usize
    }
}

impl Dimension {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtl_flips_row_axes() {
        assert_eq!(FlexDirection::Row.resolve(Direction::Rtl), FlexDirection::RowReverse);
        assert_eq!(FlexDirection::RowReverse.resolve(Direction::Rtl), FlexDirection::Row);
        assert_eq!(FlexDirection::Column.resolve(Direction::Rtl), FlexDirection::Column);
        assert_eq!(FlexDirection::Row.resolve(Direction::Ltr), FlexDirection::Row);
    }

    #[test]
    fn cross_axis() {
        assert_eq!(FlexDirection::Row.cross(Direction::Ltr), FlexDirection::Column);
        assert_eq!(FlexDirection::Column.cross(Direction::Ltr), FlexDirection::Row);
        assert_eq!(FlexDirection::Column.cross(Direction::Rtl), FlexDirection::RowReverse);
    }

    #[test]
    fn edges_per_axis() {
        assert_eq!(FlexDirection::Row.leading_edge(), Edge::Left);
        assert_eq!(FlexDirection::RowReverse.leading_edge(), Edge::Right);
        assert_eq!(FlexDirection::ColumnReverse.trailing_edge(), Edge::Top);
        assert_eq!(FlexDirection::Row.dimension(), Dimension::Width);
        assert_eq!(FlexDirection::ColumnReverse.dimension(), Dimension::Height);
    }
}
