//! One node of the layout tree: style, layout output, children, flags, and
//! callback slots.
//!
//! Style-derived lookups (leading/trailing margin, padding, border,
//! position, flex factor resolution) live here as node methods; anything
//! that needs to walk the tree lives on [`LayoutTree`](crate::tree::LayoutTree).

use std::cell::RefCell;
use std::rc::Rc;

use crate::enums::{Direction, Edge, FlexDirection, MeasureMode, NodeType, PositionType, Unit};
use crate::math;
use crate::style::{self, Style};
use crate::layout::LayoutResults;
use crate::tree::{ConfigId, NodeId};
use crate::value::{self, Value};

// =============================================================================
// CALLBACK CAPABILITIES
// =============================================================================

/// Size returned by a measure callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Content measurement for leaf nodes. Invoked with the available space and
/// the constraint mode per axis; must return a defined size.
pub trait MeasureFunc {
    fn measure(
        &mut self,
        node: NodeId,
        width: f32,
        width_mode: MeasureMode,
        height: f32,
        height_mode: MeasureMode,
    ) -> Size;
}

impl<F> MeasureFunc for F
where
    F: FnMut(NodeId, f32, MeasureMode, f32, MeasureMode) -> Size,
{
    fn measure(
        &mut self,
        node: NodeId,
        width: f32,
        width_mode: MeasureMode,
        height: f32,
        height_mode: MeasureMode,
    ) -> Size {
        self(node, width, width_mode, height, height_mode)
    }
}

/// Baseline offset of a node's content, measured from its top edge.
pub trait BaselineFunc {
    fn baseline(&mut self, node: NodeId, width: f32, height: f32) -> f32;
}

impl<F> BaselineFunc for F
where
    F: FnMut(NodeId, f32, f32) -> f32,
{
    fn baseline(&mut self, node: NodeId, width: f32, height: f32) -> f32 {
        self(node, width, height)
    }
}

/// Notification fired when a clean node becomes dirty.
pub trait DirtiedFunc {
    fn dirtied(&mut self, node: NodeId);
}

impl<F> DirtiedFunc for F
where
    F: FnMut(NodeId),
{
    fn dirtied(&mut self, node: NodeId) {
        self(node)
    }
}

pub(crate) type MeasureSlot = Option<Rc<RefCell<dyn MeasureFunc>>>;
pub(crate) type BaselineSlot = Option<Rc<RefCell<dyn BaselineFunc>>>;
pub(crate) type DirtiedSlot = Option<Rc<RefCell<dyn DirtiedFunc>>>;

// =============================================================================
// NODE
// =============================================================================

/// A styled box in the layout tree.
#[derive(Clone)]
pub struct Node {
    pub(crate) style: Style,
    pub(crate) layout: LayoutResults,
    pub(crate) line_index: usize,
    pub(crate) owner: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) config: ConfigId,
    pub(crate) resolved_dimensions: [Value; 2],
    pub(crate) is_dirty: bool,
    pub(crate) has_new_layout: bool,
    pub(crate) node_type: NodeType,
    pub(crate) is_reference_baseline: bool,
    pub(crate) measure: MeasureSlot,
    pub(crate) baseline: BaselineSlot,
    pub(crate) dirtied: DirtiedSlot,
}

impl Node {
    pub(crate) fn new(config: ConfigId, use_web_defaults: bool) -> Node {
        Node {
            style: if use_web_defaults { Style::web_defaults() } else { Style::default() },
            layout: LayoutResults::default(),
            line_index: 0,
            owner: None,
            children: Vec::new(),
            config,
            resolved_dimensions: [value::UNDEFINED; 2],
            is_dirty: false,
            has_new_layout: true,
            node_type: NodeType::Default,
            is_reference_baseline: false,
            measure: None,
            baseline: None,
            dirtied: None,
        }
    }

    #[inline]
    pub fn style(&self) -> &Style {
        &self.style
    }

    #[inline]
    pub fn layout(&self) -> &LayoutResults {
        &self.layout
    }

    #[inline]
    pub(crate) fn has_measure_func(&self) -> bool {
        self.measure.is_some()
    }

    #[inline]
    pub(crate) fn has_baseline_func(&self) -> bool {
        self.baseline.is_some()
    }

    #[inline]
    pub(crate) fn resolved_dimension(&self, dim: crate::enums::Dimension) -> Value {
        self.resolved_dimensions[dim.index()]
    }

    // =========================================================================
    // EDGE LOOKUPS
    // =========================================================================

    pub(crate) fn leading_position(&self, axis: FlexDirection, axis_size: f32) -> f32 {
        let position = if axis.is_row() {
            style::compute_edge_value_for_row(
                &self.style.position,
                Edge::Start,
                axis.leading_edge(),
                value::ZERO,
            )
        } else {
            style::compute_edge_value_for_column(
                &self.style.position,
                axis.leading_edge(),
                value::ZERO,
            )
        };
        math::resolve_value(position, axis_size)
    }

    pub(crate) fn trailing_position(&self, axis: FlexDirection, axis_size: f32) -> f32 {
        let position = if axis.is_row() {
            style::compute_edge_value_for_row(
                &self.style.position,
                Edge::End,
                axis.trailing_edge(),
                value::ZERO,
            )
        } else {
            style::compute_edge_value_for_column(
                &self.style.position,
                axis.trailing_edge(),
                value::ZERO,
            )
        };
        math::resolve_value(position, axis_size)
    }

    pub(crate) fn is_leading_position_defined(&self, axis: FlexDirection) -> bool {
        let position = if axis.is_row() {
            style::compute_edge_value_for_row(
                &self.style.position,
                Edge::Start,
                axis.leading_edge(),
                value::UNDEFINED,
            )
        } else {
            style::compute_edge_value_for_column(
                &self.style.position,
                axis.leading_edge(),
                value::UNDEFINED,
            )
        };
        !position.is_undefined()
    }

    pub(crate) fn is_trailing_position_defined(&self, axis: FlexDirection) -> bool {
        let position = if axis.is_row() {
            style::compute_edge_value_for_row(
                &self.style.position,
                Edge::End,
                axis.trailing_edge(),
                value::UNDEFINED,
            )
        } else {
            style::compute_edge_value_for_column(
                &self.style.position,
                axis.trailing_edge(),
                value::UNDEFINED,
            )
        };
        !position.is_undefined()
    }

    pub(crate) fn leading_margin(&self, axis: FlexDirection, width_size: f32) -> f32 {
        let margin = if axis.is_row() {
            style::compute_edge_value_for_row(
                &self.style.margin,
                Edge::Start,
                axis.leading_edge(),
                value::ZERO,
            )
        } else {
            style::compute_edge_value_for_column(
                &self.style.margin,
                axis.leading_edge(),
                value::ZERO,
            )
        };
        math::resolve_value_margin(margin, width_size)
    }

    pub(crate) fn trailing_margin(&self, axis: FlexDirection, width_size: f32) -> f32 {
        let margin = if axis.is_row() {
            style::compute_edge_value_for_row(
                &self.style.margin,
                Edge::End,
                axis.trailing_edge(),
                value::ZERO,
            )
        } else {
            style::compute_edge_value_for_column(
                &self.style.margin,
                axis.trailing_edge(),
                value::ZERO,
            )
        };
        math::resolve_value_margin(margin, width_size)
    }

    pub(crate) fn margin_for_axis(&self, axis: FlexDirection, width_size: f32) -> f32 {
        self.leading_margin(axis, width_size) + self.trailing_margin(axis, width_size)
    }

    /// Gap between children along `axis`; the column gutter applies to row
    /// containers and vice versa.
    pub(crate) fn gap_for_axis(&self, axis: FlexDirection, width_size: f32) -> f32 {
        let gap = if axis.is_row() {
            style::compute_column_gap(&self.style.gap, value::ZERO)
        } else {
            style::compute_row_gap(&self.style.gap, value::ZERO)
        };
        math::resolve_value(gap, width_size)
    }

    pub(crate) fn leading_border(&self, axis: FlexDirection) -> f32 {
        let border = if axis.is_row() {
            style::compute_edge_value_for_row(
                &self.style.border,
                Edge::Start,
                axis.leading_edge(),
                value::ZERO,
            )
        } else {
            style::compute_edge_value_for_column(
                &self.style.border,
                axis.leading_edge(),
                value::ZERO,
            )
        };
        border.value.max(0.0)
    }

    pub(crate) fn trailing_border(&self, axis: FlexDirection) -> f32 {
        let border = if axis.is_row() {
            style::compute_edge_value_for_row(
                &self.style.border,
                Edge::End,
                axis.trailing_edge(),
                value::ZERO,
            )
        } else {
            style::compute_edge_value_for_column(
                &self.style.border,
                axis.trailing_edge(),
                value::ZERO,
            )
        };
        border.value.max(0.0)
    }

    pub(crate) fn leading_padding(&self, axis: FlexDirection, width_size: f32) -> f32 {
        let padding = if axis.is_row() {
            style::compute_edge_value_for_row(
                &self.style.padding,
                Edge::Start,
                axis.leading_edge(),
                value::ZERO,
            )
        } else {
            style::compute_edge_value_for_column(
                &self.style.padding,
                axis.leading_edge(),
                value::ZERO,
            )
        };
        math::float_max(math::resolve_value(padding, width_size), 0.0)
    }

    pub(crate) fn trailing_padding(&self, axis: FlexDirection, width_size: f32) -> f32 {
        let padding = if axis.is_row() {
            style::compute_edge_value_for_row(
                &self.style.padding,
                Edge::End,
                axis.trailing_edge(),
                value::ZERO,
            )
        } else {
            style::compute_edge_value_for_column(
                &self.style.padding,
                axis.trailing_edge(),
                value::ZERO,
            )
        };
        math::float_max(math::resolve_value(padding, width_size), 0.0)
    }

    pub(crate) fn leading_padding_and_border(&self, axis: FlexDirection, width_size: f32) -> f32 {
        self.leading_padding(axis, width_size) + self.leading_border(axis)
    }

    pub(crate) fn trailing_padding_and_border(&self, axis: FlexDirection, width_size: f32) -> f32 {
        self.trailing_padding(axis, width_size) + self.trailing_border(axis)
    }

    /// Raw leading margin value on `axis`, for auto-margin detection.
    pub(crate) fn margin_leading_value(&self, axis: FlexDirection) -> Value {
        if axis.is_row() && !self.style.margin[Edge::Start as usize].is_undefined() {
            self.style.margin[Edge::Start as usize]
        } else {
            self.style.margin[axis.leading_edge() as usize]
        }
    }

    /// Raw trailing margin value on `axis`, for auto-margin detection.
    pub(crate) fn margin_trailing_value(&self, axis: FlexDirection) -> Value {
        if axis.is_row() && !self.style.margin[Edge::End as usize].is_undefined() {
            self.style.margin[Edge::End as usize]
        } else {
            self.style.margin[axis.trailing_edge() as usize]
        }
    }

    // =========================================================================
    // FLEX RESOLUTION
    // =========================================================================

    /// The flex basis to use: explicit basis wins; `flex > 0` implies a
    /// zero basis (auto under web defaults); otherwise auto.
    pub(crate) fn resolve_flex_basis(&self, use_web_defaults: bool) -> Value {
        let flex_basis = self.style.flex_basis;
        if flex_basis.unit != Unit::Auto && flex_basis.unit != Unit::Undefined {
            return flex_basis;
        }
        if math::is_defined(self.style.flex) && self.style.flex > 0.0 {
            return if use_web_defaults { value::AUTO } else { value::ZERO };
        }
        value::AUTO
    }

    pub(crate) fn resolve_flex_grow(&self) -> f32 {
        // Root nodes never grow.
        if self.owner.is_none() {
            return 0.0;
        }
        if math::is_defined(self.style.flex_grow) {
            return self.style.flex_grow;
        }
        if math::is_defined(self.style.flex) && self.style.flex > 0.0 {
            return self.style.flex;
        }
        style::DEFAULT_FLEX_GROW
    }

    pub(crate) fn resolve_flex_shrink(&self, use_web_defaults: bool) -> f32 {
        if self.owner.is_none() {
            return 0.0;
        }
        if math::is_defined(self.style.flex_shrink) {
            return self.style.flex_shrink;
        }
        if !use_web_defaults && math::is_defined(self.style.flex) && self.style.flex < 0.0 {
            return -self.style.flex;
        }
        if use_web_defaults {
            style::WEB_DEFAULT_FLEX_SHRINK
        } else {
            style::DEFAULT_FLEX_SHRINK
        }
    }

    /// Aspect ratio when it can drive sizing. Zero and negative ratios act
    /// as unset.
    pub(crate) fn aspect_ratio(&self) -> f32 {
        let ratio = self.style.aspect_ratio;
        if math::is_defined(ratio) && ratio > 0.0 { ratio } else { math::UNDEFINED }
    }

    pub(crate) fn is_flexible(&self, use_web_defaults: bool) -> bool {
        self.style.position_type != PositionType::Absolute
            && (self.resolve_flex_grow() != 0.0 || self.resolve_flex_shrink(use_web_defaults) != 0.0)
    }

    /// Fold max==min into a single resolved dimension per axis.
    pub(crate) fn resolve_dimensions(&mut self) {
        for dim in 0..2 {
            if !self.style.max_dimensions[dim].is_undefined()
                && self.style.max_dimensions[dim] == self.style.min_dimensions[dim]
            {
                self.resolved_dimensions[dim] = self.style.max_dimensions[dim];
            } else {
                self.resolved_dimensions[dim] = self.style.dimensions[dim];
            }
        }
    }

    pub(crate) fn resolve_direction(&self, owner_direction: Direction) -> Direction {
        if self.style.direction == Direction::Inherit {
            if owner_direction == Direction::Inherit {
                Direction::Ltr
            } else {
                owner_direction
            }
        } else {
            self.style.direction
        }
    }

    /// Whether the resolved style dimension on `axis` pins the size:
    /// auto/undefined never do, and negative points or percentages (or a
    /// percentage against an undefined owner) do not either.
    pub(crate) fn is_style_dim_defined(&self, axis: FlexDirection, owner_size: f32) -> bool {
        let resolved = self.resolved_dimension(axis.dimension());
        !(resolved.unit == Unit::Auto
            || resolved.unit == Unit::Undefined
            || (resolved.unit == Unit::Point
                && math::is_defined(resolved.value)
                && resolved.value < 0.0)
            || (resolved.unit == Unit::Percent
                && math::is_defined(resolved.value)
                && (resolved.value < 0.0 || math::is_undefined(owner_size))))
    }

    pub(crate) fn is_layout_dim_defined(&self, axis: FlexDirection) -> bool {
        math::is_defined(self.layout.measured_dimensions[axis.dimension().index()])
    }

    // =========================================================================
    // POSITIONING
    // =========================================================================

    /// Inset along `axis`: leading offset wins when defined, else the
    /// negated trailing offset, else undefined.
    pub(crate) fn relative_position(&self, axis: FlexDirection, axis_size: f32) -> f32 {
        if self.is_leading_position_defined(axis) {
            return self.leading_position(axis, axis_size);
        }
        let trailing = self.trailing_position(axis, axis_size);
        if math::is_defined(trailing) { -trailing } else { trailing }
    }

    /// Write relative-position offsets plus margins into the layout for
    /// both axes. Root nodes are positioned as LTR so offsets stay
    /// non-negative.
    pub(crate) fn set_position(
        &mut self,
        direction: Direction,
        main_size: f32,
        cross_size: f32,
        owner_width: f32,
    ) {
        let direction_respecting_root =
            if self.owner.is_some() { direction } else { Direction::Ltr };
        let main_axis = self.style.flex_direction.resolve(direction_respecting_root);
        let cross_axis = main_axis.cross(direction_respecting_root);

        let relative_position_main = self.relative_position(main_axis, main_size);
        let relative_position_cross = self.relative_position(cross_axis, cross_size);

        let main_leading = main_axis.leading_edge().physical_index();
        let main_trailing = main_axis.trailing_edge().physical_index();
        let cross_leading = cross_axis.leading_edge().physical_index();
        let cross_trailing = cross_axis.trailing_edge().physical_index();

        self.layout.position[main_leading] =
            math::sanitize(self.leading_margin(main_axis, owner_width) + relative_position_main);
        self.layout.position[main_trailing] =
            math::sanitize(self.trailing_margin(main_axis, owner_width) + relative_position_main);
        self.layout.position[cross_leading] =
            math::sanitize(self.leading_margin(cross_axis, owner_width) + relative_position_cross);
        self.layout.position[cross_trailing] =
            math::sanitize(self.trailing_margin(cross_axis, owner_width) + relative_position_cross);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Dimension;
    use crate::tree::{ConfigId, NodeId};

    fn setup() -> Node {
        Node::new(ConfigId::from_raw(0), false)
    }

    #[test]
    fn root_never_flexes() {
        let mut node = setup();
        node.style.flex_grow = 1.0;
        node.style.flex_shrink = 1.0;
        assert_eq!(node.resolve_flex_grow(), 0.0);
        assert_eq!(node.resolve_flex_shrink(false), 0.0);

        node.owner = Some(NodeId::from_raw(7));
        assert_eq!(node.resolve_flex_grow(), 1.0);
        assert_eq!(node.resolve_flex_shrink(false), 1.0);
    }

    #[test]
    fn flex_shorthand_drives_grow_and_shrink() {
        let mut node = setup();
        node.owner = Some(NodeId::from_raw(7));
        node.style.flex = 2.0;
        assert_eq!(node.resolve_flex_grow(), 2.0);
        assert_eq!(node.resolve_flex_shrink(false), 0.0);

        node.style.flex = -3.0;
        assert_eq!(node.resolve_flex_grow(), 0.0);
        assert_eq!(node.resolve_flex_shrink(false), 3.0);

        // Web defaults: negative flex does not shrink, but the default does.
        assert_eq!(node.resolve_flex_shrink(true), 1.0);
    }

    #[test]
    fn flex_basis_resolution() {
        let mut node = setup();
        node.style.flex_basis = Value::points(10.0);
        assert_eq!(node.resolve_flex_basis(false), Value::points(10.0));

        node.style.flex_basis = value::AUTO;
        node.style.flex = 1.0;
        assert_eq!(node.resolve_flex_basis(false), value::ZERO);
        assert_eq!(node.resolve_flex_basis(true), value::AUTO);

        node.style.flex = math::UNDEFINED;
        assert_eq!(node.resolve_flex_basis(false), value::AUTO);
    }

    #[test]
    fn max_min_folding() {
        let mut node = setup();
        node.style.dimensions[Dimension::Width.index()] = Value::points(50.0);
        node.style.min_dimensions[Dimension::Width.index()] = Value::points(80.0);
        node.style.max_dimensions[Dimension::Width.index()] = Value::points(80.0);
        node.resolve_dimensions();
        assert_eq!(node.resolved_dimension(Dimension::Width), Value::points(80.0));
        assert_eq!(node.resolved_dimension(Dimension::Height), value::AUTO);
    }

    #[test]
    fn style_dim_defined_rules() {
        let mut node = setup();
        node.resolve_dimensions();
        assert!(!node.is_style_dim_defined(FlexDirection::Row, 100.0));

        node.style.dimensions[0] = Value::points(-5.0);
        node.resolve_dimensions();
        assert!(!node.is_style_dim_defined(FlexDirection::Row, 100.0));

        node.style.dimensions[0] = Value::percent(50.0);
        node.resolve_dimensions();
        assert!(node.is_style_dim_defined(FlexDirection::Row, 100.0));
        assert!(!node.is_style_dim_defined(FlexDirection::Row, math::UNDEFINED));

        node.style.dimensions[0] = Value::points(5.0);
        node.resolve_dimensions();
        assert!(node.is_style_dim_defined(FlexDirection::Row, math::UNDEFINED));
    }

    #[test]
    fn relative_position_prefers_leading() {
        let mut node = setup();
        node.style.position[Edge::Left as usize] = Value::points(10.0);
        node.style.position[Edge::Right as usize] = Value::points(4.0);
        assert_eq!(node.relative_position(FlexDirection::Row, 100.0), 10.0);

        node.style.position[Edge::Left as usize] = value::UNDEFINED;
        assert_eq!(node.relative_position(FlexDirection::Row, 100.0), -4.0);
    }

    #[test]
    fn direction_resolution() {
        let mut node = setup();
        assert_eq!(node.resolve_direction(Direction::Rtl), Direction::Rtl);
        assert_eq!(node.resolve_direction(Direction::Inherit), Direction::Ltr);
        node.style.direction = Direction::Ltr;
        assert_eq!(node.resolve_direction(Direction::Rtl), Direction::Ltr);
    }
}
