//! Sizing and positioning of absolutely positioned children.
//!
//! Runs after the container's own dimensions are final: the child is sized
//! from its style and insets, measured if needed, laid out exactly, and then
//! positioned against the container's border box.

use crate::config::ExperimentalFeatures;
use crate::enums::{Align, Direction, FlexDirection, Justify, MeasureMode, Wrap};
use crate::math;
use crate::tree::{LayoutTree, NodeId};

use super::{bound_axis, cache};

pub(super) fn absolute_layout_child(
    tree: &mut LayoutTree,
    node: NodeId,
    child: NodeId,
    width: f32,
    width_mode: MeasureMode,
    height: f32,
    direction: Direction,
) {
    let main_axis = tree.node(node).style().flex_direction.resolve(direction);
    let cross_axis = main_axis.cross(direction);
    let is_main_axis_row = main_axis.is_row();

    let mut child_width = math::UNDEFINED;
    let mut child_height = math::UNDEFINED;

    let margin_row = tree.node(child).margin_for_axis(FlexDirection::Row, width);
    let margin_column = tree.node(child).margin_for_axis(FlexDirection::Column, width);

    if tree.node(child).is_style_dim_defined(FlexDirection::Row, width) {
        child_width = math::resolve_value(
            tree.node(child).resolved_dimension(crate::enums::Dimension::Width),
            width,
        ) + margin_row;
    } else if tree.node(child).is_leading_position_defined(FlexDirection::Row)
        && tree.node(child).is_trailing_position_defined(FlexDirection::Row)
    {
        // Left and right both pin the child; the width falls out.
        child_width = tree.node(node).layout().measured_dimensions
            [crate::enums::Dimension::Width.index()]
            - (tree.node(node).leading_border(FlexDirection::Row)
                + tree.node(node).trailing_border(FlexDirection::Row))
            - (tree.node(child).leading_position(FlexDirection::Row, width)
                + tree.node(child).trailing_position(FlexDirection::Row, width));
        child_width = bound_axis(tree.node(child), FlexDirection::Row, child_width, width, width);
    }

    if tree.node(child).is_style_dim_defined(FlexDirection::Column, height) {
        child_height = math::resolve_value(
            tree.node(child).resolved_dimension(crate::enums::Dimension::Height),
            height,
        ) + margin_column;
    } else if tree.node(child).is_leading_position_defined(FlexDirection::Column)
        && tree.node(child).is_trailing_position_defined(FlexDirection::Column)
    {
        child_height = tree.node(node).layout().measured_dimensions
            [crate::enums::Dimension::Height.index()]
            - (tree.node(node).leading_border(FlexDirection::Column)
                + tree.node(node).trailing_border(FlexDirection::Column))
            - (tree.node(child).leading_position(FlexDirection::Column, height)
                + tree.node(child).trailing_position(FlexDirection::Column, height));
        child_height =
            bound_axis(tree.node(child), FlexDirection::Column, child_height, height, width);
    }

    // With exactly one dimension known, an aspect ratio supplies the other.
    if math::is_undefined(child_width) != math::is_undefined(child_height) {
        let aspect_ratio = tree.node(child).aspect_ratio();
        if math::is_defined(aspect_ratio) {
            if math::is_undefined(child_width) {
                child_width = margin_row + (child_height - margin_column) * aspect_ratio;
            } else if math::is_undefined(child_height) {
                child_height = margin_column + (child_width - margin_row) / aspect_ratio;
            }
        }
    }

    // Anything still unknown needs a content measurement.
    if math::is_undefined(child_width) || math::is_undefined(child_height) {
        let mut child_width_measure_mode = if math::is_undefined(child_width) {
            MeasureMode::Undefined
        } else {
            MeasureMode::Exactly
        };
        let mut child_height_measure_mode = if math::is_undefined(child_height) {
            MeasureMode::Undefined
        } else {
            MeasureMode::Exactly
        };

        // An absolute child inside a column container still wraps its text
        // against the container's width, matching browser behavior.
        if !is_main_axis_row
            && math::is_undefined(child_width)
            && width_mode != MeasureMode::Undefined
            && math::is_defined(width)
            && width > 0.0
        {
            child_width = width;
            child_width_measure_mode = MeasureMode::AtMost;
        }

        cache::layout_node_internal(
            tree,
            child,
            child_width,
            child_height,
            direction,
            child_width_measure_mode,
            child_height_measure_mode,
            child_width,
            child_height,
            false,
        );
        child_width = tree.node(child).layout().measured_dimensions
            [crate::enums::Dimension::Width.index()]
            + tree.node(child).margin_for_axis(FlexDirection::Row, width);
        child_height = tree.node(child).layout().measured_dimensions
            [crate::enums::Dimension::Height.index()]
            + tree.node(child).margin_for_axis(FlexDirection::Column, width);
    }

    cache::layout_node_internal(
        tree,
        child,
        child_width,
        child_height,
        direction,
        MeasureMode::Exactly,
        MeasureMode::Exactly,
        child_width,
        child_height,
        true,
    );

    position_absolute_child_on_axis(
        tree,
        node,
        child,
        main_axis,
        if is_main_axis_row { width } else { height },
        AxisAlignment::Main,
    );
    position_absolute_child_on_axis(
        tree,
        node,
        child,
        cross_axis,
        if is_main_axis_row { height } else { width },
        AxisAlignment::Cross,
    );
}

enum AxisAlignment {
    Main,
    Cross,
}

/// Position the laid-out child along one axis of the container.
fn position_absolute_child_on_axis(
    tree: &mut LayoutTree,
    node: NodeId,
    child: NodeId,
    axis: FlexDirection,
    axis_size: f32,
    alignment: AxisAlignment,
) {
    let dim = axis.dimension().index();
    let node_size = tree.node(node).layout().measured_dimensions[dim];
    let child_size = tree.node(child).layout().measured_dimensions[dim];
    let leading_index = axis.leading_edge().physical_index();

    let leading_defined = tree.node(child).is_leading_position_defined(axis);
    let trailing_defined = tree.node(child).is_trailing_position_defined(axis);

    let aligned_to_end = match alignment {
        AxisAlignment::Main => tree.node(node).style().justify_content == Justify::FlexEnd,
        AxisAlignment::Cross => {
            (super::align_item(tree, node, child) == Align::FlexEnd)
                ^ (tree.node(node).style().flex_wrap == Wrap::WrapReverse)
        }
    };
    let aligned_to_center = match alignment {
        AxisAlignment::Main => tree.node(node).style().justify_content == Justify::Center,
        AxisAlignment::Cross => super::align_item(tree, node, child) == Align::Center,
    };

    if trailing_defined && !leading_defined {
        let position = node_size
            - child_size
            - tree.node(node).trailing_border(axis)
            - tree.node(child).trailing_margin(axis, axis_size)
            - tree.node(child).trailing_position(axis, axis_size);
        tree.node_mut(child).layout.position[leading_index] = position;
    } else if !leading_defined && aligned_to_center {
        tree.node_mut(child).layout.position[leading_index] = (node_size - child_size) / 2.0;
    } else if !leading_defined && aligned_to_end {
        tree.node_mut(child).layout.position[leading_index] = node_size - child_size;
    } else if leading_defined
        && tree.node_config(node).is_experimental_feature_enabled(
            ExperimentalFeatures::ABSOLUTE_PERCENTAGE_AGAINST_PADDING_EDGE,
        )
    {
        // Percentage insets resolve against the container's measured size
        // under this experiment.
        let position = tree.node(child).leading_position(axis, node_size)
            + tree.node(node).leading_border(axis)
            + tree.node(child).leading_margin(axis, node_size);
        tree.node_mut(child).layout.position[leading_index] = position;
    }
}
