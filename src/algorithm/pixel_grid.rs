//! Snapping computed layout onto the pixel grid.
//!
//! Positions and dimensions are rounded after layout so that adjacent boxes
//! share grid lines: each edge is rounded in absolute coordinates and the
//! dimension is the difference of the rounded edges, never a rounded size.

use crate::enums::{Dimension, Edge, NodeType};
use crate::math;
use crate::tree::{LayoutTree, NodeId};

/// Round a single value onto the grid defined by `point_scale_factor`.
/// Computed in f64: accumulated absolute positions exceed f32 precision on
/// deep trees.
pub(super) fn round_value_to_pixel_grid(
    value: f64,
    point_scale_factor: f64,
    force_ceil: bool,
    force_floor: bool,
) -> f32 {
    let mut scaled_value = value * point_scale_factor;
    // fractial in [0, 1) regardless of sign.
    let mut fractial = scaled_value % 1.0;
    if fractial < 0.0 {
        fractial += 1.0;
    }
    if math::doubles_equal(fractial, 0.0) {
        // Already on the grid (within tolerance).
        scaled_value -= fractial;
    } else if math::doubles_equal(fractial, 1.0) {
        scaled_value = scaled_value - fractial + 1.0;
    } else if force_ceil {
        scaled_value = scaled_value - fractial + 1.0;
    } else if force_floor {
        scaled_value -= fractial;
    } else {
        scaled_value = scaled_value - fractial
            + if fractial > 0.5 || math::doubles_equal(fractial, 0.5) { 1.0 } else { 0.0 };
    }
    if scaled_value.is_nan() || point_scale_factor.is_nan() {
        math::UNDEFINED
    } else {
        (scaled_value / point_scale_factor) as f32
    }
}

/// Round the subtree under `node` in place. `absolute_left`/`absolute_top`
/// are the owner's unrounded absolute offsets. A zero scale factor disables
/// rounding.
pub(super) fn round_to_pixel_grid(
    tree: &mut LayoutTree,
    node: NodeId,
    point_scale_factor: f64,
    absolute_left: f64,
    absolute_top: f64,
) {
    if point_scale_factor == 0.0 {
        return;
    }

    let node_left = tree.node(node).layout().position[Edge::Left.physical_index()] as f64;
    let node_top = tree.node(node).layout().position[Edge::Top.physical_index()] as f64;
    let node_width = tree.node(node).layout().dimensions[Dimension::Width.index()] as f64;
    let node_height = tree.node(node).layout().dimensions[Dimension::Height.index()] as f64;

    let absolute_node_left = absolute_left + node_left;
    let absolute_node_top = absolute_top + node_top;
    let absolute_node_right = absolute_node_left + node_width;
    let absolute_node_bottom = absolute_node_top + node_height;

    // Text rounds conservatively so glyphs are never clipped by a shrunken
    // box: fractional sizes round up, whole sizes stay put.
    let text_rounding = tree.node(node).node_type == NodeType::Text;

    {
        let layout = &mut tree.node_mut(node).layout;
        layout.position[Edge::Left.physical_index()] =
            round_value_to_pixel_grid(node_left, point_scale_factor, false, text_rounding);
        layout.position[Edge::Top.physical_index()] =
            round_value_to_pixel_grid(node_top, point_scale_factor, false, text_rounding);
    }

    let has_fractional_width =
        !math::doubles_equal((node_width * point_scale_factor) % 1.0, 0.0)
            && !math::doubles_equal((node_width * point_scale_factor) % 1.0, 1.0);
    let has_fractional_height =
        !math::doubles_equal((node_height * point_scale_factor) % 1.0, 0.0)
            && !math::doubles_equal((node_height * point_scale_factor) % 1.0, 1.0);

    let rounded_width = round_value_to_pixel_grid(
        absolute_node_right,
        point_scale_factor,
        text_rounding && has_fractional_width,
        text_rounding && !has_fractional_width,
    ) - round_value_to_pixel_grid(absolute_node_left, point_scale_factor, false, text_rounding);
    let rounded_height = round_value_to_pixel_grid(
        absolute_node_bottom,
        point_scale_factor,
        text_rounding && has_fractional_height,
        text_rounding && !has_fractional_height,
    ) - round_value_to_pixel_grid(absolute_node_top, point_scale_factor, false, text_rounding);

    {
        let layout = &mut tree.node_mut(node).layout;
        layout.dimensions[Dimension::Width.index()] = rounded_width;
        layout.dimensions[Dimension::Height.index()] = rounded_height;
    }

    for i in 0..tree.child_count(node) {
        let child = tree.child(node, i);
        round_to_pixel_grid(tree, child, point_scale_factor, absolute_node_left, absolute_node_top);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_grid_line() {
        assert_eq!(round_value_to_pixel_grid(6.4, 1.0, false, false), 6.0);
        assert_eq!(round_value_to_pixel_grid(6.5, 1.0, false, false), 7.0);
        assert_eq!(round_value_to_pixel_grid(6.6, 1.0, false, false), 7.0);
        assert_eq!(round_value_to_pixel_grid(-2.2, 1.0, false, false), -2.0);
    }

    #[test]
    fn scale_factor_refines_the_grid() {
        assert_eq!(round_value_to_pixel_grid(6.4, 2.0, false, false), 6.5);
        assert_eq!(round_value_to_pixel_grid(6.2, 2.0, false, false), 6.0);
        assert_eq!(round_value_to_pixel_grid(6.26, 3.0, false, false), 6.333_333_3);
    }

    #[test]
    fn forced_directions() {
        assert_eq!(round_value_to_pixel_grid(6.1, 1.0, true, false), 7.0);
        assert_eq!(round_value_to_pixel_grid(6.9, 1.0, false, true), 6.0);
        // On-grid values are untouched either way.
        assert_eq!(round_value_to_pixel_grid(6.0, 1.0, true, false), 6.0);
        assert_eq!(round_value_to_pixel_grid(6.0, 1.0, false, true), 6.0);
    }

    #[test]
    fn near_grid_values_snap_before_forcing() {
        // 4.0 * 1.5 lands a hair off 6.0 in binary; the tolerance keeps the
        // ceil from inflating it to the next line.
        assert_eq!(round_value_to_pixel_grid(4.000_000_1, 1.5, true, false), 4.0);
    }

    #[test]
    fn undefined_stays_undefined() {
        assert!(round_value_to_pixel_grid(f64::NAN, 1.0, false, false).is_nan());
    }
}
