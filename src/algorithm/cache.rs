//! Measurement caching around the layout pass.
//!
//! Every recursive layout call goes through [`layout_node_internal`], which
//! consults the node's cached measurements before running
//! [`layout_impl`](super::layout_impl). Measurement results land in a small
//! ring of entries; the full-layout result keeps a dedicated slot.

use tracing::trace;

use crate::enums::{Dimension, Direction, MeasureMode};
use crate::layout::{CachedMeasurement, MAX_CACHED_RESULTS};
use crate::math;
use crate::tree::{LayoutTree, NodeId};

use super::pixel_grid::round_value_to_pixel_grid;

// =============================================================================
// CACHE COMPATIBILITY PREDICATES
// =============================================================================

fn size_is_exact_and_matches_old_measured_size(
    size_mode: MeasureMode,
    size: f32,
    last_computed_size: f32,
) -> bool {
    size_mode == MeasureMode::Exactly && math::floats_equal(size, last_computed_size)
}

fn old_size_is_unspecified_and_still_fits(
    size_mode: MeasureMode,
    size: f32,
    last_size_mode: MeasureMode,
    last_computed_size: f32,
) -> bool {
    size_mode == MeasureMode::AtMost
        && last_size_mode == MeasureMode::Undefined
        && (size >= last_computed_size || math::floats_equal(size, last_computed_size))
}

fn new_measure_size_is_stricter_and_still_valid(
    size_mode: MeasureMode,
    size: f32,
    last_size_mode: MeasureMode,
    last_size: f32,
    last_computed_size: f32,
) -> bool {
    last_size_mode == MeasureMode::AtMost
        && size_mode == MeasureMode::AtMost
        && math::is_defined(last_size)
        && math::is_defined(size)
        && math::is_defined(last_computed_size)
        && last_size > size
        && (last_computed_size <= size || math::floats_equal(size, last_computed_size))
}

/// Whether a previous measurement of a measure-func node satisfies the new
/// constraints without re-invoking the measure callback.
#[allow(clippy::too_many_arguments)]
pub(super) fn can_use_cached_measurement(
    width_mode: MeasureMode,
    available_width: f32,
    height_mode: MeasureMode,
    available_height: f32,
    last_width_mode: MeasureMode,
    last_available_width: f32,
    last_height_mode: MeasureMode,
    last_available_height: f32,
    last_computed_width: f32,
    last_computed_height: f32,
    margin_row: f32,
    margin_column: f32,
    point_scale_factor: f32,
) -> bool {
    if (math::is_defined(last_computed_height) && last_computed_height < 0.0)
        || (math::is_defined(last_computed_width) && last_computed_width < 0.0)
    {
        return false;
    }

    // Compare on the pixel grid when rounding is active; constraints that
    // round to the same grid line are the same constraint.
    let use_rounded_comparison = point_scale_factor != 0.0;
    let round = |value: f32| -> f32 {
        if use_rounded_comparison {
            round_value_to_pixel_grid(value as f64, point_scale_factor as f64, false, false)
        } else {
            value
        }
    };
    let effective_width = round(available_width);
    let effective_height = round(available_height);
    let effective_last_width = round(last_available_width);
    let effective_last_height = round(last_available_height);

    let has_same_width_spec =
        last_width_mode == width_mode && math::floats_equal(effective_last_width, effective_width);
    let has_same_height_spec = last_height_mode == height_mode
        && math::floats_equal(effective_last_height, effective_height);

    let width_is_compatible = has_same_width_spec
        || size_is_exact_and_matches_old_measured_size(
            width_mode,
            available_width - margin_row,
            last_computed_width,
        )
        || old_size_is_unspecified_and_still_fits(
            width_mode,
            available_width - margin_row,
            last_width_mode,
            last_computed_width,
        )
        || new_measure_size_is_stricter_and_still_valid(
            width_mode,
            available_width - margin_row,
            last_width_mode,
            last_available_width,
            last_computed_width,
        );

    let height_is_compatible = has_same_height_spec
        || size_is_exact_and_matches_old_measured_size(
            height_mode,
            available_height - margin_column,
            last_computed_height,
        )
        || old_size_is_unspecified_and_still_fits(
            height_mode,
            available_height - margin_column,
            last_height_mode,
            last_computed_height,
        )
        || new_measure_size_is_stricter_and_still_valid(
            height_mode,
            available_height - margin_column,
            last_height_mode,
            last_available_height,
            last_computed_height,
        );

    width_is_compatible && height_is_compatible
}

// =============================================================================
// CACHING LAYOUT WRAPPER
// =============================================================================

/// Run or skip a layout pass for `node` depending on its cache. Returns
/// whether the caller has to react to a fresh result (position the node,
/// round the subtree).
#[allow(clippy::too_many_arguments)]
pub(crate) fn layout_node_internal(
    tree: &mut LayoutTree,
    node: NodeId,
    available_width: f32,
    available_height: f32,
    owner_direction: Direction,
    width_measure_mode: MeasureMode,
    height_measure_mode: MeasureMode,
    owner_width: f32,
    owner_height: f32,
    perform_layout: bool,
) -> bool {
    let generation_count = tree.generation_count;

    // A dirty node not yet visited this session has to recompute, as does
    // any node whose owner direction changed since the last pass.
    let need_to_visit_node = {
        let layout = tree.node(node).layout();
        (tree.node(node).is_dirty && layout.generation_count != generation_count)
            || layout.last_owner_direction != owner_direction
    };
    if need_to_visit_node {
        tree.node_mut(node).layout.invalidate_cache();
    }

    let mut cached_results: Option<CachedMeasurement> = None;
    if tree.node(node).has_measure_func() {
        let margin_axis_row = tree
            .node(node)
            .margin_for_axis(crate::enums::FlexDirection::Row, owner_width);
        let margin_axis_column = tree
            .node(node)
            .margin_for_axis(crate::enums::FlexDirection::Column, owner_width);
        let point_scale_factor = tree.node_config(node).point_scale_factor();
        let layout = tree.node(node).layout();

        // The most recent full layout first, then the measurement ring.
        if can_use_cached_measurement(
            width_measure_mode,
            available_width,
            height_measure_mode,
            available_height,
            layout.cached_layout.width_measure_mode,
            layout.cached_layout.available_width,
            layout.cached_layout.height_measure_mode,
            layout.cached_layout.available_height,
            layout.cached_layout.computed_width,
            layout.cached_layout.computed_height,
            margin_axis_row,
            margin_axis_column,
            point_scale_factor,
        ) {
            cached_results = Some(layout.cached_layout);
        } else {
            for i in 0..layout.next_cached_measurements_index {
                let entry = layout.cached_measurements[i];
                if can_use_cached_measurement(
                    width_measure_mode,
                    available_width,
                    height_measure_mode,
                    available_height,
                    entry.width_measure_mode,
                    entry.available_width,
                    entry.height_measure_mode,
                    entry.available_height,
                    entry.computed_width,
                    entry.computed_height,
                    margin_axis_row,
                    margin_axis_column,
                    point_scale_factor,
                ) {
                    cached_results = Some(entry);
                    break;
                }
            }
        }
    } else if perform_layout {
        let layout = tree.node(node).layout();
        let cached = layout.cached_layout;
        if math::floats_equal(cached.available_width, available_width)
            && math::floats_equal(cached.available_height, available_height)
            && cached.width_measure_mode == width_measure_mode
            && cached.height_measure_mode == height_measure_mode
        {
            cached_results = Some(cached);
        }
    } else {
        let layout = tree.node(node).layout();
        for i in 0..layout.next_cached_measurements_index {
            let entry = layout.cached_measurements[i];
            if math::floats_equal(entry.available_width, available_width)
                && math::floats_equal(entry.available_height, available_height)
                && entry.width_measure_mode == width_measure_mode
                && entry.height_measure_mode == height_measure_mode
            {
                cached_results = Some(entry);
                break;
            }
        }
    }

    match cached_results {
        Some(cached) if !need_to_visit_node => {
            trace!(node = node.index(), "cache hit");
            let layout = &mut tree.node_mut(node).layout;
            layout.measured_dimensions[Dimension::Width.index()] = cached.computed_width;
            layout.measured_dimensions[Dimension::Height.index()] = cached.computed_height;
        }
        _ => {
            super::layout_impl(
                tree,
                node,
                available_width,
                available_height,
                owner_direction,
                width_measure_mode,
                height_measure_mode,
                owner_width,
                owner_height,
                perform_layout,
            );

            let layout = &mut tree.node_mut(node).layout;
            layout.last_owner_direction = owner_direction;
            if cached_results.is_none() {
                if layout.next_cached_measurements_index == MAX_CACHED_RESULTS {
                    // Ring is full; start over.
                    layout.next_cached_measurements_index = 0;
                }
                let entry = CachedMeasurement {
                    available_width,
                    available_height,
                    width_measure_mode,
                    height_measure_mode,
                    computed_width: layout.measured_dimensions[Dimension::Width.index()],
                    computed_height: layout.measured_dimensions[Dimension::Height.index()],
                };
                if perform_layout {
                    layout.cached_layout = entry;
                } else {
                    let index = layout.next_cached_measurements_index;
                    layout.cached_measurements[index] = entry;
                    layout.next_cached_measurements_index += 1;
                }
            }
        }
    }

    if perform_layout {
        let measured = tree.node(node).layout().measured_dimensions;
        let layout = &mut tree.node_mut(node).layout;
        layout.dimensions = measured;
        tree.node_mut(node).has_new_layout = true;
        tree.set_node_dirty(node, false);
    }
    tree.node_mut(node).layout.generation_count = generation_count;

    need_to_visit_node || cached_results.is_none()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_size_matches_old_measurement() {
        assert!(can_use_cached_measurement(
            MeasureMode::Exactly,
            100.0,
            MeasureMode::Exactly,
            50.0,
            MeasureMode::AtMost,
            200.0,
            MeasureMode::AtMost,
            80.0,
            100.0,
            50.0,
            0.0,
            0.0,
            1.0,
        ));
    }

    #[test]
    fn negative_cached_size_is_rejected() {
        assert!(!can_use_cached_measurement(
            MeasureMode::Exactly,
            100.0,
            MeasureMode::Exactly,
            50.0,
            MeasureMode::Exactly,
            100.0,
            MeasureMode::Exactly,
            50.0,
            -1.0,
            50.0,
            0.0,
            0.0,
            1.0,
        ));
    }

    #[test]
    fn unspecified_measurement_still_fits_larger_at_most() {
        // Measured unconstrained at 40 points; an at-most constraint of 60
        // cannot change the result.
        assert!(can_use_cached_measurement(
            MeasureMode::AtMost,
            60.0,
            MeasureMode::Undefined,
            math::UNDEFINED,
            MeasureMode::Undefined,
            math::UNDEFINED,
            MeasureMode::Undefined,
            math::UNDEFINED,
            40.0,
            12.0,
            0.0,
            0.0,
            1.0,
        ));
    }

    #[test]
    fn stricter_at_most_reuses_fitting_result() {
        assert!(can_use_cached_measurement(
            MeasureMode::AtMost,
            80.0,
            MeasureMode::Exactly,
            20.0,
            MeasureMode::AtMost,
            100.0,
            MeasureMode::Exactly,
            20.0,
            50.0,
            20.0,
            0.0,
            0.0,
            1.0,
        ));
        // The cached content no longer fits under the tighter bound.
        assert!(!can_use_cached_measurement(
            MeasureMode::AtMost,
            40.0,
            MeasureMode::Exactly,
            20.0,
            MeasureMode::AtMost,
            100.0,
            MeasureMode::Exactly,
            20.0,
            50.0,
            20.0,
            0.0,
            0.0,
            1.0,
        ));
    }

    #[test]
    fn undefined_constraints_compare_equal() {
        assert!(can_use_cached_measurement(
            MeasureMode::Undefined,
            math::UNDEFINED,
            MeasureMode::Undefined,
            math::UNDEFINED,
            MeasureMode::Undefined,
            math::UNDEFINED,
            MeasureMode::Undefined,
            math::UNDEFINED,
            40.0,
            12.0,
            0.0,
            0.0,
            1.0,
        ));
    }
}
