//! Flexbox layout computation.
//!
//! The entry point is [`calculate_layout`], reached through
//! [`LayoutTree::calculate_layout`](crate::tree::LayoutTree::calculate_layout).
//! A session walks the tree recursively through the caching wrapper in
//! [`cache`], which decides per node whether a stored measurement can be
//! reused or the full pass below has to run.
//!
//! The pass itself works line by line: a flex basis for every child, children
//! collected into flex lines, flexible lengths resolved in two passes per
//! line, main-axis justification, cross-axis alignment, multi-line content
//! alignment, and finally absolutely positioned children.

pub(crate) mod cache;

mod absolute;
mod pixel_grid;

use tracing::trace;

use crate::config::{self, Errata, ExperimentalFeatures};
use crate::enums::{
    Align, Dimension, Direction, Display, Edge, FlexDirection, Justify, MeasureMode, Overflow,
    PositionType, Unit, Wrap,
};
use crate::layout::LayoutResults;
use crate::math;
use crate::node::Node;
use crate::tree::{LayoutTree, NodeId};

// =============================================================================
// ENTRY POINT
// =============================================================================

/// Compute layout for the subtree under `root` against the owner size.
/// NaN means unconstrained on that axis.
pub(crate) fn calculate_layout(
    tree: &mut LayoutTree,
    root: NodeId,
    owner_width: f32,
    owner_height: f32,
    owner_direction: Direction,
) {
    // Bumping the generation forces every dirty node to be visited at least
    // once this session.
    tree.generation_count = tree.generation_count.wrapping_add(1);
    tree.node_mut(root).resolve_dimensions();

    let (width, width_measure_mode) = {
        let node = tree.node(root);
        if node.is_style_dim_defined(FlexDirection::Row, owner_width) {
            let width = math::resolve_value(node.resolved_dimension(Dimension::Width), owner_width)
                + node.margin_for_axis(FlexDirection::Row, owner_width);
            (width, MeasureMode::Exactly)
        } else {
            let max_width = math::resolve_value(
                node.style().max_dimensions[Dimension::Width.index()],
                owner_width,
            );
            if math::is_defined(max_width) {
                (max_width, MeasureMode::AtMost)
            } else if math::is_defined(owner_width) {
                (owner_width, MeasureMode::Exactly)
            } else {
                (owner_width, MeasureMode::Undefined)
            }
        }
    };

    let (height, height_measure_mode) = {
        let node = tree.node(root);
        if node.is_style_dim_defined(FlexDirection::Column, owner_height) {
            let height =
                math::resolve_value(node.resolved_dimension(Dimension::Height), owner_height)
                    + node.margin_for_axis(FlexDirection::Column, owner_width);
            (height, MeasureMode::Exactly)
        } else {
            let max_height = math::resolve_value(
                node.style().max_dimensions[Dimension::Height.index()],
                owner_height,
            );
            if math::is_defined(max_height) {
                (max_height, MeasureMode::AtMost)
            } else if math::is_defined(owner_height) {
                (owner_height, MeasureMode::Exactly)
            } else {
                (owner_height, MeasureMode::Undefined)
            }
        }
    };

    trace!(
        generation = tree.generation_count,
        width,
        height,
        "layout session start"
    );

    let performed = cache::layout_node_internal(
        tree,
        root,
        width,
        height,
        owner_direction,
        width_measure_mode,
        height_measure_mode,
        owner_width,
        owner_height,
        true,
    );

    if performed {
        let direction = tree.node(root).layout().direction;
        tree.node_mut(root)
            .set_position(direction, owner_width, owner_height, owner_width);
        let point_scale_factor = tree.node_config(root).point_scale_factor();
        pixel_grid::round_to_pixel_grid(tree, root, point_scale_factor as f64, 0.0, 0.0);
    }
}

// =============================================================================
// AXIS AND BOUNDS HELPERS
// =============================================================================

pub(super) fn padding_and_border_for_axis(
    node: &Node,
    axis: FlexDirection,
    width_size: f32,
) -> f32 {
    node.leading_padding_and_border(axis, width_size)
        + node.trailing_padding_and_border(axis, width_size)
}

/// Clamp `value` to the node's min/max constraint on `axis`.
fn bound_axis_within_min_and_max(
    node: &Node,
    axis: FlexDirection,
    value: f32,
    axis_size: f32,
) -> f32 {
    let dim = axis.dimension().index();
    let min = math::resolve_value(node.style().min_dimensions[dim], axis_size);
    let max = math::resolve_value(node.style().max_dimensions[dim], axis_size);
    if math::is_defined(max) && max >= 0.0 && value > max {
        return max;
    }
    if math::is_defined(min) && min >= 0.0 && value < min {
        return min;
    }
    value
}

/// Like [`bound_axis_within_min_and_max`], and also never below the node's
/// own padding and border on that axis.
pub(super) fn bound_axis(
    node: &Node,
    axis: FlexDirection,
    value: f32,
    axis_size: f32,
    width_size: f32,
) -> f32 {
    math::float_max(
        bound_axis_within_min_and_max(node, axis, value, axis_size),
        padding_and_border_for_axis(node, axis, width_size),
    )
}

fn dim_with_margin(node: &Node, axis: FlexDirection, width_size: f32) -> f32 {
    node.layout().measured_dimensions[axis.dimension().index()]
        + node.leading_margin(axis, width_size)
        + node.trailing_margin(axis, width_size)
}

/// Tighten `size`/`mode` with the node's max constraint on `axis`. An
/// undefined mode with a max constraint becomes an at-most constraint.
fn constrain_max_size_for_mode(
    node: &Node,
    axis: FlexDirection,
    owner_axis_size: f32,
    owner_width: f32,
    mode: &mut MeasureMode,
    size: &mut f32,
) {
    let max_size = math::resolve_value(
        node.style().max_dimensions[axis.dimension().index()],
        owner_axis_size,
    ) + node.margin_for_axis(axis, owner_width);
    match *mode {
        MeasureMode::Exactly | MeasureMode::AtMost => {
            if math::is_defined(max_size) && !(*size < max_size) {
                *size = max_size;
            }
        }
        MeasureMode::Undefined => {
            if math::is_defined(max_size) {
                *mode = MeasureMode::AtMost;
                *size = max_size;
            }
        }
    }
}

fn calculate_available_inner_dim(
    node: &Node,
    dimension: Dimension,
    available_dim: f32,
    padding_and_border: f32,
    owner_dim: f32,
) -> f32 {
    let mut available_inner_dim = available_dim - padding_and_border;
    // The max dimension overrides the predefined dimension value; the min
    // dimension in turn overrides both.
    if math::is_defined(available_inner_dim) {
        let min = math::resolve_value(node.style().min_dimensions[dimension.index()], owner_dim);
        let min_inner_dim = if math::is_undefined(min) {
            0.0
        } else {
            min - padding_and_border
        };
        let max = math::resolve_value(node.style().max_dimensions[dimension.index()], owner_dim);
        let max_inner_dim = if math::is_undefined(max) {
            f32::MAX
        } else {
            max - padding_and_border
        };
        available_inner_dim =
            math::float_max(math::float_min(available_inner_dim, max_inner_dim), min_inner_dim);
    }
    available_inner_dim
}

fn set_child_trailing_position(
    tree: &mut LayoutTree,
    node: NodeId,
    child: NodeId,
    axis: FlexDirection,
) {
    let size = tree.node(child).layout().measured_dimensions[axis.dimension().index()];
    let position = tree.node(node).layout().measured_dimensions[axis.dimension().index()]
        - size
        - tree.node(child).layout().position[axis.leading_edge().physical_index()];
    tree.node_mut(child).layout.position[axis.trailing_edge().physical_index()] = position;
}

// =============================================================================
// ALIGNMENT AND BASELINES
// =============================================================================

/// The effective cross-axis alignment of `child`: its own align-self unless
/// auto, then the container's align-items. Baseline degrades to flex-start in
/// column containers.
pub(super) fn align_item(tree: &LayoutTree, node: NodeId, child: NodeId) -> Align {
    let align = if tree.node(child).style().align_self == Align::Auto {
        tree.node(node).style().align_items
    } else {
        tree.node(child).style().align_self
    };
    if align == Align::Baseline && tree.node(node).style().flex_direction.is_column() {
        return Align::FlexStart;
    }
    align
}

/// Baseline offset of `node` from its top edge: the baseline callback if
/// set, else derived from the first eligible child on the first line.
fn baseline(tree: &LayoutTree, node: NodeId) -> f32 {
    if let Some(baseline_func) = tree.node(node).baseline.clone() {
        let measured = tree.node(node).layout().measured_dimensions;
        let value = baseline_func.borrow_mut().baseline(
            node,
            measured[Dimension::Width.index()],
            measured[Dimension::Height.index()],
        );
        config::assert_fatal(
            tree.node_config(node),
            math::is_defined(value),
            "Expect custom baseline function to not return NaN",
        );
        return value;
    }

    let mut baseline_child = None;
    for i in 0..tree.child_count(node) {
        let child = tree.child(node, i);
        if tree.node(child).line_index > 0 {
            break;
        }
        if tree.node(child).style().position_type == PositionType::Absolute {
            continue;
        }
        if align_item(tree, node, child) == Align::Baseline
            || tree.node(child).is_reference_baseline
        {
            baseline_child = Some(child);
            break;
        }
        if baseline_child.is_none() {
            baseline_child = Some(child);
        }
    }

    match baseline_child {
        None => tree.node(node).layout().measured_dimensions[Dimension::Height.index()],
        Some(child) => {
            baseline(tree, child) + tree.node(child).layout().position[Edge::Top.physical_index()]
        }
    }
}

fn is_baseline_layout(tree: &LayoutTree, node: NodeId) -> bool {
    if tree.node(node).style().flex_direction.is_column() {
        return false;
    }
    if tree.node(node).style().align_items == Align::Baseline {
        return true;
    }
    for i in 0..tree.child_count(node) {
        let child = tree.child(node, i);
        let n = tree.node(child);
        if n.style().position_type != PositionType::Absolute
            && n.style().align_self == Align::Baseline
        {
            return true;
        }
    }
    false
}

// =============================================================================
// FLEX BASIS
// =============================================================================

fn zero_out_layout_recursively(tree: &mut LayoutTree, node: NodeId) {
    let n = tree.node_mut(node);
    n.layout = LayoutResults::default();
    n.layout.dimensions = [0.0, 0.0];
    n.has_new_layout = true;

    tree.clone_children_if_needed(node);
    for i in 0..tree.child_count(node) {
        let child = tree.child(node, i);
        zero_out_layout_recursively(tree, child);
    }
}

fn compute_flex_basis_for_child(
    tree: &mut LayoutTree,
    node: NodeId,
    child: NodeId,
    width: f32,
    width_mode: MeasureMode,
    height: f32,
    owner_width: f32,
    owner_height: f32,
    height_mode: MeasureMode,
    direction: Direction,
) {
    let main_axis = tree.node(node).style().flex_direction.resolve(direction);
    let is_main_axis_row = main_axis.is_row();
    let main_axis_size = if is_main_axis_row { width } else { height };
    let main_axis_owner_size = if is_main_axis_row { owner_width } else { owner_height };

    let child_web_defaults = tree.node_config(child).use_web_defaults();
    let resolved_flex_basis = math::resolve_value(
        tree.node(child).resolve_flex_basis(child_web_defaults),
        main_axis_owner_size,
    );
    let is_row_style_dim_defined =
        tree.node(child).is_style_dim_defined(FlexDirection::Row, owner_width);
    let is_column_style_dim_defined =
        tree.node(child).is_style_dim_defined(FlexDirection::Column, owner_height);

    if math::is_defined(resolved_flex_basis) && math::is_defined(main_axis_size) {
        let web_flex_basis = tree
            .node_config(child)
            .is_experimental_feature_enabled(ExperimentalFeatures::WEB_FLEX_BASIS);
        let stale =
            tree.node(child).layout().computed_flex_basis_generation != tree.generation_count;
        if math::is_undefined(tree.node(child).layout().computed_flex_basis)
            || (web_flex_basis && stale)
        {
            let padding_and_border =
                padding_and_border_for_axis(tree.node(child), main_axis, owner_width);
            tree.node_mut(child).layout.computed_flex_basis =
                math::float_max(resolved_flex_basis, padding_and_border);
        }
    } else if is_main_axis_row && is_row_style_dim_defined {
        // The width is definite, so use that as the flex basis.
        let padding_and_border =
            padding_and_border_for_axis(tree.node(child), FlexDirection::Row, owner_width);
        let resolved =
            math::resolve_value(tree.node(child).resolved_dimension(Dimension::Width), owner_width);
        tree.node_mut(child).layout.computed_flex_basis =
            math::float_max(resolved, padding_and_border);
    } else if !is_main_axis_row && is_column_style_dim_defined {
        // The height is definite, so use that as the flex basis.
        let padding_and_border =
            padding_and_border_for_axis(tree.node(child), FlexDirection::Column, owner_width);
        let resolved = math::resolve_value(
            tree.node(child).resolved_dimension(Dimension::Height),
            owner_height,
        );
        tree.node_mut(child).layout.computed_flex_basis =
            math::float_max(resolved, padding_and_border);
    } else {
        // Compute the flex basis and hypothetical main size (i.e. the clamped
        // flex basis) by measuring the child.
        let mut child_width = math::UNDEFINED;
        let mut child_height = math::UNDEFINED;
        let mut child_width_measure_mode = MeasureMode::Undefined;
        let mut child_height_measure_mode = MeasureMode::Undefined;

        let margin_row = tree.node(child).margin_for_axis(FlexDirection::Row, owner_width);
        let margin_column = tree.node(child).margin_for_axis(FlexDirection::Column, owner_width);

        if is_row_style_dim_defined {
            child_width = math::resolve_value(
                tree.node(child).resolved_dimension(Dimension::Width),
                owner_width,
            ) + margin_row;
            child_width_measure_mode = MeasureMode::Exactly;
        }
        if is_column_style_dim_defined {
            child_height = math::resolve_value(
                tree.node(child).resolved_dimension(Dimension::Height),
                owner_height,
            ) + margin_column;
            child_height_measure_mode = MeasureMode::Exactly;
        }

        // A scroll container does not impose its available size on the
        // child's main axis.
        let overflow = tree.node(node).style().overflow;
        let width_constrained =
            (!is_main_axis_row && overflow == Overflow::Scroll) || overflow != Overflow::Scroll;
        if math::is_undefined(child_width) && width_constrained && math::is_defined(width) {
            child_width = width;
            child_width_measure_mode = MeasureMode::AtMost;
        }
        let height_constrained =
            (is_main_axis_row && overflow == Overflow::Scroll) || overflow != Overflow::Scroll;
        if math::is_undefined(child_height) && height_constrained && math::is_defined(height) {
            child_height = height;
            child_height_measure_mode = MeasureMode::AtMost;
        }

        // An aspect ratio forbids stretching the dependent dimension.
        let aspect_ratio = tree.node(child).aspect_ratio();
        if math::is_defined(aspect_ratio) {
            if !is_main_axis_row && child_width_measure_mode == MeasureMode::Exactly {
                child_height = margin_column + (child_width - margin_row) / aspect_ratio;
                child_height_measure_mode = MeasureMode::Exactly;
            } else if is_main_axis_row && child_height_measure_mode == MeasureMode::Exactly {
                child_width = margin_row + (child_height - margin_column) * aspect_ratio;
                child_width_measure_mode = MeasureMode::Exactly;
            }
        }

        // An exact constraint on the container's cross axis is forwarded to a
        // stretched child as an exact size.
        let has_exact_width = math::is_defined(width) && width_mode == MeasureMode::Exactly;
        let child_width_stretch = align_item(tree, node, child) == Align::Stretch
            && child_width_measure_mode != MeasureMode::Exactly;
        if !is_main_axis_row && !is_row_style_dim_defined && has_exact_width && child_width_stretch
        {
            child_width = width;
            child_width_measure_mode = MeasureMode::Exactly;
            if math::is_defined(aspect_ratio) {
                child_height = (child_width - margin_row) / aspect_ratio;
                child_height_measure_mode = MeasureMode::Exactly;
            }
        }

        let has_exact_height = math::is_defined(height) && height_mode == MeasureMode::Exactly;
        let child_height_stretch = align_item(tree, node, child) == Align::Stretch
            && child_height_measure_mode != MeasureMode::Exactly;
        if is_main_axis_row
            && !is_column_style_dim_defined
            && has_exact_height
            && child_height_stretch
        {
            child_height = height;
            child_height_measure_mode = MeasureMode::Exactly;
            if math::is_defined(aspect_ratio) {
                child_width = (child_height - margin_column) * aspect_ratio;
                child_width_measure_mode = MeasureMode::Exactly;
            }
        }

        constrain_max_size_for_mode(
            tree.node(child),
            FlexDirection::Row,
            owner_width,
            owner_width,
            &mut child_width_measure_mode,
            &mut child_width,
        );
        constrain_max_size_for_mode(
            tree.node(child),
            FlexDirection::Column,
            owner_height,
            owner_width,
            &mut child_height_measure_mode,
            &mut child_height,
        );

        cache::layout_node_internal(
            tree,
            child,
            child_width,
            child_height,
            direction,
            child_width_measure_mode,
            child_height_measure_mode,
            owner_width,
            owner_height,
            false,
        );

        let measured = tree.node(child).layout().measured_dimensions[main_axis.dimension().index()];
        let padding_and_border =
            padding_and_border_for_axis(tree.node(child), main_axis, owner_width);
        tree.node_mut(child).layout.computed_flex_basis =
            math::float_max(measured, padding_and_border);
    }
    let generation = tree.generation_count;
    tree.node_mut(child).layout.computed_flex_basis_generation = generation;
}

/// Compute the flex basis for every child and return the sum of outer flex
/// bases along the main axis.
fn compute_flex_basis_for_children(
    tree: &mut LayoutTree,
    node: NodeId,
    available_inner_width: f32,
    available_inner_height: f32,
    width_measure_mode: MeasureMode,
    height_measure_mode: MeasureMode,
    direction: Direction,
    main_axis: FlexDirection,
    perform_layout: bool,
) -> f32 {
    let mut total_outer_flex_basis = 0.0;
    let children: Vec<NodeId> = tree.children(node).to_vec();
    let measure_mode_main_dim = if main_axis.is_row() {
        width_measure_mode
    } else {
        height_measure_mode
    };

    // A single flexible child in an exactly sized container will absorb all
    // remaining space, so its basis can start at zero without a measurement.
    // Only safe when that child both grows and shrinks and no sibling flexes.
    let mut single_flex_child = None;
    if measure_mode_main_dim == MeasureMode::Exactly {
        for &child in &children {
            let web_defaults = tree.node_config(child).use_web_defaults();
            let n = tree.node(child);
            if n.is_flexible(web_defaults) {
                if single_flex_child.is_some()
                    || math::floats_equal(n.resolve_flex_grow(), 0.0)
                    || math::floats_equal(n.resolve_flex_shrink(web_defaults), 0.0)
                {
                    single_flex_child = None;
                    break;
                }
                single_flex_child = Some(child);
            }
        }
    }

    for &child in &children {
        tree.node_mut(child).resolve_dimensions();
        if tree.node(child).style().display == Display::None {
            zero_out_layout_recursively(tree, child);
            tree.node_mut(child).has_new_layout = true;
            tree.set_node_dirty(child, false);
            continue;
        }
        if perform_layout {
            // Initial position relative to the owner.
            let child_direction = tree.node(child).resolve_direction(direction);
            let main_dim = if main_axis.is_row() {
                available_inner_width
            } else {
                available_inner_height
            };
            let cross_dim = if main_axis.is_row() {
                available_inner_height
            } else {
                available_inner_width
            };
            tree.node_mut(child)
                .set_position(child_direction, main_dim, cross_dim, available_inner_width);
        }

        if tree.node(child).style().position_type == PositionType::Absolute {
            continue;
        }
        if single_flex_child == Some(child) {
            let generation = tree.generation_count;
            let child_layout = &mut tree.node_mut(child).layout;
            child_layout.computed_flex_basis_generation = generation;
            child_layout.computed_flex_basis = 0.0;
        } else {
            compute_flex_basis_for_child(
                tree,
                node,
                child,
                available_inner_width,
                width_measure_mode,
                available_inner_height,
                available_inner_width,
                available_inner_height,
                height_measure_mode,
                direction,
            );
        }

        total_outer_flex_basis += tree.node(child).layout().computed_flex_basis
            + tree.node(child).margin_for_axis(main_axis, available_inner_width);
    }
    total_outer_flex_basis
}

// =============================================================================
// FLEX LINES
// =============================================================================

/// One flex line: the run of children laid out together along the main axis,
/// plus the running totals the distribution passes work with.
struct FlexLine {
    items_on_line: usize,
    size_consumed_on_current_line: f32,
    total_flex_grow_factors: f32,
    total_flex_shrink_scaled_factors: f32,
    end_of_line_index: usize,
    relative_children: Vec<NodeId>,
    remaining_free_space: f32,
    /// Accumulated main-axis extent, including container padding and border.
    main_dim: f32,
    /// Largest cross-axis extent of any item on the line.
    cross_dim: f32,
}

/// Fill a line starting at `start_of_line_index` until it is full or the
/// children run out.
fn calculate_collect_flex_items_row_values(
    tree: &mut LayoutTree,
    node: NodeId,
    owner_direction: Direction,
    main_axis_owner_size: f32,
    available_inner_width: f32,
    available_inner_main_dim: f32,
    start_of_line_index: usize,
    line_count: usize,
) -> FlexLine {
    let mut line = FlexLine {
        items_on_line: 0,
        size_consumed_on_current_line: 0.0,
        total_flex_grow_factors: 0.0,
        total_flex_shrink_scaled_factors: 0.0,
        end_of_line_index: start_of_line_index,
        relative_children: Vec::with_capacity(tree.child_count(node)),
        remaining_free_space: 0.0,
        main_dim: 0.0,
        cross_dim: 0.0,
    };

    let resolved_direction = tree.node(node).resolve_direction(owner_direction);
    let main_axis = tree.node(node).style().flex_direction.resolve(resolved_direction);
    let is_node_flex_wrap = tree.node(node).style().flex_wrap != Wrap::NoWrap;
    let gap = tree.node(node).gap_for_axis(main_axis, available_inner_width);

    let child_count = tree.child_count(node);
    let mut size_consumed_including_min_constraint = 0.0;
    let mut end_of_line_index = start_of_line_index;
    while end_of_line_index < child_count {
        let child = tree.child(node, end_of_line_index);
        if tree.node(child).style().display == Display::None
            || tree.node(child).style().position_type == PositionType::Absolute
        {
            end_of_line_index += 1;
            continue;
        }

        let is_first_element_in_line = end_of_line_index - start_of_line_index == 0;
        tree.node_mut(child).line_index = line_count;

        let child_margin_main_axis =
            tree.node(child).margin_for_axis(main_axis, available_inner_width);
        let child_leading_gap_main_axis = if is_first_element_in_line { 0.0 } else { gap };
        let flex_basis_with_min_and_max = bound_axis_within_min_and_max(
            tree.node(child),
            main_axis,
            tree.node(child).layout().computed_flex_basis,
            main_axis_owner_size,
        );

        // In a wrapping container, an item that pushes past the available
        // size ends the current line.
        if size_consumed_including_min_constraint
            + flex_basis_with_min_and_max
            + child_margin_main_axis
            + child_leading_gap_main_axis
            > available_inner_main_dim
            && is_node_flex_wrap
            && line.items_on_line > 0
        {
            break;
        }

        size_consumed_including_min_constraint +=
            flex_basis_with_min_and_max + child_margin_main_axis + child_leading_gap_main_axis;
        line.size_consumed_on_current_line +=
            flex_basis_with_min_and_max + child_margin_main_axis + child_leading_gap_main_axis;
        line.items_on_line += 1;

        let web_defaults = tree.node_config(child).use_web_defaults();
        if tree.node(child).is_flexible(web_defaults) {
            line.total_flex_grow_factors += tree.node(child).resolve_flex_grow();
            // Unlike the grow factor, the shrink factor is scaled relative to
            // the child's basis.
            line.total_flex_shrink_scaled_factors +=
                -tree.node(child).resolve_flex_shrink(web_defaults)
                    * tree.node(child).layout().computed_flex_basis;
        }

        line.relative_children.push(child);
        end_of_line_index += 1;
    }
    line.end_of_line_index = end_of_line_index;

    // Totals below one act as one so a part-filled line still distributes
    // all of its free space.
    if line.total_flex_grow_factors > 0.0 && line.total_flex_grow_factors < 1.0 {
        line.total_flex_grow_factors = 1.0;
    }
    if line.total_flex_shrink_scaled_factors > 0.0 && line.total_flex_shrink_scaled_factors < 1.0 {
        line.total_flex_shrink_scaled_factors = 1.0;
    }

    line
}

// =============================================================================
// FLEXIBLE LENGTH RESOLUTION
// =============================================================================

/// First pass: find children whose flexed size would violate their min/max
/// constraint, freeze them at the bound size, and take them out of the
/// distribution so the second pass splits the corrected free space.
fn distribute_free_space_first_pass(
    tree: &LayoutTree,
    line: &mut FlexLine,
    main_axis: FlexDirection,
    main_axis_owner_size: f32,
    available_inner_main_dim: f32,
    available_inner_width: f32,
) {
    let mut delta_free_space = 0.0;

    for &child in &line.relative_children {
        let web_defaults = tree.node_config(child).use_web_defaults();
        let n = tree.node(child);
        let child_flex_basis = bound_axis_within_min_and_max(
            n,
            main_axis,
            n.layout().computed_flex_basis,
            main_axis_owner_size,
        );

        if line.remaining_free_space < 0.0 {
            let flex_shrink_scaled_factor =
                -n.resolve_flex_shrink(web_defaults) * child_flex_basis;
            if math::is_defined(flex_shrink_scaled_factor) && flex_shrink_scaled_factor != 0.0 {
                let base_main_size = child_flex_basis
                    + line.remaining_free_space / line.total_flex_shrink_scaled_factors
                        * flex_shrink_scaled_factor;
                let bound_main_size = bound_axis(
                    n,
                    main_axis,
                    base_main_size,
                    available_inner_main_dim,
                    available_inner_width,
                );
                if math::is_defined(base_main_size)
                    && math::is_defined(bound_main_size)
                    && base_main_size != bound_main_size
                {
                    delta_free_space += bound_main_size - child_flex_basis;
                    line.total_flex_shrink_scaled_factors -=
                        -n.resolve_flex_shrink(web_defaults) * n.layout().computed_flex_basis;
                }
            }
        } else if math::is_defined(line.remaining_free_space) && line.remaining_free_space > 0.0 {
            let flex_grow_factor = n.resolve_flex_grow();
            if math::is_defined(flex_grow_factor) && flex_grow_factor != 0.0 {
                let base_main_size = child_flex_basis
                    + line.remaining_free_space / line.total_flex_grow_factors * flex_grow_factor;
                let bound_main_size = bound_axis(
                    n,
                    main_axis,
                    base_main_size,
                    available_inner_main_dim,
                    available_inner_width,
                );
                if math::is_defined(base_main_size)
                    && math::is_defined(bound_main_size)
                    && base_main_size != bound_main_size
                {
                    delta_free_space += bound_main_size - child_flex_basis;
                    line.total_flex_grow_factors -= flex_grow_factor;
                }
            }
        }
    }

    line.remaining_free_space -= delta_free_space;
}

/// Second pass: assign every remaining child its final flexed main size and
/// lay it out against that size. Returns the total distributed space.
fn distribute_free_space_second_pass(
    tree: &mut LayoutTree,
    line: &mut FlexLine,
    node: NodeId,
    main_axis: FlexDirection,
    cross_axis: FlexDirection,
    main_axis_owner_size: f32,
    available_inner_main_dim: f32,
    available_inner_cross_dim: f32,
    available_inner_width: f32,
    available_inner_height: f32,
    main_axis_overflows: bool,
    measure_mode_cross_dim: MeasureMode,
    perform_layout: bool,
) -> f32 {
    let mut delta_free_space = 0.0;
    let is_main_axis_row = main_axis.is_row();
    let is_node_flex_wrap = tree.node(node).style().flex_wrap != Wrap::NoWrap;

    let relative_children = line.relative_children.clone();
    for child in relative_children {
        let web_defaults = tree.node_config(child).use_web_defaults();
        let child_flex_basis = bound_axis_within_min_and_max(
            tree.node(child),
            main_axis,
            tree.node(child).layout().computed_flex_basis,
            main_axis_owner_size,
        );
        let mut updated_main_size = child_flex_basis;

        if math::is_defined(line.remaining_free_space) && line.remaining_free_space < 0.0 {
            let flex_shrink_scaled_factor =
                -tree.node(child).resolve_flex_shrink(web_defaults) * child_flex_basis;
            if flex_shrink_scaled_factor != 0.0 {
                let child_size = if math::is_defined(line.total_flex_shrink_scaled_factors)
                    && line.total_flex_shrink_scaled_factors == 0.0
                {
                    child_flex_basis + flex_shrink_scaled_factor
                } else {
                    child_flex_basis
                        + (line.remaining_free_space / line.total_flex_shrink_scaled_factors)
                            * flex_shrink_scaled_factor
                };
                updated_main_size = bound_axis(
                    tree.node(child),
                    main_axis,
                    child_size,
                    available_inner_main_dim,
                    available_inner_width,
                );
            }
        } else if math::is_defined(line.remaining_free_space) && line.remaining_free_space > 0.0 {
            let flex_grow_factor = tree.node(child).resolve_flex_grow();
            if math::is_defined(flex_grow_factor) && flex_grow_factor != 0.0 {
                updated_main_size = bound_axis(
                    tree.node(child),
                    main_axis,
                    child_flex_basis
                        + line.remaining_free_space / line.total_flex_grow_factors
                            * flex_grow_factor,
                    available_inner_main_dim,
                    available_inner_width,
                );
            }
        }

        delta_free_space += updated_main_size - child_flex_basis;

        let margin_main = tree.node(child).margin_for_axis(main_axis, available_inner_width);
        let margin_cross = tree.node(child).margin_for_axis(cross_axis, available_inner_width);

        let mut child_main_size = updated_main_size + margin_main;
        let mut child_main_measure_mode = MeasureMode::Exactly;
        let mut child_cross_size;
        let mut child_cross_measure_mode;

        let aspect_ratio = tree.node(child).aspect_ratio();
        let margin_leading_auto =
            tree.node(child).margin_leading_value(cross_axis).unit == Unit::Auto;
        let margin_trailing_auto =
            tree.node(child).margin_trailing_value(cross_axis).unit == Unit::Auto;
        let cross_dim_defined =
            tree.node(child).is_style_dim_defined(cross_axis, available_inner_cross_dim);

        if math::is_defined(aspect_ratio) {
            child_cross_size = if is_main_axis_row {
                (child_main_size - margin_main) / aspect_ratio
            } else {
                (child_main_size - margin_main) * aspect_ratio
            };
            child_cross_measure_mode = MeasureMode::Exactly;
            child_cross_size += margin_cross;
        } else if math::is_defined(available_inner_cross_dim)
            && !cross_dim_defined
            && measure_mode_cross_dim == MeasureMode::Exactly
            && !(is_node_flex_wrap && main_axis_overflows)
            && align_item(tree, node, child) == Align::Stretch
            && !margin_leading_auto
            && !margin_trailing_auto
        {
            child_cross_size = available_inner_cross_dim;
            child_cross_measure_mode = MeasureMode::Exactly;
        } else if !cross_dim_defined {
            child_cross_size = available_inner_cross_dim;
            child_cross_measure_mode = if math::is_undefined(child_cross_size) {
                MeasureMode::Undefined
            } else {
                MeasureMode::AtMost
            };
        } else {
            let resolved_cross = tree.node(child).resolved_dimension(cross_axis.dimension());
            child_cross_size =
                math::resolve_value(resolved_cross, available_inner_cross_dim) + margin_cross;
            let is_loose_percentage_measurement = resolved_cross.unit == Unit::Percent
                && measure_mode_cross_dim != MeasureMode::Exactly;
            child_cross_measure_mode =
                if math::is_undefined(child_cross_size) || is_loose_percentage_measurement {
                    MeasureMode::Undefined
                } else {
                    MeasureMode::Exactly
                };
        }

        constrain_max_size_for_mode(
            tree.node(child),
            main_axis,
            available_inner_main_dim,
            available_inner_width,
            &mut child_main_measure_mode,
            &mut child_main_size,
        );
        constrain_max_size_for_mode(
            tree.node(child),
            cross_axis,
            available_inner_cross_dim,
            available_inner_width,
            &mut child_cross_measure_mode,
            &mut child_cross_size,
        );

        let requires_stretch_layout = !cross_dim_defined
            && align_item(tree, node, child) == Align::Stretch
            && !margin_leading_auto
            && !margin_trailing_auto;

        let child_width = if is_main_axis_row { child_main_size } else { child_cross_size };
        let child_height = if is_main_axis_row { child_cross_size } else { child_main_size };
        let child_width_measure_mode =
            if is_main_axis_row { child_main_measure_mode } else { child_cross_measure_mode };
        let child_height_measure_mode =
            if is_main_axis_row { child_cross_measure_mode } else { child_main_measure_mode };

        let is_layout_pass = perform_layout && !requires_stretch_layout;
        let direction = tree.node(node).layout().direction;
        cache::layout_node_internal(
            tree,
            child,
            child_width,
            child_height,
            direction,
            child_width_measure_mode,
            child_height_measure_mode,
            available_inner_width,
            available_inner_height,
            is_layout_pass,
        );
        let child_had_overflow = tree.node(child).layout().had_overflow;
        tree.node_mut(node).layout.had_overflow |= child_had_overflow;
    }

    delta_free_space
}

/// Two-pass flexible length resolution. A deliberate simplification of the
/// iterative procedure in the W3C spec: the first pass freezes min/max
/// violators, the second distributes what is left.
fn resolve_flexible_length(
    tree: &mut LayoutTree,
    node: NodeId,
    line: &mut FlexLine,
    main_axis: FlexDirection,
    cross_axis: FlexDirection,
    main_axis_owner_size: f32,
    available_inner_main_dim: f32,
    available_inner_cross_dim: f32,
    available_inner_width: f32,
    available_inner_height: f32,
    main_axis_overflows: bool,
    measure_mode_cross_dim: MeasureMode,
    perform_layout: bool,
) {
    let original_free_space = line.remaining_free_space;

    distribute_free_space_first_pass(
        tree,
        line,
        main_axis,
        main_axis_owner_size,
        available_inner_main_dim,
        available_inner_width,
    );

    let distributed_free_space = distribute_free_space_second_pass(
        tree,
        line,
        node,
        main_axis,
        cross_axis,
        main_axis_owner_size,
        available_inner_main_dim,
        available_inner_cross_dim,
        available_inner_width,
        available_inner_height,
        main_axis_overflows,
        measure_mode_cross_dim,
        perform_layout,
    );

    line.remaining_free_space = original_free_space - distributed_free_space;
}

// =============================================================================
// MAIN-AXIS JUSTIFICATION
// =============================================================================

fn justify_main_axis(
    tree: &mut LayoutTree,
    node: NodeId,
    line: &mut FlexLine,
    start_of_line_index: usize,
    main_axis: FlexDirection,
    cross_axis: FlexDirection,
    measure_mode_main_dim: MeasureMode,
    measure_mode_cross_dim: MeasureMode,
    main_axis_owner_size: f32,
    owner_width: f32,
    available_inner_main_dim: f32,
    available_inner_cross_dim: f32,
    available_inner_width: f32,
    perform_layout: bool,
) {
    let leading_padding_and_border_main =
        tree.node(node).leading_padding_and_border(main_axis, owner_width);
    let trailing_padding_and_border_main =
        tree.node(node).trailing_padding_and_border(main_axis, owner_width);
    let gap = tree.node(node).gap_for_axis(main_axis, owner_width);

    // An at-most constraint with leftover space: the min dimension, when
    // set, decides how much of that space the line actually keeps.
    if measure_mode_main_dim == MeasureMode::AtMost && line.remaining_free_space > 0.0 {
        let min_dim = math::resolve_value(
            tree.node(node).style().min_dimensions[main_axis.dimension().index()],
            main_axis_owner_size,
        );
        if math::is_defined(min_dim) {
            let min_available_main_dim =
                min_dim - leading_padding_and_border_main - trailing_padding_and_border_main;
            let occupied_space_by_child_nodes =
                available_inner_main_dim - line.remaining_free_space;
            line.remaining_free_space =
                math::float_max(0.0, min_available_main_dim - occupied_space_by_child_nodes);
        } else {
            line.remaining_free_space = 0.0;
        }
    }

    let mut number_of_auto_margins_on_current_line = 0;
    for i in start_of_line_index..line.end_of_line_index {
        let child = tree.child(node, i);
        if tree.node(child).style().position_type != PositionType::Absolute {
            if tree.node(child).margin_leading_value(main_axis).unit == Unit::Auto {
                number_of_auto_margins_on_current_line += 1;
            }
            if tree.node(child).margin_trailing_value(main_axis).unit == Unit::Auto {
                number_of_auto_margins_on_current_line += 1;
            }
        }
    }

    // Auto margins absorb all the free space, so justification only applies
    // without them.
    let mut leading_main_dim = 0.0;
    let mut between_main_dim = gap;
    if number_of_auto_margins_on_current_line == 0 {
        match tree.node(node).style().justify_content {
            Justify::Center => leading_main_dim = line.remaining_free_space / 2.0,
            Justify::FlexEnd => leading_main_dim = line.remaining_free_space,
            Justify::SpaceBetween => {
                if line.items_on_line > 1 {
                    between_main_dim += math::float_max(line.remaining_free_space, 0.0)
                        / (line.items_on_line - 1) as f32;
                }
            }
            Justify::SpaceEvenly => {
                leading_main_dim = line.remaining_free_space / (line.items_on_line + 1) as f32;
                between_main_dim += leading_main_dim;
            }
            Justify::SpaceAround => {
                leading_main_dim = 0.5 * line.remaining_free_space / line.items_on_line as f32;
                between_main_dim += leading_main_dim * 2.0;
            }
            Justify::FlexStart => {}
        }
    }

    line.main_dim = leading_padding_and_border_main + leading_main_dim;
    line.cross_dim = 0.0;

    let mut max_ascent_for_current_line = 0.0;
    let mut max_descent_for_current_line = 0.0;
    let is_node_baseline_layout = is_baseline_layout(tree, node);
    let main_leading_index = main_axis.leading_edge().physical_index();

    for i in start_of_line_index..line.end_of_line_index {
        let child = tree.child(node, i);
        let is_last_child = i == line.end_of_line_index - 1;
        // The last element of the line carries no trailing gap.
        if is_last_child {
            between_main_dim -= gap;
        }
        if tree.node(child).style().display == Display::None {
            continue;
        }

        let position_type = tree.node(child).style().position_type;
        if position_type == PositionType::Absolute
            && tree.node(child).is_leading_position_defined(main_axis)
        {
            if perform_layout {
                // A defined inset overrides the position computed so far.
                let position = tree.node(child).leading_position(main_axis, available_inner_main_dim)
                    + tree.node(node).leading_border(main_axis)
                    + tree.node(child).leading_margin(main_axis, available_inner_width);
                tree.node_mut(child).layout.position[main_leading_index] = position;
            }
        } else if position_type != PositionType::Absolute {
            if tree.node(child).margin_leading_value(main_axis).unit == Unit::Auto {
                line.main_dim +=
                    line.remaining_free_space / number_of_auto_margins_on_current_line as f32;
            }
            if perform_layout {
                let updated = tree.node(child).layout().position[main_leading_index] + line.main_dim;
                tree.node_mut(child).layout.position[main_leading_index] = updated;
            }
            if tree.node(child).margin_trailing_value(main_axis).unit == Unit::Auto {
                line.main_dim +=
                    line.remaining_free_space / number_of_auto_margins_on_current_line as f32;
            }

            let can_skip_flex = !perform_layout && measure_mode_cross_dim == MeasureMode::Exactly;
            if can_skip_flex {
                // In this case the flex basis was already computed and the
                // cross dimension is set by the container.
                line.main_dim += between_main_dim
                    + tree.node(child).margin_for_axis(main_axis, available_inner_width)
                    + tree.node(child).layout().computed_flex_basis;
                line.cross_dim = available_inner_cross_dim;
            } else {
                line.main_dim +=
                    between_main_dim + dim_with_margin(tree.node(child), main_axis, available_inner_width);
                if is_node_baseline_layout {
                    let ascent = baseline(tree, child)
                        + tree
                            .node(child)
                            .leading_margin(FlexDirection::Column, available_inner_width);
                    let descent = tree.node(child).layout().measured_dimensions
                        [Dimension::Height.index()]
                        + tree
                            .node(child)
                            .margin_for_axis(FlexDirection::Column, available_inner_width)
                        - ascent;
                    max_ascent_for_current_line =
                        math::float_max(max_ascent_for_current_line, ascent);
                    max_descent_for_current_line =
                        math::float_max(max_descent_for_current_line, descent);
                } else {
                    line.cross_dim = math::float_max(
                        line.cross_dim,
                        dim_with_margin(tree.node(child), cross_axis, available_inner_width),
                    );
                }
            }
        } else if perform_layout {
            let updated = tree.node(child).layout().position[main_leading_index]
                + tree.node(node).leading_border(main_axis)
                + leading_main_dim;
            tree.node_mut(child).layout.position[main_leading_index] = updated;
        }
    }

    line.main_dim += trailing_padding_and_border_main;

    if is_node_baseline_layout {
        line.cross_dim = max_ascent_for_current_line + max_descent_for_current_line;
    }
}

// =============================================================================
// LEAF AND FAST-PATH MEASUREMENT
// =============================================================================

fn with_measure_func_set_measured_dimensions(
    tree: &mut LayoutTree,
    node: NodeId,
    available_width: f32,
    available_height: f32,
    width_measure_mode: MeasureMode,
    height_measure_mode: MeasureMode,
    owner_width: f32,
    owner_height: f32,
) {
    let Some(measure) = tree.node(node).measure.clone() else {
        config::assert_fatal(
            tree.node_config(node),
            false,
            "Expected node to have custom measure function",
        );
        unreachable!()
    };

    let available_width = if width_measure_mode == MeasureMode::Undefined {
        math::UNDEFINED
    } else {
        available_width
    };
    let available_height = if height_measure_mode == MeasureMode::Undefined {
        math::UNDEFINED
    } else {
        available_height
    };

    let (padding_and_border_axis_row, padding_and_border_axis_column) = {
        let layout = tree.node(node).layout();
        (
            layout.padding[Edge::Left.physical_index()]
                + layout.padding[Edge::Right.physical_index()]
                + layout.border[Edge::Left.physical_index()]
                + layout.border[Edge::Right.physical_index()],
            layout.padding[Edge::Top.physical_index()]
                + layout.padding[Edge::Bottom.physical_index()]
                + layout.border[Edge::Top.physical_index()]
                + layout.border[Edge::Bottom.physical_index()],
        )
    };

    // Never call measure with a negative size.
    let inner_width = if math::is_undefined(available_width) {
        available_width
    } else {
        math::float_max(0.0, available_width - padding_and_border_axis_row)
    };
    let inner_height = if math::is_undefined(available_height) {
        available_height
    } else {
        math::float_max(0.0, available_height - padding_and_border_axis_column)
    };

    if width_measure_mode == MeasureMode::Exactly && height_measure_mode == MeasureMode::Exactly {
        // Both dimensions are already pinned; no need to measure content.
        let width =
            bound_axis(tree.node(node), FlexDirection::Row, available_width, owner_width, owner_width);
        let height = bound_axis(
            tree.node(node),
            FlexDirection::Column,
            available_height,
            owner_height,
            owner_width,
        );
        let layout = &mut tree.node_mut(node).layout;
        layout.measured_dimensions[Dimension::Width.index()] = width;
        layout.measured_dimensions[Dimension::Height.index()] = height;
    } else {
        let size = measure.borrow_mut().measure(
            node,
            inner_width,
            width_measure_mode,
            inner_height,
            height_measure_mode,
        );
        config::assert_fatal(
            tree.node_config(node),
            math::is_defined(size.width) && math::is_defined(size.height),
            "Measure function returned invalid dimensions: width and height must be defined",
        );

        let width = bound_axis(
            tree.node(node),
            FlexDirection::Row,
            if width_measure_mode == MeasureMode::Undefined
                || width_measure_mode == MeasureMode::AtMost
            {
                size.width + padding_and_border_axis_row
            } else {
                available_width
            },
            owner_width,
            owner_width,
        );
        let height = bound_axis(
            tree.node(node),
            FlexDirection::Column,
            if height_measure_mode == MeasureMode::Undefined
                || height_measure_mode == MeasureMode::AtMost
            {
                size.height + padding_and_border_axis_column
            } else {
                available_height
            },
            owner_height,
            owner_width,
        );
        let layout = &mut tree.node_mut(node).layout;
        layout.measured_dimensions[Dimension::Width.index()] = width;
        layout.measured_dimensions[Dimension::Height.index()] = height;
    }
}

/// A container without children sizes to its padding and border unless it is
/// constrained exactly.
fn empty_container_set_measured_dimensions(
    tree: &mut LayoutTree,
    node: NodeId,
    available_width: f32,
    available_height: f32,
    width_measure_mode: MeasureMode,
    height_measure_mode: MeasureMode,
    owner_width: f32,
    owner_height: f32,
) {
    let padding_and_border_axis_row =
        padding_and_border_for_axis(tree.node(node), FlexDirection::Row, owner_width);
    let padding_and_border_axis_column =
        padding_and_border_for_axis(tree.node(node), FlexDirection::Column, owner_width);

    let width = bound_axis(
        tree.node(node),
        FlexDirection::Row,
        if width_measure_mode == MeasureMode::Undefined
            || width_measure_mode == MeasureMode::AtMost
        {
            padding_and_border_axis_row
        } else {
            available_width
        },
        owner_width,
        owner_width,
    );
    let height = bound_axis(
        tree.node(node),
        FlexDirection::Column,
        if height_measure_mode == MeasureMode::Undefined
            || height_measure_mode == MeasureMode::AtMost
        {
            padding_and_border_axis_column
        } else {
            available_height
        },
        owner_height,
        owner_width,
    );

    let layout = &mut tree.node_mut(node).layout;
    layout.measured_dimensions[Dimension::Width.index()] = width;
    layout.measured_dimensions[Dimension::Height.index()] = height;
}

/// Measurement-only fast path for containers whose size is already decided
/// by the constraints. Returns true when it applied.
fn fixed_size_set_measured_dimensions(
    tree: &mut LayoutTree,
    node: NodeId,
    available_width: f32,
    available_height: f32,
    width_measure_mode: MeasureMode,
    height_measure_mode: MeasureMode,
    owner_width: f32,
    owner_height: f32,
) -> bool {
    let collapsed_width = math::is_defined(available_width)
        && width_measure_mode == MeasureMode::AtMost
        && available_width <= 0.0;
    let collapsed_height = math::is_defined(available_height)
        && height_measure_mode == MeasureMode::AtMost
        && available_height <= 0.0;
    let both_exact = width_measure_mode == MeasureMode::Exactly
        && height_measure_mode == MeasureMode::Exactly;

    if !collapsed_width && !collapsed_height && !both_exact {
        return false;
    }

    let width = bound_axis(
        tree.node(node),
        FlexDirection::Row,
        if math::is_undefined(available_width)
            || (width_measure_mode == MeasureMode::AtMost && available_width < 0.0)
        {
            0.0
        } else {
            available_width
        },
        owner_width,
        owner_width,
    );
    let height = bound_axis(
        tree.node(node),
        FlexDirection::Column,
        if math::is_undefined(available_height)
            || (height_measure_mode == MeasureMode::AtMost && available_height < 0.0)
        {
            0.0
        } else {
            available_height
        },
        owner_height,
        owner_width,
    );

    let layout = &mut tree.node_mut(node).layout;
    layout.measured_dimensions[Dimension::Width.index()] = width;
    layout.measured_dimensions[Dimension::Height.index()] = height;
    true
}

// =============================================================================
// LAYOUT PASS
// =============================================================================

/// One full layout or measurement pass over `node`.
///
/// With `perform_layout` false only the measured dimensions are produced;
/// with it true the children's positions are written as well. Inputs are the
/// available space (margins included) and a constraint mode per axis; an
/// undefined available size must come with an undefined mode.
pub(super) fn layout_impl(
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
) {
    config::assert_fatal(
        tree.node_config(node),
        math::is_defined(available_width) || width_measure_mode == MeasureMode::Undefined,
        "availableWidth is indefinite so widthMeasureMode must be MeasureMode::Undefined",
    );
    config::assert_fatal(
        tree.node_config(node),
        math::is_defined(available_height) || height_measure_mode == MeasureMode::Undefined,
        "availableHeight is indefinite so heightMeasureMode must be MeasureMode::Undefined",
    );

    let direction = tree.node(node).resolve_direction(owner_direction);

    // Resolved margin, border and padding go into the layout output up
    // front; start/end map through the resolved direction.
    let flex_row_direction = FlexDirection::Row.resolve(direction);
    let flex_column_direction = FlexDirection::Column.resolve(direction);
    let start_edge = if direction == Direction::Rtl { Edge::Right } else { Edge::Left };
    let end_edge = if direction == Direction::Rtl { Edge::Left } else { Edge::Right };

    let margin_row_leading = tree.node(node).leading_margin(flex_row_direction, owner_width);
    let margin_row_trailing = tree.node(node).trailing_margin(flex_row_direction, owner_width);
    let margin_column_leading = tree.node(node).leading_margin(flex_column_direction, owner_width);
    let margin_column_trailing =
        tree.node(node).trailing_margin(flex_column_direction, owner_width);

    let border_row_leading = tree.node(node).leading_border(flex_row_direction);
    let border_row_trailing = tree.node(node).trailing_border(flex_row_direction);
    let border_column_leading = tree.node(node).leading_border(flex_column_direction);
    let border_column_trailing = tree.node(node).trailing_border(flex_column_direction);

    let padding_row_leading = tree.node(node).leading_padding(flex_row_direction, owner_width);
    let padding_row_trailing = tree.node(node).trailing_padding(flex_row_direction, owner_width);
    let padding_column_leading =
        tree.node(node).leading_padding(flex_column_direction, owner_width);
    let padding_column_trailing =
        tree.node(node).trailing_padding(flex_column_direction, owner_width);

    {
        let layout = &mut tree.node_mut(node).layout;
        layout.direction = direction;
        layout.margin[start_edge.physical_index()] = margin_row_leading;
        layout.margin[end_edge.physical_index()] = margin_row_trailing;
        layout.margin[Edge::Top.physical_index()] = margin_column_leading;
        layout.margin[Edge::Bottom.physical_index()] = margin_column_trailing;
        layout.border[start_edge.physical_index()] = border_row_leading;
        layout.border[end_edge.physical_index()] = border_row_trailing;
        layout.border[Edge::Top.physical_index()] = border_column_leading;
        layout.border[Edge::Bottom.physical_index()] = border_column_trailing;
        layout.padding[start_edge.physical_index()] = padding_row_leading;
        layout.padding[end_edge.physical_index()] = padding_row_trailing;
        layout.padding[Edge::Top.physical_index()] = padding_column_leading;
        layout.padding[Edge::Bottom.physical_index()] = padding_column_trailing;
    }

    let margin_axis_row = margin_row_leading + margin_row_trailing;
    let margin_axis_column = margin_column_leading + margin_column_trailing;

    if tree.node(node).has_measure_func() {
        with_measure_func_set_measured_dimensions(
            tree,
            node,
            available_width - margin_axis_row,
            available_height - margin_axis_column,
            width_measure_mode,
            height_measure_mode,
            owner_width,
            owner_height,
        );
        return;
    }

    let child_count = tree.child_count(node);
    if child_count == 0 {
        empty_container_set_measured_dimensions(
            tree,
            node,
            available_width - margin_axis_row,
            available_height - margin_axis_column,
            width_measure_mode,
            height_measure_mode,
            owner_width,
            owner_height,
        );
        return;
    }

    if !perform_layout
        && fixed_size_set_measured_dimensions(
            tree,
            node,
            available_width - margin_axis_row,
            available_height - margin_axis_column,
            width_measure_mode,
            height_measure_mode,
            owner_width,
            owner_height,
        )
    {
        return;
    }

    // Children laid out here get written to; clone the ones shared with
    // another tree first.
    tree.clone_children_if_needed(node);
    tree.node_mut(node).layout.had_overflow = false;

    // STEP 1: CALCULATE VALUES FOR REMAINDER OF ALGORITHM
    let main_axis = tree.node(node).style().flex_direction.resolve(direction);
    let cross_axis = main_axis.cross(direction);
    let is_main_axis_row = main_axis.is_row();
    let is_node_flex_wrap = tree.node(node).style().flex_wrap != Wrap::NoWrap;

    let main_axis_owner_size = if is_main_axis_row { owner_width } else { owner_height };
    let cross_axis_owner_size = if is_main_axis_row { owner_height } else { owner_width };

    let padding_and_border_axis_main =
        padding_and_border_for_axis(tree.node(node), main_axis, owner_width);
    let leading_padding_and_border_cross =
        tree.node(node).leading_padding_and_border(cross_axis, owner_width);
    let padding_and_border_axis_cross =
        padding_and_border_for_axis(tree.node(node), cross_axis, owner_width);

    let mut measure_mode_main_dim =
        if is_main_axis_row { width_measure_mode } else { height_measure_mode };
    let measure_mode_cross_dim =
        if is_main_axis_row { height_measure_mode } else { width_measure_mode };

    let padding_and_border_axis_row = if is_main_axis_row {
        padding_and_border_axis_main
    } else {
        padding_and_border_axis_cross
    };
    let padding_and_border_axis_column = if is_main_axis_row {
        padding_and_border_axis_cross
    } else {
        padding_and_border_axis_main
    };

    // STEP 2: DETERMINE AVAILABLE SIZE IN MAIN AND CROSS DIRECTIONS
    let available_inner_width = calculate_available_inner_dim(
        tree.node(node),
        Dimension::Width,
        available_width - margin_axis_row,
        padding_and_border_axis_row,
        owner_width,
    );
    let available_inner_height = calculate_available_inner_dim(
        tree.node(node),
        Dimension::Height,
        available_height - margin_axis_column,
        padding_and_border_axis_column,
        owner_height,
    );

    let mut available_inner_main_dim =
        if is_main_axis_row { available_inner_width } else { available_inner_height };
    let available_inner_cross_dim =
        if is_main_axis_row { available_inner_height } else { available_inner_width };

    // STEP 3: DETERMINE FLEX BASIS FOR EACH ITEM
    let mut total_main_dim = compute_flex_basis_for_children(
        tree,
        node,
        available_inner_width,
        available_inner_height,
        width_measure_mode,
        height_measure_mode,
        direction,
        main_axis,
        perform_layout,
    );
    if child_count > 1 {
        total_main_dim += tree.node(node).gap_for_axis(main_axis, available_inner_cross_dim)
            * (child_count - 1) as f32;
    }

    let main_axis_overflows = measure_mode_main_dim != MeasureMode::Undefined
        && total_main_dim > available_inner_main_dim;
    if is_node_flex_wrap && main_axis_overflows && measure_mode_main_dim == MeasureMode::AtMost {
        measure_mode_main_dim = MeasureMode::Exactly;
    }

    // STEP 4: COLLECT FLEX ITEMS INTO FLEX LINES
    let mut start_of_line_index = 0;
    let mut end_of_line_index = 0;
    let mut line_count = 0;
    let mut total_line_cross_dim = 0.0;
    let cross_axis_gap = tree.node(node).gap_for_axis(cross_axis, available_inner_cross_dim);
    let mut max_line_main_dim = 0.0;

    while end_of_line_index < child_count {
        let mut line = calculate_collect_flex_items_row_values(
            tree,
            node,
            owner_direction,
            main_axis_owner_size,
            available_inner_width,
            available_inner_main_dim,
            start_of_line_index,
            line_count,
        );
        end_of_line_index = line.end_of_line_index;

        // STEP 5: RESOLVING FLEXIBLE LENGTHS ON MAIN AXIS
        // When just measuring with an exact cross constraint, flexing can be
        // skipped; the flex bases already decide the content size.
        let can_skip_flex = !perform_layout && measure_mode_cross_dim == MeasureMode::Exactly;

        let mut size_based_on_content = false;
        if measure_mode_main_dim != MeasureMode::Exactly {
            let (min_inner_main_dim, max_inner_main_dim) = {
                let style = tree.node(node).style();
                let min_inner_width =
                    math::resolve_value(style.min_dimensions[Dimension::Width.index()], owner_width)
                        - padding_and_border_axis_row;
                let max_inner_width =
                    math::resolve_value(style.max_dimensions[Dimension::Width.index()], owner_width)
                        - padding_and_border_axis_row;
                let min_inner_height = math::resolve_value(
                    style.min_dimensions[Dimension::Height.index()],
                    owner_height,
                ) - padding_and_border_axis_column;
                let max_inner_height = math::resolve_value(
                    style.max_dimensions[Dimension::Height.index()],
                    owner_height,
                ) - padding_and_border_axis_column;
                if is_main_axis_row {
                    (min_inner_width, max_inner_width)
                } else {
                    (min_inner_height, max_inner_height)
                }
            };

            if math::is_defined(min_inner_main_dim)
                && line.size_consumed_on_current_line < min_inner_main_dim
            {
                available_inner_main_dim = min_inner_main_dim;
            } else if math::is_defined(max_inner_main_dim)
                && line.size_consumed_on_current_line > max_inner_main_dim
            {
                available_inner_main_dim = max_inner_main_dim;
            } else {
                let use_legacy_stretch_behaviour =
                    tree.node_config(node).has_errata(Errata::STRETCH_FLEX_BASIS);
                if !use_legacy_stretch_behaviour
                    && ((math::is_defined(line.total_flex_grow_factors)
                        && line.total_flex_grow_factors == 0.0)
                        || (math::is_defined(tree.node(node).resolve_flex_grow())
                            && tree.node(node).resolve_flex_grow() == 0.0))
                {
                    // Nothing can flex here: the space already consumed is
                    // all the space this line needs.
                    available_inner_main_dim = line.size_consumed_on_current_line;
                }
                size_based_on_content = !use_legacy_stretch_behaviour;
            }
        }

        if !size_based_on_content && math::is_defined(available_inner_main_dim) {
            line.remaining_free_space =
                available_inner_main_dim - line.size_consumed_on_current_line;
        } else if line.size_consumed_on_current_line < 0.0 {
            // Content sizing with a negative consumed size: the line gets
            // zero points, so the free space is the negation.
            line.remaining_free_space = -line.size_consumed_on_current_line;
        }

        if !can_skip_flex {
            resolve_flexible_length(
                tree,
                node,
                &mut line,
                main_axis,
                cross_axis,
                main_axis_owner_size,
                available_inner_main_dim,
                available_inner_cross_dim,
                available_inner_width,
                available_inner_height,
                main_axis_overflows,
                measure_mode_cross_dim,
                perform_layout,
            );
        }

        let line_overflow = line.remaining_free_space < 0.0;
        tree.node_mut(node).layout.had_overflow |= line_overflow;

        // STEP 6: MAIN-AXIS JUSTIFICATION AND CROSS-AXIS SIZE DETERMINATION
        justify_main_axis(
            tree,
            node,
            &mut line,
            start_of_line_index,
            main_axis,
            cross_axis,
            measure_mode_main_dim,
            measure_mode_cross_dim,
            main_axis_owner_size,
            owner_width,
            available_inner_main_dim,
            available_inner_cross_dim,
            available_inner_width,
            perform_layout,
        );

        let mut container_cross_axis = available_inner_cross_dim;
        if measure_mode_cross_dim == MeasureMode::Undefined
            || measure_mode_cross_dim == MeasureMode::AtMost
        {
            // The cross size comes from the largest child on the line.
            container_cross_axis = bound_axis(
                tree.node(node),
                cross_axis,
                line.cross_dim + padding_and_border_axis_cross,
                cross_axis_owner_size,
                owner_width,
            ) - padding_and_border_axis_cross;
        }

        // Without wrapping, an exactly constrained cross axis is decided by
        // the container.
        if !is_node_flex_wrap && measure_mode_cross_dim == MeasureMode::Exactly {
            line.cross_dim = available_inner_cross_dim;
        }

        line.cross_dim = bound_axis(
            tree.node(node),
            cross_axis,
            line.cross_dim + padding_and_border_axis_cross,
            cross_axis_owner_size,
            owner_width,
        ) - padding_and_border_axis_cross;

        // STEP 7: CROSS-AXIS ALIGNMENT
        if perform_layout {
            for i in start_of_line_index..end_of_line_index {
                let child = tree.child(node, i);
                if tree.node(child).style().display == Display::None {
                    continue;
                }
                let cross_leading_index = cross_axis.leading_edge().physical_index();
                if tree.node(child).style().position_type == PositionType::Absolute {
                    // A defined inset overrides the position computed so far;
                    // otherwise the child sits at border plus margin.
                    let is_child_leading_pos_defined =
                        tree.node(child).is_leading_position_defined(cross_axis);
                    if is_child_leading_pos_defined {
                        let position = tree
                            .node(child)
                            .leading_position(cross_axis, available_inner_cross_dim)
                            + tree.node(node).leading_border(cross_axis)
                            + tree.node(child).leading_margin(cross_axis, available_inner_width);
                        tree.node_mut(child).layout.position[cross_leading_index] = position;
                    }
                    let current = tree.node(child).layout().position[cross_leading_index];
                    if !is_child_leading_pos_defined || math::is_undefined(current) {
                        let position = tree.node(node).leading_border(cross_axis)
                            + tree.node(child).leading_margin(cross_axis, available_inner_width);
                        tree.node_mut(child).layout.position[cross_leading_index] = position;
                    }
                } else {
                    let mut leading_cross_dim = leading_padding_and_border_cross;
                    let align = align_item(tree, node, child);
                    let margin_leading_auto =
                        tree.node(child).margin_leading_value(cross_axis).unit == Unit::Auto;
                    let margin_trailing_auto =
                        tree.node(child).margin_trailing_value(cross_axis).unit == Unit::Auto;

                    if align == Align::Stretch && !margin_leading_auto && !margin_trailing_auto {
                        // Stretch needs one more layout with the cross size
                        // forced to the line's cross size, unless the child
                        // pins its own cross dimension.
                        if !tree
                            .node(child)
                            .is_style_dim_defined(cross_axis, available_inner_cross_dim)
                        {
                            let mut child_main_size = tree.node(child).layout().measured_dimensions
                                [main_axis.dimension().index()];
                            let aspect_ratio = tree.node(child).aspect_ratio();
                            let mut child_cross_size = if math::is_defined(aspect_ratio) {
                                tree.node(child).margin_for_axis(cross_axis, available_inner_width)
                                    + if is_main_axis_row {
                                        child_main_size / aspect_ratio
                                    } else {
                                        child_main_size * aspect_ratio
                                    }
                            } else {
                                line.cross_dim
                            };
                            child_main_size +=
                                tree.node(child).margin_for_axis(main_axis, available_inner_width);

                            let mut child_main_measure_mode = MeasureMode::Exactly;
                            let mut child_cross_measure_mode = MeasureMode::Exactly;
                            constrain_max_size_for_mode(
                                tree.node(child),
                                main_axis,
                                available_inner_main_dim,
                                available_inner_width,
                                &mut child_main_measure_mode,
                                &mut child_main_size,
                            );
                            constrain_max_size_for_mode(
                                tree.node(child),
                                cross_axis,
                                available_inner_cross_dim,
                                available_inner_width,
                                &mut child_cross_measure_mode,
                                &mut child_cross_size,
                            );

                            let child_width =
                                if is_main_axis_row { child_main_size } else { child_cross_size };
                            let child_height =
                                if is_main_axis_row { child_cross_size } else { child_main_size };

                            let align_content = tree.node(node).style().align_content;
                            let cross_axis_does_not_grow =
                                align_content != Align::Stretch && is_node_flex_wrap;
                            let child_width_measure_mode = if math::is_undefined(child_width)
                                || (!is_main_axis_row && cross_axis_does_not_grow)
                            {
                                MeasureMode::Undefined
                            } else {
                                MeasureMode::Exactly
                            };
                            let child_height_measure_mode = if math::is_undefined(child_height)
                                || (is_main_axis_row && cross_axis_does_not_grow)
                            {
                                MeasureMode::Undefined
                            } else {
                                MeasureMode::Exactly
                            };

                            cache::layout_node_internal(
                                tree,
                                child,
                                child_width,
                                child_height,
                                direction,
                                child_width_measure_mode,
                                child_height_measure_mode,
                                available_inner_width,
                                available_inner_height,
                                true,
                            );
                        }
                    } else {
                        let remaining_cross_dim = container_cross_axis
                            - dim_with_margin(tree.node(child), cross_axis, available_inner_width);

                        if margin_leading_auto && margin_trailing_auto {
                            leading_cross_dim += math::float_max(0.0, remaining_cross_dim / 2.0);
                        } else if margin_trailing_auto {
                            // The trailing auto margin absorbs the space.
                        } else if margin_leading_auto {
                            leading_cross_dim += math::float_max(0.0, remaining_cross_dim);
                        } else if align == Align::FlexStart {
                        } else if align == Align::Center {
                            leading_cross_dim += remaining_cross_dim / 2.0;
                        } else {
                            leading_cross_dim += remaining_cross_dim;
                        }
                    }
                    let updated = tree.node(child).layout().position[cross_leading_index]
                        + total_line_cross_dim
                        + leading_cross_dim;
                    tree.node_mut(child).layout.position[cross_leading_index] = updated;
                }
            }
        }

        let applied_cross_gap = if line_count != 0 { cross_axis_gap } else { 0.0 };
        total_line_cross_dim += line.cross_dim + applied_cross_gap;
        max_line_main_dim = math::float_max(max_line_main_dim, line.main_dim);

        line_count += 1;
        start_of_line_index = end_of_line_index;
    }

    // STEP 8: MULTI-LINE CONTENT ALIGNMENT
    if perform_layout && (is_node_flex_wrap || is_baseline_layout(tree, node)) {
        let mut cross_dim_lead = 0.0;
        let mut current_lead = leading_padding_and_border_cross;
        if math::is_defined(available_inner_cross_dim) {
            let remaining_align_content_dim = available_inner_cross_dim - total_line_cross_dim;
            match tree.node(node).style().align_content {
                Align::FlexEnd => current_lead += remaining_align_content_dim,
                Align::Center => current_lead += remaining_align_content_dim / 2.0,
                Align::Stretch => {
                    if available_inner_cross_dim > total_line_cross_dim {
                        cross_dim_lead = remaining_align_content_dim / line_count as f32;
                    }
                }
                Align::SpaceAround => {
                    if available_inner_cross_dim > total_line_cross_dim {
                        current_lead += remaining_align_content_dim / (2.0 * line_count as f32);
                        if line_count > 1 {
                            cross_dim_lead = remaining_align_content_dim / line_count as f32;
                        }
                    } else {
                        current_lead += remaining_align_content_dim / 2.0;
                    }
                }
                Align::SpaceBetween => {
                    if available_inner_cross_dim > total_line_cross_dim && line_count > 1 {
                        cross_dim_lead = remaining_align_content_dim / (line_count - 1) as f32;
                    }
                }
                _ => {}
            }
        }

        let mut end_index = 0;
        for i in 0..line_count {
            let start_index = end_index;

            // The line's height and the index one past its last child.
            let mut line_height = 0.0;
            let mut max_ascent_for_current_line = 0.0;
            let mut max_descent_for_current_line = 0.0;
            let mut ii = start_index;
            while ii < child_count {
                let child = tree.child(node, ii);
                if tree.node(child).style().display == Display::None {
                    ii += 1;
                    continue;
                }
                if tree.node(child).style().position_type != PositionType::Absolute {
                    if tree.node(child).line_index != i {
                        break;
                    }
                    if tree.node(child).is_layout_dim_defined(cross_axis) {
                        line_height = math::float_max(
                            line_height,
                            tree.node(child).layout().measured_dimensions
                                [cross_axis.dimension().index()]
                                + tree
                                    .node(child)
                                    .margin_for_axis(cross_axis, available_inner_width),
                        );
                    }
                    if align_item(tree, node, child) == Align::Baseline {
                        let ascent = baseline(tree, child)
                            + tree
                                .node(child)
                                .leading_margin(FlexDirection::Column, available_inner_width);
                        let descent = tree.node(child).layout().measured_dimensions
                            [Dimension::Height.index()]
                            + tree
                                .node(child)
                                .margin_for_axis(FlexDirection::Column, available_inner_width)
                            - ascent;
                        max_ascent_for_current_line =
                            math::float_max(max_ascent_for_current_line, ascent);
                        max_descent_for_current_line =
                            math::float_max(max_descent_for_current_line, descent);
                        line_height = math::float_max(
                            line_height,
                            max_ascent_for_current_line + max_descent_for_current_line,
                        );
                    }
                }
                ii += 1;
            }
            end_index = ii;
            line_height += cross_dim_lead;
            current_lead += if i != 0 { cross_axis_gap } else { 0.0 };

            for ii in start_index..end_index {
                let child = tree.child(node, ii);
                if tree.node(child).style().display == Display::None {
                    continue;
                }
                if tree.node(child).style().position_type == PositionType::Absolute {
                    continue;
                }
                let cross_leading_index = cross_axis.leading_edge().physical_index();
                match align_item(tree, node, child) {
                    Align::FlexStart => {
                        let position = current_lead
                            + tree.node(child).leading_margin(cross_axis, available_inner_width);
                        tree.node_mut(child).layout.position[cross_leading_index] = position;
                    }
                    Align::FlexEnd => {
                        let position = current_lead + line_height
                            - tree.node(child).trailing_margin(cross_axis, available_inner_width)
                            - tree.node(child).layout().measured_dimensions
                                [cross_axis.dimension().index()];
                        tree.node_mut(child).layout.position[cross_leading_index] = position;
                    }
                    Align::Center => {
                        let child_height = tree.node(child).layout().measured_dimensions
                            [cross_axis.dimension().index()];
                        let position = current_lead + (line_height - child_height) / 2.0;
                        tree.node_mut(child).layout.position[cross_leading_index] = position;
                    }
                    Align::Stretch => {
                        let position = current_lead
                            + tree.node(child).leading_margin(cross_axis, available_inner_width);
                        tree.node_mut(child).layout.position[cross_leading_index] = position;

                        // The child was measured against the container's
                        // cross size; remeasure against the line height.
                        if !tree
                            .node(child)
                            .is_style_dim_defined(cross_axis, available_inner_cross_dim)
                        {
                            let measured_width = tree.node(child).layout().measured_dimensions
                                [Dimension::Width.index()];
                            let measured_height = tree.node(child).layout().measured_dimensions
                                [Dimension::Height.index()];
                            let child_width = if is_main_axis_row {
                                measured_width
                                    + tree
                                        .node(child)
                                        .margin_for_axis(main_axis, available_inner_width)
                            } else {
                                line_height
                            };
                            let child_height = if !is_main_axis_row {
                                measured_height
                                    + tree
                                        .node(child)
                                        .margin_for_axis(cross_axis, available_inner_width)
                            } else {
                                line_height
                            };

                            if !(math::floats_equal(child_width, measured_width)
                                && math::floats_equal(child_height, measured_height))
                            {
                                cache::layout_node_internal(
                                    tree,
                                    child,
                                    child_width,
                                    child_height,
                                    direction,
                                    MeasureMode::Exactly,
                                    MeasureMode::Exactly,
                                    available_inner_width,
                                    available_inner_height,
                                    true,
                                );
                            }
                        }
                    }
                    Align::Baseline => {
                        let position = current_lead + max_ascent_for_current_line
                            - baseline(tree, child)
                            + tree
                                .node(child)
                                .leading_position(FlexDirection::Column, available_inner_cross_dim);
                        tree.node_mut(child).layout.position[Edge::Top.physical_index()] = position;
                    }
                    _ => {}
                }
            }
            current_lead += line_height;
        }
    }

    // STEP 9: COMPUTING FINAL DIMENSIONS
    let measured_width = bound_axis(
        tree.node(node),
        FlexDirection::Row,
        available_width - margin_axis_row,
        owner_width,
        owner_width,
    );
    let measured_height = bound_axis(
        tree.node(node),
        FlexDirection::Column,
        available_height - margin_axis_column,
        owner_height,
        owner_width,
    );
    {
        let layout = &mut tree.node_mut(node).layout;
        layout.measured_dimensions[Dimension::Width.index()] = measured_width;
        layout.measured_dimensions[Dimension::Height.index()] = measured_height;
    }

    // Without an exact main constraint (and without scrolling), the content
    // decides the main dimension, clamped to min/max and padding.
    let overflow = tree.node(node).style().overflow;
    if measure_mode_main_dim == MeasureMode::Undefined
        || (overflow != Overflow::Scroll && measure_mode_main_dim == MeasureMode::AtMost)
    {
        let bounded = bound_axis(
            tree.node(node),
            main_axis,
            max_line_main_dim,
            main_axis_owner_size,
            owner_width,
        );
        tree.node_mut(node).layout.measured_dimensions[main_axis.dimension().index()] = bounded;
    } else if measure_mode_main_dim == MeasureMode::AtMost && overflow == Overflow::Scroll {
        let bounded = math::float_max(
            math::float_min(
                available_inner_main_dim + padding_and_border_axis_main,
                bound_axis_within_min_and_max(
                    tree.node(node),
                    main_axis,
                    max_line_main_dim,
                    main_axis_owner_size,
                ),
            ),
            padding_and_border_axis_main,
        );
        tree.node_mut(node).layout.measured_dimensions[main_axis.dimension().index()] = bounded;
    }

    if measure_mode_cross_dim == MeasureMode::Undefined
        || (overflow != Overflow::Scroll && measure_mode_cross_dim == MeasureMode::AtMost)
    {
        let bounded = bound_axis(
            tree.node(node),
            cross_axis,
            total_line_cross_dim + padding_and_border_axis_cross,
            cross_axis_owner_size,
            owner_width,
        );
        tree.node_mut(node).layout.measured_dimensions[cross_axis.dimension().index()] = bounded;
    } else if measure_mode_cross_dim == MeasureMode::AtMost && overflow == Overflow::Scroll {
        let bounded = math::float_max(
            math::float_min(
                available_inner_cross_dim + padding_and_border_axis_cross,
                bound_axis_within_min_and_max(
                    tree.node(node),
                    cross_axis,
                    total_line_cross_dim + padding_and_border_axis_cross,
                    cross_axis_owner_size,
                ),
            ),
            padding_and_border_axis_cross,
        );
        tree.node_mut(node).layout.measured_dimensions[cross_axis.dimension().index()] = bounded;
    }

    // Lines were stacked in the normal direction; wrap-reverse flips the
    // children across the cross axis now that positions are known.
    if perform_layout && tree.node(node).style().flex_wrap == Wrap::WrapReverse {
        for i in 0..child_count {
            let child = tree.child(node, i);
            if tree.node(child).style().position_type != PositionType::Absolute {
                let cross_leading_index = cross_axis.leading_edge().physical_index();
                let flipped = tree.node(node).layout().measured_dimensions
                    [cross_axis.dimension().index()]
                    - tree.node(child).layout().position[cross_leading_index]
                    - tree.node(child).layout().measured_dimensions
                        [cross_axis.dimension().index()];
                tree.node_mut(child).layout.position[cross_leading_index] = flipped;
            }
        }
    }

    if perform_layout {
        // STEP 10: SIZING AND POSITIONING ABSOLUTE CHILDREN
        for i in 0..child_count {
            let child = tree.child(node, i);
            if tree.node(child).style().display == Display::None
                || tree.node(child).style().position_type != PositionType::Absolute
            {
                continue;
            }
            let against_padding_edge = tree.node_config(node).is_experimental_feature_enabled(
                ExperimentalFeatures::ABSOLUTE_PERCENTAGE_AGAINST_PADDING_EDGE,
            );
            let absolute_width = if against_padding_edge {
                tree.node(node).layout().measured_dimensions[Dimension::Width.index()]
            } else {
                available_inner_width
            };
            let absolute_height = if against_padding_edge {
                tree.node(node).layout().measured_dimensions[Dimension::Height.index()]
            } else {
                available_inner_height
            };
            let mode = if is_main_axis_row { measure_mode_main_dim } else { measure_mode_cross_dim };
            absolute::absolute_layout_child(
                tree,
                node,
                child,
                absolute_width,
                mode,
                absolute_height,
                direction,
            );
        }

        // STEP 11: SETTING TRAILING POSITIONS FOR CHILDREN
        let needs_main_trailing_pos = matches!(
            main_axis,
            FlexDirection::RowReverse | FlexDirection::ColumnReverse
        );
        let needs_cross_trailing_pos = matches!(
            cross_axis,
            FlexDirection::RowReverse | FlexDirection::ColumnReverse
        );
        if needs_main_trailing_pos || needs_cross_trailing_pos {
            for i in 0..child_count {
                let child = tree.child(node, i);
                if tree.node(child).style().display == Display::None {
                    continue;
                }
                if needs_main_trailing_pos {
                    set_child_trailing_position(tree, node, child, main_axis);
                }
                if needs_cross_trailing_pos {
                    set_child_trailing_position(tree, node, child, cross_axis);
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::enums::{Edge, FlexDirection, Justify, MeasureMode, PositionType, Wrap};
    use crate::math;
    use crate::node::Size;
    use crate::tree::{LayoutTree, NodeId};
    use crate::value::Value;

    fn setup() -> LayoutTree {
        LayoutTree::new()
    }

    fn grow_pair(tree: &mut LayoutTree) -> (NodeId, NodeId, NodeId) {
        let root = tree.new_node();
        tree.set_position_type(root, PositionType::Absolute);
        tree.set_flex_direction(root, FlexDirection::Row);
        tree.set_width(root, Value::points(100.0));
        tree.set_height(root, Value::points(100.0));

        let child0 = tree.new_node();
        tree.set_flex_grow(child0, 1.0);
        tree.set_flex_basis(child0, Value::points(50.0));
        tree.insert_child(root, child0, 0);

        let child1 = tree.new_node();
        tree.set_flex_grow(child1, 1.0);
        tree.insert_child(root, child1, 1);

        (root, child0, child1)
    }

    #[test]
    fn grow_splits_space_after_flex_basis() {
        let mut tree = setup();
        let (root, child0, child1) = grow_pair(&mut tree);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);

        assert_eq!(tree.layout_left(child0), 0.0);
        assert_eq!(tree.layout_width(child0), 75.0);
        assert_eq!(tree.layout_height(child0), 100.0);
        assert_eq!(tree.layout_left(child1), 75.0);
        assert_eq!(tree.layout_width(child1), 25.0);
    }

    #[test]
    fn rtl_mirrors_row_layout() {
        let mut tree = setup();
        let (root, child0, child1) = grow_pair(&mut tree);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Rtl);

        assert_eq!(tree.layout_left(child0), 25.0);
        assert_eq!(tree.layout_width(child0), 75.0);
        assert_eq!(tree.layout_left(child1), 0.0);
        assert_eq!(tree.layout_width(child1), 25.0);

        // The RTL positions are the LTR ones reflected across the container.
        let mut mirror = setup();
        let (m_root, m_child0, m_child1) = grow_pair(&mut mirror);
        mirror.calculate_layout(
            m_root,
            math::UNDEFINED,
            math::UNDEFINED,
            crate::enums::Direction::Ltr,
        );
        for (ltr, rtl) in [(m_child0, child0), (m_child1, child1)] {
            assert_eq!(
                mirror.layout_left(ltr),
                tree.layout_width(root) - tree.layout_left(rtl) - tree.layout_width(rtl)
            );
        }
    }

    #[test]
    fn shrink_can_collapse_a_child_to_zero() {
        let mut tree = setup();
        let root = tree.new_node();
        tree.set_height(root, Value::points(75.0));

        let mut children = Vec::new();
        for i in 0..3 {
            let child = tree.new_node();
            tree.set_width(child, Value::points(50.0));
            tree.set_height(child, Value::points(50.0));
            tree.insert_child(root, child, i);
            children.push(child);
        }
        tree.set_flex_shrink(children[1], 1.0);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);

        assert_eq!(tree.layout_height(children[0]), 50.0);
        assert_eq!(tree.layout_height(children[1]), 0.0);
        assert_eq!(tree.layout_height(children[2]), 50.0);
        assert_eq!(tree.layout_top(children[0]), 0.0);
        assert_eq!(tree.layout_top(children[1]), 50.0);
        assert_eq!(tree.layout_top(children[2]), 50.0);
    }

    #[test]
    fn non_positive_aspect_ratio_acts_as_unset() {
        let mut tree = setup();
        let root = tree.new_node();
        tree.set_width(root, Value::points(100.0));
        tree.set_height(root, Value::points(100.0));

        let zero = tree.new_node();
        tree.set_width(zero, Value::points(50.0));
        tree.set_aspect_ratio(zero, 0.0);
        tree.insert_child(root, zero, 0);

        let negative = tree.new_node();
        tree.set_width(negative, Value::points(50.0));
        tree.set_aspect_ratio(negative, -1.0);
        tree.insert_child(root, negative, 1);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);

        assert_eq!(tree.layout_width(zero), 50.0);
        assert_eq!(tree.layout_height(zero), 0.0);
        assert_eq!(tree.layout_width(negative), 50.0);
        assert_eq!(tree.layout_height(negative), 0.0);
    }

    #[test]
    fn fractional_grow_factors_below_one_sum_act_as_one() {
        let mut tree = setup();
        let root = tree.new_node();
        tree.set_width(root, Value::points(200.0));
        tree.set_height(root, Value::points(500.0));

        let child0 = tree.new_node();
        tree.set_flex_grow(child0, 0.2);
        tree.set_flex_basis(child0, Value::points(40.0));
        tree.insert_child(root, child0, 0);
        let child1 = tree.new_node();
        tree.set_flex_grow(child1, 0.2);
        tree.insert_child(root, child1, 1);
        let child2 = tree.new_node();
        tree.set_flex_grow(child2, 0.4);
        tree.insert_child(root, child2, 2);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);

        assert_eq!(tree.layout_height(child0), 132.0);
        assert_eq!(tree.layout_height(child1), 92.0);
        assert_eq!(tree.layout_height(child2), 184.0);
    }

    #[test]
    fn oversized_content_reports_overflow_on_the_root() {
        let mut tree = setup();
        let root = tree.new_node();
        tree.set_width(root, Value::points(100.0));
        tree.set_height(root, Value::points(100.0));

        let child = tree.new_node();
        tree.insert_child(root, child, 0);

        let grandchild = tree.new_node();
        tree.set_width(grandchild, Value::points(200.0));
        tree.set_height(grandchild, Value::points(200.0));
        tree.insert_child(child, grandchild, 0);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);

        assert!(tree.layout_had_overflow(root));
        assert_eq!(tree.layout_height(root), 100.0);
        assert_eq!(tree.layout_height(child), 200.0);
        assert_eq!(tree.layout_width(child), 100.0);
        assert_eq!(tree.layout_height(grandchild), 200.0);
    }

    #[test]
    fn measure_results_are_cached_across_passes() {
        let mut tree = setup();
        let root = tree.new_node();
        let leaf = tree.new_node();
        tree.insert_child(root, leaf, 0);

        let calls = Rc::new(Cell::new(0usize));
        let counter = calls.clone();
        tree.set_measure_func(
            leaf,
            Some(Rc::new(RefCell::new(
                move |_node: NodeId,
                      _width: f32,
                      _width_mode: MeasureMode,
                      _height: f32,
                      _height_mode: MeasureMode|
                      -> Size {
                    counter.set(counter.get() + 1);
                    Size { width: 42.0, height: 17.0 }
                },
            ))),
        );

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);
        assert_eq!(tree.layout_width(leaf), 42.0);
        assert_eq!(tree.layout_height(leaf), 17.0);
        assert_eq!(calls.get(), 1);

        // A clean tree relaid out under the same constraints never measures.
        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);
        assert_eq!(calls.get(), 1);
        assert_eq!(tree.layout_width(leaf), 42.0);
        assert_eq!(tree.layout_height(leaf), 17.0);
    }

    #[test]
    fn repeated_layout_is_deterministic() {
        let mut tree = setup();
        let (root, child0, child1) = grow_pair(&mut tree);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);
        let first = [
            tree.layout_left(child0),
            tree.layout_width(child0),
            tree.layout_left(child1),
            tree.layout_width(child1),
        ];
        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);
        let second = [
            tree.layout_left(child0),
            tree.layout_width(child0),
            tree.layout_left(child1),
            tree.layout_width(child1),
        ];
        assert_eq!(first, second);
    }

    #[test]
    fn min_and_max_survive_flex_distribution() {
        let mut tree = setup();
        let root = tree.new_node();
        tree.set_width(root, Value::points(100.0));
        tree.set_height(root, Value::points(300.0));

        let capped = tree.new_node();
        tree.set_flex_grow(capped, 1.0);
        tree.set_max_height(capped, Value::points(50.0));
        tree.insert_child(root, capped, 0);

        let filler = tree.new_node();
        tree.set_flex_grow(filler, 1.0);
        tree.insert_child(root, filler, 1);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);

        assert_eq!(tree.layout_height(capped), 50.0);
        assert_eq!(tree.layout_top(filler), 50.0);
        assert_eq!(tree.layout_height(filler), 250.0);
    }

    #[test]
    fn justify_content_positions_children() {
        let run = |justify: Justify| -> (f32, f32) {
            let mut tree = setup();
            let root = tree.new_node();
            tree.set_flex_direction(root, FlexDirection::Row);
            tree.set_justify_content(root, justify);
            tree.set_width(root, Value::points(100.0));
            tree.set_height(root, Value::points(20.0));
            let a = tree.new_node();
            tree.set_width(a, Value::points(30.0));
            tree.insert_child(root, a, 0);
            let b = tree.new_node();
            tree.set_width(b, Value::points(30.0));
            tree.insert_child(root, b, 1);
            tree.calculate_layout(
                root,
                math::UNDEFINED,
                math::UNDEFINED,
                crate::enums::Direction::Ltr,
            );
            (tree.layout_left(a), tree.layout_left(b))
        };

        assert_eq!(run(Justify::FlexStart), (0.0, 30.0));
        assert_eq!(run(Justify::Center), (20.0, 50.0));
        assert_eq!(run(Justify::FlexEnd), (40.0, 70.0));
        assert_eq!(run(Justify::SpaceBetween), (0.0, 70.0));
        assert_eq!(run(Justify::SpaceAround), (10.0, 60.0));
        // SpaceEvenly produces thirds, which land off the pixel grid; the
        // default scale factor snaps the edges to 13 and 57.
        assert_eq!(run(Justify::SpaceEvenly), (13.0, 57.0));
    }

    #[test]
    fn gap_separates_children_on_the_main_axis() {
        let mut tree = setup();
        let root = tree.new_node();
        tree.set_flex_direction(root, FlexDirection::Row);
        tree.set_width(root, Value::points(100.0));
        tree.set_height(root, Value::points(20.0));
        tree.set_gap(root, crate::enums::Gutter::Column, Value::points(10.0));

        let a = tree.new_node();
        tree.set_width(a, Value::points(30.0));
        tree.insert_child(root, a, 0);
        let b = tree.new_node();
        tree.set_width(b, Value::points(30.0));
        tree.insert_child(root, b, 1);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);

        assert_eq!(tree.layout_left(a), 0.0);
        assert_eq!(tree.layout_left(b), 40.0);
    }

    #[test]
    fn wrap_stacks_lines_on_the_cross_axis() {
        let mut tree = setup();
        let root = tree.new_node();
        tree.set_flex_direction(root, FlexDirection::Row);
        tree.set_flex_wrap(root, Wrap::Wrap);
        tree.set_width(root, Value::points(100.0));

        let mut children = Vec::new();
        for i in 0..3 {
            let child = tree.new_node();
            tree.set_width(child, Value::points(40.0));
            tree.set_height(child, Value::points(10.0));
            tree.insert_child(root, child, i);
            children.push(child);
        }

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);

        assert_eq!(tree.layout_left(children[0]), 0.0);
        assert_eq!(tree.layout_top(children[0]), 0.0);
        assert_eq!(tree.layout_left(children[1]), 40.0);
        assert_eq!(tree.layout_top(children[1]), 0.0);
        assert_eq!(tree.layout_left(children[2]), 0.0);
        assert_eq!(tree.layout_top(children[2]), 10.0);
        assert_eq!(tree.layout_height(root), 20.0);
    }

    #[test]
    fn absolute_children_honor_insets() {
        let mut tree = setup();
        let root = tree.new_node();
        tree.set_width(root, Value::points(100.0));
        tree.set_height(root, Value::points(100.0));

        let pinned_start = tree.new_node();
        tree.set_position_type(pinned_start, PositionType::Absolute);
        tree.set_position(pinned_start, Edge::Left, Value::points(10.0));
        tree.set_position(pinned_start, Edge::Top, Value::points(20.0));
        tree.set_width(pinned_start, Value::points(30.0));
        tree.set_height(pinned_start, Value::points(40.0));
        tree.insert_child(root, pinned_start, 0);

        let pinned_end = tree.new_node();
        tree.set_position_type(pinned_end, PositionType::Absolute);
        tree.set_position(pinned_end, Edge::Right, Value::points(10.0));
        tree.set_position(pinned_end, Edge::Bottom, Value::points(5.0));
        tree.set_width(pinned_end, Value::points(20.0));
        tree.set_height(pinned_end, Value::points(10.0));
        tree.insert_child(root, pinned_end, 1);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);

        assert_eq!(tree.layout_left(pinned_start), 10.0);
        assert_eq!(tree.layout_top(pinned_start), 20.0);
        assert_eq!(tree.layout_width(pinned_start), 30.0);
        assert_eq!(tree.layout_height(pinned_start), 40.0);
        assert_eq!(tree.layout_left(pinned_end), 70.0);
        assert_eq!(tree.layout_top(pinned_end), 85.0);
    }

    #[test]
    fn padding_and_border_offset_content() {
        let mut tree = setup();
        let root = tree.new_node();
        tree.set_width(root, Value::points(100.0));
        tree.set_height(root, Value::points(100.0));
        tree.set_padding(root, Edge::All, Value::points(10.0));
        tree.set_border(root, Edge::All, Value::points(5.0));

        let child = tree.new_node();
        tree.set_flex_grow(child, 1.0);
        tree.insert_child(root, child, 0);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);

        assert_eq!(tree.layout_left(child), 15.0);
        assert_eq!(tree.layout_top(child), 15.0);
        assert_eq!(tree.layout_width(child), 70.0);
        assert_eq!(tree.layout_height(child), 70.0);
    }

    #[test]
    fn rounding_keeps_adjacent_edges_shared() {
        let mut tree = setup();
        let root = tree.new_node();
        tree.set_width(root, Value::points(100.3));
        tree.set_height(root, Value::points(31.2));

        let a = tree.new_node();
        tree.set_height(a, Value::points(10.4));
        tree.insert_child(root, a, 0);
        let b = tree.new_node();
        tree.set_height(b, Value::points(10.4));
        tree.insert_child(root, b, 1);

        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);

        assert_eq!(tree.layout_width(root), 100.0);
        assert_eq!(tree.layout_height(root), 31.0);
        assert_eq!(tree.layout_top(a), 0.0);
        assert_eq!(tree.layout_height(a), 10.0);
        // The second child starts exactly where the first one ends; its own
        // height absorbs the accumulated fraction.
        assert_eq!(tree.layout_top(b), 10.0);
        assert_eq!(tree.layout_height(b), 11.0);
    }

    #[test]
    fn scale_factor_rounds_to_fractional_grid() {
        let mut tree = setup();
        let config = tree.default_config();
        tree.config_mut(config).set_point_scale_factor(2.0);

        let root = tree.new_node();
        tree.set_width(root, Value::points(100.3));
        tree.set_height(root, Value::points(10.0));
        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);
        assert_eq!(tree.layout_width(root), 100.5);
    }

    #[test]
    fn zero_scale_factor_disables_rounding() {
        let mut tree = setup();
        let config = tree.default_config();
        tree.config_mut(config).set_point_scale_factor(0.0);

        let root = tree.new_node();
        tree.set_width(root, Value::points(100.3));
        tree.set_height(root, Value::points(10.0));
        tree.calculate_layout(root, math::UNDEFINED, math::UNDEFINED, crate::enums::Direction::Ltr);
        assert_eq!(tree.layout_width(root), 100.3);
    }
}
