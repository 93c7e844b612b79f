//! Arena of layout nodes and configs, plus the whole tree-mutation API.
//!
//! Nodes live in slot vectors with stable indices; handles are plain copyable
//! ids. Every mutation that can affect geometry marks the node and all of
//! its transitive owners dirty, which is what keeps the measurement cache
//! honest.
//!
//! "Owner" is distinct from structural parent: a node may appear as a child
//! in several trees but is owned by at most one. Writing through a child the
//! writer does not own triggers a copy-on-write clone.

use crate::algorithm;
use crate::config::{self, Config};
use crate::enums::{
    Align, Dimension, Direction, Display, Edge, FlexDirection, Gutter, Justify, NodeType,
    Overflow, PositionType, Wrap,
};
use crate::layout::LayoutResults;
use crate::math;
use crate::node::{BaselineFunc, DirtiedFunc, MeasureFunc, Node};
use crate::style::Style;
use crate::value::Value;

use std::cell::RefCell;
use std::rc::Rc;

// =============================================================================
// HANDLES
// =============================================================================

/// Stable handle to a node slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_raw(index: usize) -> NodeId {
        NodeId(index)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Stable handle to a config slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigId(usize);

impl ConfigId {
    pub(crate) fn from_raw(index: usize) -> ConfigId {
        ConfigId(index)
    }
}

// =============================================================================
// TREE
// =============================================================================

/// Owner of all nodes and configs, and the surface every operation goes
/// through. `&mut` access serializes layout sessions by construction.
pub struct LayoutTree {
    nodes: Vec<Option<Node>>,
    free_nodes: Vec<usize>,
    configs: Vec<Option<Config>>,
    free_configs: Vec<usize>,
    default_config: ConfigId,
    /// Bumped once per top-level layout call.
    pub(crate) generation_count: u32,
}

impl LayoutTree {
    pub fn new() -> LayoutTree {
        LayoutTree {
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            configs: vec![Some(Config::new())],
            free_configs: Vec::new(),
            default_config: ConfigId(0),
            generation_count: 0,
        }
    }

    // =========================================================================
    // CONFIGS
    // =========================================================================

    pub fn default_config(&self) -> ConfigId {
        self.default_config
    }

    pub fn new_config(&mut self) -> ConfigId {
        self.insert_config(Config::new())
    }

    pub fn new_config_from(&mut self, config: Config) -> ConfigId {
        self.insert_config(config)
    }

    fn insert_config(&mut self, config: Config) -> ConfigId {
        if let Some(index) = self.free_configs.pop() {
            self.configs[index] = Some(config);
            ConfigId(index)
        } else {
            self.configs.push(Some(config));
            ConfigId(self.configs.len() - 1)
        }
    }

    pub fn free_config(&mut self, config: ConfigId) {
        assert!(config != self.default_config, "cannot free the default config");
        self.configs[config.0] = None;
        self.free_configs.push(config.0);
    }

    pub fn config(&self, config: ConfigId) -> &Config {
        self.configs[config.0].as_ref().unwrap_or_else(|| panic!("config slot {} is free", config.0))
    }

    pub fn config_mut(&mut self, config: ConfigId) -> &mut Config {
        self.configs[config.0].as_mut().unwrap_or_else(|| panic!("config slot {} is free", config.0))
    }

    pub(crate) fn node_config(&self, node: NodeId) -> &Config {
        self.config(self.node(node).config)
    }

    /// Rebind a node to another config. Web defaults are fixed at node
    /// construction and may not change here.
    pub fn set_config(&mut self, node: NodeId, config: ConfigId) {
        let old = self.node(node).config;
        let same_defaults =
            self.config(config).use_web_defaults() == self.config(old).use_web_defaults();
        config::assert_fatal(
            self.config(config),
            same_defaults,
            "UseWebDefaults may not be changed after constructing a node",
        );
        if config::config_update_invalidates_layout(self.config(old), self.config(config)) {
            self.mark_dirty_and_propagate(node);
        }
        self.node_mut(node).config = config;
    }

    pub fn node_config_id(&self, node: NodeId) -> ConfigId {
        self.node(node).config
    }

    // =========================================================================
    // NODE LIFECYCLE
    // =========================================================================

    pub fn new_node(&mut self) -> NodeId {
        self.new_node_with_config(self.default_config)
    }

    pub fn new_node_with_config(&mut self, config: ConfigId) -> NodeId {
        let use_web_defaults = self.config(config).use_web_defaults();
        let node = Node::new(config, use_web_defaults);
        self.insert_node(node)
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free_nodes.pop() {
            self.nodes[index] = Some(node);
            NodeId(index)
        } else {
            self.nodes.push(Some(node));
            NodeId(self.nodes.len() - 1)
        }
    }

    pub(crate) fn node(&self, node: NodeId) -> &Node {
        self.nodes[node.0].as_ref().unwrap_or_else(|| panic!("node slot {} is free", node.0))
    }

    pub(crate) fn node_mut(&mut self, node: NodeId) -> &mut Node {
        self.nodes[node.0].as_mut().unwrap_or_else(|| panic!("node slot {} is free", node.0))
    }

    pub fn is_allocated(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len() && self.nodes[node.0].is_some()
    }

    /// Disconnect a node from its owner and children, then release its slot.
    /// Children are not freed.
    pub fn free_node(&mut self, node: NodeId) {
        if let Some(owner) = self.node(node).owner {
            self.remove_child(owner, node);
        }
        let children = std::mem::take(&mut self.node_mut(node).children);
        for child in children {
            // A structural child may belong to another tree; only detach the
            // ones this node actually owns.
            if self.node(child).owner == Some(node) {
                self.node_mut(child).owner = None;
            }
        }
        self.nodes[node.0] = None;
        self.free_nodes.push(node.0);
    }

    /// Free a whole subtree. Children not owned by their structural parent
    /// are skipped, since another tree still holds them.
    pub fn free_recursive(&mut self, root: NodeId) {
        let mut skipped = 0;
        while self.child_count(root) > skipped {
            let child = self.child(root, skipped);
            if self.node(child).owner != Some(root) {
                skipped += 1;
            } else {
                self.remove_child(root, child);
                self.free_recursive(child);
            }
        }
        self.free_node(root);
    }

    /// Return a node to its freshly-constructed state.
    pub fn reset_node(&mut self, node: NodeId) {
        {
            let n = self.node(node);
            let cfg = self.config(n.config);
            config::assert_fatal(
                cfg,
                n.children.is_empty(),
                "Cannot reset a node which still has children attached",
            );
            config::assert_fatal(
                cfg,
                n.owner.is_none(),
                "Cannot reset a node still attached to a owner",
            );
        }
        let config = self.node(node).config;
        let use_web_defaults = self.config(config).use_web_defaults();
        self.nodes[node.0] = Some(Node::new(config, use_web_defaults));
    }

    // =========================================================================
    // TREE STRUCTURE
    // =========================================================================

    pub fn child_count(&self, node: NodeId) -> usize {
        self.node(node).children.len()
    }

    pub fn child(&self, node: NodeId, index: usize) -> NodeId {
        self.node(node).children[index]
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    pub fn owner(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).owner
    }

    pub fn insert_child(&mut self, owner: NodeId, child: NodeId, index: usize) {
        {
            let cfg = self.node_config(owner);
            config::assert_fatal(
                cfg,
                self.node(child).owner.is_none(),
                "Child already has a owner, it must be removed first.",
            );
            config::assert_fatal(
                cfg,
                !self.node(owner).has_measure_func(),
                "Cannot add child: Nodes with measure functions cannot have children.",
            );
        }
        self.node_mut(owner).children.insert(index, child);
        self.node_mut(child).owner = Some(owner);
        self.mark_dirty_and_propagate(owner);
    }

    /// Replace the child at `index` without dirtying; the caller owns the
    /// consistency of the swap.
    pub fn swap_child(&mut self, owner: NodeId, child: NodeId, index: usize) {
        self.node_mut(owner).children[index] = child;
        self.node_mut(child).owner = Some(owner);
    }

    pub fn remove_child(&mut self, owner: NodeId, excluded_child: NodeId) {
        if self.child_count(owner) == 0 {
            return;
        }

        // An owned first child means the child list is not shared with
        // another tree and can be edited in place.
        let first_child = self.child(owner, 0);
        if self.node(first_child).owner == Some(owner) {
            let position = self.node(owner).children.iter().position(|&c| c == excluded_child);
            if let Some(position) = position {
                self.node_mut(owner).children.remove(position);
                let excluded = self.node_mut(excluded_child);
                excluded.layout = LayoutResults::default();
                excluded.owner = None;
                self.mark_dirty_and_propagate(owner);
            }
            return;
        }

        // Shared list: rebuild it from clones, leaving out the excluded
        // child.
        let old_children = self.node(owner).children.clone();
        let mut next_children = Vec::with_capacity(old_children.len());
        for old_child in old_children {
            if old_child == excluded_child {
                continue;
            }
            let clone = self.clone_node(old_child, owner, next_children.len());
            next_children.push(clone);
        }
        self.node_mut(owner).children = next_children;
        self.mark_dirty_and_propagate(owner);
    }

    /// Remove the child at `index`, through the same copy-on-write path as
    /// [`remove_child`](Self::remove_child).
    pub fn remove_child_at(&mut self, owner: NodeId, index: usize) {
        let child = self.child(owner, index);
        self.remove_child(owner, child);
    }

    pub fn remove_all_children(&mut self, owner: NodeId) {
        if self.child_count(owner) == 0 {
            return;
        }

        let first_child = self.child(owner, 0);
        if self.node(first_child).owner == Some(owner) {
            let children = std::mem::take(&mut self.node_mut(owner).children);
            for child in children {
                let node = self.node_mut(child);
                node.layout = LayoutResults::default();
                node.owner = None;
            }
        } else {
            self.node_mut(owner).children = Vec::new();
        }
        self.mark_dirty_and_propagate(owner);
    }

    pub fn set_children(&mut self, owner: NodeId, children: &[NodeId]) {
        if children.is_empty() {
            if self.child_count(owner) > 0 {
                let old = std::mem::take(&mut self.node_mut(owner).children);
                for child in old {
                    let node = self.node_mut(child);
                    node.layout = LayoutResults::default();
                    node.owner = None;
                }
                self.mark_dirty_and_propagate(owner);
            }
            return;
        }

        if self.child_count(owner) > 0 {
            let old = self.node(owner).children.clone();
            for old_child in old {
                if !children.contains(&old_child) {
                    let node = self.node_mut(old_child);
                    node.layout = LayoutResults::default();
                    node.owner = None;
                }
            }
        }
        self.node_mut(owner).children = children.to_vec();
        for &child in children {
            self.node_mut(child).owner = Some(owner);
        }
        self.mark_dirty_and_propagate(owner);
    }

    // =========================================================================
    // COPY-ON-WRITE
    // =========================================================================

    /// Clone `node` for `owner`'s child slot `child_index`. The config's
    /// clone callback may supply the clone; otherwise the node is cloned
    /// structurally (callbacks shared, child list copied by handle).
    pub(crate) fn clone_node(&mut self, node: NodeId, owner: NodeId, child_index: usize) -> NodeId {
        let callback = self.node_config(owner).clone_node_fn();
        let cloned = callback
            .and_then(|cb| cb(self.node(node), owner, child_index))
            .unwrap_or_else(|| {
                let mut copy = self.node(node).clone();
                copy.owner = None;
                copy
            });
        let clone = self.insert_node(cloned);
        self.node_mut(clone).owner = Some(owner);
        clone
    }

    /// Ensure every child of `owner` is owned by it, cloning the ones that
    /// are not. Returns true when any clone happened.
    pub(crate) fn clone_children_if_needed(&mut self, owner: NodeId) -> bool {
        let mut cloned_any = false;
        for i in 0..self.child_count(owner) {
            let child = self.child(owner, i);
            if self.node(child).owner != Some(owner) {
                let clone = self.clone_node(child, owner, i);
                self.node_mut(owner).children[i] = clone;
                cloned_any = true;
            }
        }
        cloned_any
    }

    // =========================================================================
    // DIRTINESS
    // =========================================================================

    pub(crate) fn set_node_dirty(&mut self, node: NodeId, dirty: bool) {
        let n = self.node_mut(node);
        if n.is_dirty == dirty {
            return;
        }
        n.is_dirty = dirty;
        let callback = if dirty { n.dirtied.clone() } else { None };
        if let Some(callback) = callback {
            callback.borrow_mut().dirtied(node);
        }
    }

    pub(crate) fn mark_dirty_and_propagate(&mut self, node: NodeId) {
        if self.node(node).is_dirty {
            return;
        }
        self.set_node_dirty(node, true);
        self.node_mut(node).layout.computed_flex_basis = math::UNDEFINED;
        if let Some(owner) = self.node(node).owner {
            self.mark_dirty_and_propagate(owner);
        }
    }

    /// Externally force a remeasure. Only meaningful for nodes whose
    /// content is measured through a callback.
    pub fn mark_dirty(&mut self, node: NodeId) {
        config::assert_fatal(
            self.node_config(node),
            self.node(node).has_measure_func(),
            "Only leaf nodes with custom measure functions should manually mark themselves as dirty",
        );
        self.mark_dirty_and_propagate(node);
    }

    pub fn is_dirty(&self, node: NodeId) -> bool {
        self.node(node).is_dirty
    }

    pub fn has_new_layout(&self, node: NodeId) -> bool {
        self.node(node).has_new_layout
    }

    pub fn set_has_new_layout(&mut self, node: NodeId, has_new_layout: bool) {
        self.node_mut(node).has_new_layout = has_new_layout;
    }

    // =========================================================================
    // CALLBACKS
    // =========================================================================

    pub fn set_measure_func(&mut self, node: NodeId, measure: Option<Rc<RefCell<dyn MeasureFunc>>>) {
        if measure.is_some() {
            config::assert_fatal(
                self.node_config(node),
                self.child_count(node) == 0,
                "Cannot set measure function: Nodes with measure functions cannot have children.",
            );
            self.node_mut(node).node_type = NodeType::Text;
        } else {
            self.node_mut(node).node_type = NodeType::Default;
        }
        self.node_mut(node).measure = measure;
    }

    pub fn has_measure_func(&self, node: NodeId) -> bool {
        self.node(node).has_measure_func()
    }

    pub fn set_baseline_func(
        &mut self,
        node: NodeId,
        baseline: Option<Rc<RefCell<dyn BaselineFunc>>>,
    ) {
        self.node_mut(node).baseline = baseline;
    }

    pub fn has_baseline_func(&self, node: NodeId) -> bool {
        self.node(node).has_baseline_func()
    }

    pub fn set_dirtied_func(&mut self, node: NodeId, dirtied: Option<Rc<RefCell<dyn DirtiedFunc>>>) {
        self.node_mut(node).dirtied = dirtied;
    }

    pub fn set_node_type(&mut self, node: NodeId, node_type: NodeType) {
        self.node_mut(node).node_type = node_type;
    }

    pub fn node_type(&self, node: NodeId) -> NodeType {
        self.node(node).node_type
    }

    pub fn set_is_reference_baseline(&mut self, node: NodeId, is_reference_baseline: bool) {
        if self.node(node).is_reference_baseline != is_reference_baseline {
            self.node_mut(node).is_reference_baseline = is_reference_baseline;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn is_reference_baseline(&self, node: NodeId) -> bool {
        self.node(node).is_reference_baseline
    }

    // =========================================================================
    // STYLE SETTERS (dirty only on change)
    // =========================================================================

    pub fn style(&self, node: NodeId) -> &Style {
        &self.node(node).style
    }

    /// Bulk-assign a style; dirties only when something differs.
    pub fn copy_style(&mut self, node: NodeId, style: &Style) {
        if self.node(node).style != *style {
            self.node_mut(node).style = style.clone();
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_direction(&mut self, node: NodeId, direction: Direction) {
        if self.node(node).style.direction != direction {
            self.node_mut(node).style.direction = direction;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_flex_direction(&mut self, node: NodeId, flex_direction: FlexDirection) {
        if self.node(node).style.flex_direction != flex_direction {
            self.node_mut(node).style.flex_direction = flex_direction;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_justify_content(&mut self, node: NodeId, justify_content: Justify) {
        if self.node(node).style.justify_content != justify_content {
            self.node_mut(node).style.justify_content = justify_content;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_align_content(&mut self, node: NodeId, align_content: Align) {
        if self.node(node).style.align_content != align_content {
            self.node_mut(node).style.align_content = align_content;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_align_items(&mut self, node: NodeId, align_items: Align) {
        if self.node(node).style.align_items != align_items {
            self.node_mut(node).style.align_items = align_items;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_align_self(&mut self, node: NodeId, align_self: Align) {
        if self.node(node).style.align_self != align_self {
            self.node_mut(node).style.align_self = align_self;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_position_type(&mut self, node: NodeId, position_type: PositionType) {
        if self.node(node).style.position_type != position_type {
            self.node_mut(node).style.position_type = position_type;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_flex_wrap(&mut self, node: NodeId, flex_wrap: Wrap) {
        if self.node(node).style.flex_wrap != flex_wrap {
            self.node_mut(node).style.flex_wrap = flex_wrap;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_overflow(&mut self, node: NodeId, overflow: Overflow) {
        if self.node(node).style.overflow != overflow {
            self.node_mut(node).style.overflow = overflow;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_display(&mut self, node: NodeId, display: Display) {
        if self.node(node).style.display != display {
            self.node_mut(node).style.display = display;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_flex(&mut self, node: NodeId, flex: f32) {
        if !math::floats_equal(self.node(node).style.flex, flex) {
            self.node_mut(node).style.flex = flex;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_flex_grow(&mut self, node: NodeId, flex_grow: f32) {
        if !math::floats_equal(self.node(node).style.flex_grow, flex_grow) {
            self.node_mut(node).style.flex_grow = flex_grow;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_flex_shrink(&mut self, node: NodeId, flex_shrink: f32) {
        if !math::floats_equal(self.node(node).style.flex_shrink, flex_shrink) {
            self.node_mut(node).style.flex_shrink = flex_shrink;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_flex_basis(&mut self, node: NodeId, flex_basis: Value) {
        if self.node(node).style.flex_basis != flex_basis {
            self.node_mut(node).style.flex_basis = flex_basis;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_position(&mut self, node: NodeId, edge: Edge, position: Value) {
        if self.node(node).style.position[edge as usize] != position {
            self.node_mut(node).style.position[edge as usize] = position;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_margin(&mut self, node: NodeId, edge: Edge, margin: Value) {
        if self.node(node).style.margin[edge as usize] != margin {
            self.node_mut(node).style.margin[edge as usize] = margin;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_padding(&mut self, node: NodeId, edge: Edge, padding: Value) {
        if self.node(node).style.padding[edge as usize] != padding {
            self.node_mut(node).style.padding[edge as usize] = padding;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_border(&mut self, node: NodeId, edge: Edge, border: Value) {
        if self.node(node).style.border[edge as usize] != border {
            self.node_mut(node).style.border[edge as usize] = border;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_gap(&mut self, node: NodeId, gutter: Gutter, gap: Value) {
        if self.node(node).style.gap[gutter as usize] != gap {
            self.node_mut(node).style.gap[gutter as usize] = gap;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_width(&mut self, node: NodeId, width: Value) {
        self.set_dimension(node, Dimension::Width, width)
    }

    pub fn set_height(&mut self, node: NodeId, height: Value) {
        self.set_dimension(node, Dimension::Height, height)
    }

    fn set_dimension(&mut self, node: NodeId, dim: Dimension, value: Value) {
        if self.node(node).style.dimensions[dim.index()] != value {
            self.node_mut(node).style.dimensions[dim.index()] = value;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_min_width(&mut self, node: NodeId, min_width: Value) {
        if self.node(node).style.min_dimensions[0] != min_width {
            self.node_mut(node).style.min_dimensions[0] = min_width;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_min_height(&mut self, node: NodeId, min_height: Value) {
        if self.node(node).style.min_dimensions[1] != min_height {
            self.node_mut(node).style.min_dimensions[1] = min_height;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_max_width(&mut self, node: NodeId, max_width: Value) {
        if self.node(node).style.max_dimensions[0] != max_width {
            self.node_mut(node).style.max_dimensions[0] = max_width;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_max_height(&mut self, node: NodeId, max_height: Value) {
        if self.node(node).style.max_dimensions[1] != max_height {
            self.node_mut(node).style.max_dimensions[1] = max_height;
            self.mark_dirty_and_propagate(node);
        }
    }

    pub fn set_aspect_ratio(&mut self, node: NodeId, aspect_ratio: f32) {
        if !math::floats_equal(self.node(node).style.aspect_ratio, aspect_ratio) {
            self.node_mut(node).style.aspect_ratio = aspect_ratio;
            self.mark_dirty_and_propagate(node);
        }
    }

    // =========================================================================
    // LAYOUT ACCESSORS
    // =========================================================================

    pub fn layout_left(&self, node: NodeId) -> f32 {
        self.node(node).layout.position[Edge::Left.physical_index()]
    }

    pub fn layout_top(&self, node: NodeId) -> f32 {
        self.node(node).layout.position[Edge::Top.physical_index()]
    }

    pub fn layout_right(&self, node: NodeId) -> f32 {
        self.node(node).layout.position[Edge::Right.physical_index()]
    }

    pub fn layout_bottom(&self, node: NodeId) -> f32 {
        self.node(node).layout.position[Edge::Bottom.physical_index()]
    }

    pub fn layout_width(&self, node: NodeId) -> f32 {
        self.node(node).layout.dimensions[Dimension::Width.index()]
    }

    pub fn layout_height(&self, node: NodeId) -> f32 {
        self.node(node).layout.dimensions[Dimension::Height.index()]
    }

    pub fn layout_direction(&self, node: NodeId) -> Direction {
        self.node(node).layout.direction
    }

    pub fn layout_had_overflow(&self, node: NodeId) -> bool {
        self.node(node).layout.had_overflow
    }

    pub fn layout_measured_width(&self, node: NodeId) -> f32 {
        self.node(node).layout.measured_dimensions[Dimension::Width.index()]
    }

    pub fn layout_measured_height(&self, node: NodeId) -> f32 {
        self.node(node).layout.measured_dimensions[Dimension::Height.index()]
    }

    pub fn layout_margin(&self, node: NodeId, edge: Edge) -> f32 {
        self.resolved_layout_edge(node, edge, |layout, index| layout.margin[index])
    }

    pub fn layout_border(&self, node: NodeId, edge: Edge) -> f32 {
        self.resolved_layout_edge(node, edge, |layout, index| layout.border[index])
    }

    pub fn layout_padding(&self, node: NodeId, edge: Edge) -> f32 {
        self.resolved_layout_edge(node, edge, |layout, index| layout.padding[index])
    }

    /// Start/end map to left/right through the node's resolved direction.
    fn resolved_layout_edge(
        &self,
        node: NodeId,
        edge: Edge,
        read: impl Fn(&LayoutResults, usize) -> f32,
    ) -> f32 {
        let n = self.node(node);
        config::assert_fatal(
            self.node_config(node),
            (edge as usize) <= (Edge::End as usize),
            "Cannot get layout properties of multi-edge shorthands",
        );
        let physical = match edge {
            Edge::Start if n.layout.direction == Direction::Rtl => Edge::Right,
            Edge::Start => Edge::Left,
            Edge::End if n.layout.direction == Direction::Rtl => Edge::Left,
            Edge::End => Edge::Right,
            other => other,
        };
        read(&n.layout, physical.physical_index())
    }

    // =========================================================================
    // LAYOUT ENTRY POINT
    // =========================================================================

    /// Compute layout for the subtree under `root` against the available
    /// space. NaN means unconstrained on that axis.
    pub fn calculate_layout(
        &mut self,
        root: NodeId,
        available_width: f32,
        available_height: f32,
        owner_direction: Direction,
    ) {
        algorithm::calculate_layout(self, root, available_width, available_height, owner_direction);
    }
}

impl Default for LayoutTree {
    fn default() -> LayoutTree {
        LayoutTree::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    fn setup() -> LayoutTree {
        LayoutTree::new()
    }

    #[test]
    fn insert_child_sets_owner_and_dirties() {
        let mut tree = setup();
        let root = tree.new_node();
        let child = tree.new_node();
        tree.insert_child(root, child, 0);
        assert_eq!(tree.owner(child), Some(root));
        assert_eq!(tree.child_count(root), 1);
        assert!(tree.is_dirty(root));
    }

    #[test]
    #[should_panic]
    fn insert_owned_child_is_fatal() {
        let mut tree = setup();
        let a = tree.new_node();
        let b = tree.new_node();
        let child = tree.new_node();
        tree.insert_child(a, child, 0);
        tree.insert_child(b, child, 0);
    }

    #[test]
    fn remove_child_resets_layout_and_owner() {
        let mut tree = setup();
        let root = tree.new_node();
        let child = tree.new_node();
        tree.insert_child(root, child, 0);
        tree.remove_child(root, child);
        assert_eq!(tree.owner(child), None);
        assert_eq!(tree.child_count(root), 0);
    }

    #[test]
    fn remove_child_at_removes_by_index() {
        let mut tree = setup();
        let root = tree.new_node();
        let first = tree.new_node();
        let second = tree.new_node();
        tree.insert_child(root, first, 0);
        tree.insert_child(root, second, 1);

        tree.remove_child_at(root, 0);
        assert_eq!(tree.owner(first), None);
        assert_eq!(tree.child_count(root), 1);
        assert_eq!(tree.child(root, 0), second);
        assert_eq!(tree.owner(second), Some(root));
    }

    #[test]
    fn same_value_set_does_not_dirty() {
        let mut tree = setup();
        let root = tree.new_node();
        tree.set_width(root, Value::points(100.0));
        tree.calculate_layout(root, f32::NAN, f32::NAN, Direction::Ltr);
        assert!(!tree.is_dirty(root));

        tree.set_width(root, Value::points(100.0));
        assert!(!tree.is_dirty(root));

        tree.set_width(root, Value::points(120.0));
        assert!(tree.is_dirty(root));
    }

    #[test]
    fn dirty_propagates_to_owners() {
        let mut tree = setup();
        let root = tree.new_node();
        let mid = tree.new_node();
        let leaf = tree.new_node();
        tree.insert_child(root, mid, 0);
        tree.insert_child(mid, leaf, 0);
        tree.calculate_layout(root, 100.0, 100.0, Direction::Ltr);
        assert!(!tree.is_dirty(root));

        tree.set_width(leaf, Value::points(10.0));
        assert!(tree.is_dirty(leaf));
        assert!(tree.is_dirty(mid));
        assert!(tree.is_dirty(root));
    }

    #[test]
    fn dirtied_callback_fires_once_per_transition() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut tree = setup();
        let root = tree.new_node();
        let count = Rc::new(RefCell::new(0));
        let counter = count.clone();
        tree.set_dirtied_func(
            root,
            Some(Rc::new(RefCell::new(move |_node: NodeId| {
                *counter.borrow_mut() += 1;
            }))),
        );
        tree.calculate_layout(root, 100.0, 100.0, Direction::Ltr);
        assert_eq!(*count.borrow(), 0);

        tree.set_width(root, Value::points(25.0));
        tree.set_height(root, Value::points(25.0));
        assert_eq!(*count.borrow(), 1);

        tree.calculate_layout(root, 100.0, 100.0, Direction::Ltr);
        tree.set_width(root, Value::points(50.0));
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn free_recursive_skips_unowned_children() {
        let mut tree = setup();
        let root_a = tree.new_node();
        let shared = tree.new_node();
        tree.insert_child(root_a, shared, 0);

        // A second tree referencing the same child without owning it.
        let root_b = tree.new_node();
        tree.node_mut(root_b).children.push(shared);

        tree.free_recursive(root_b);
        assert!(tree.is_allocated(shared));
        assert!(!tree.is_allocated(root_b));
        // The real owner link survives freeing the borrowing tree.
        assert_eq!(tree.owner(shared), Some(root_a));

        tree.free_recursive(root_a);
        assert!(!tree.is_allocated(shared));
    }

    #[test]
    fn clone_children_if_needed_clones_unowned() {
        let mut tree = setup();
        let root_a = tree.new_node();
        let child = tree.new_node();
        tree.insert_child(root_a, child, 0);

        let root_b = tree.new_node();
        tree.node_mut(root_b).children.push(child);

        assert!(tree.clone_children_if_needed(root_b));
        let cloned = tree.child(root_b, 0);
        assert_ne!(cloned, child);
        assert_eq!(tree.owner(cloned), Some(root_b));
        // The original tree is untouched.
        assert_eq!(tree.child(root_a, 0), child);
        assert_eq!(tree.owner(child), Some(root_a));

        // A second pass is a no-op.
        assert!(!tree.clone_children_if_needed(root_b));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut tree = setup();
        let node = tree.new_node();
        tree.set_width(node, Value::points(10.0));
        tree.reset_node(node);
        assert_eq!(tree.style(node).dimensions[0], value::AUTO);
    }

    #[test]
    #[should_panic]
    fn reset_with_children_is_fatal() {
        let mut tree = setup();
        let root = tree.new_node();
        let child = tree.new_node();
        tree.insert_child(root, child, 0);
        tree.reset_node(root);
    }

    #[test]
    #[should_panic]
    fn mark_dirty_without_measure_func_is_fatal() {
        let mut tree = setup();
        let node = tree.new_node();
        tree.mark_dirty(node);
    }

    #[test]
    fn web_defaults_apply_to_new_nodes() {
        let mut tree = setup();
        let config = tree.new_config();
        tree.config_mut(config).set_use_web_defaults(true);
        let node = tree.new_node_with_config(config);
        assert_eq!(tree.style(node).flex_direction, FlexDirection::Row);
        assert_eq!(tree.style(node).align_content, Align::Stretch);
    }
}
