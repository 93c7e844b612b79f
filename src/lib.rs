//! # titan-layout
//!
//! Flexbox layout engine for node trees.
//!
//! Styles go in, a box layout comes out: build a tree of nodes, set
//! flexbox-style properties on them, call
//! [`LayoutTree::calculate_layout`], and read back positions and sizes per
//! node. Leaf content (text, images) hooks in through measure callbacks;
//! repeated layouts reuse cached measurements and only recompute dirty
//! subtrees.
//!
//! ```no_run
//! use titan_layout::{Direction, FlexDirection, LayoutTree, Value};
//!
//! let mut tree = LayoutTree::new();
//! let root = tree.new_node();
//! tree.set_flex_direction(root, FlexDirection::Row);
//! tree.set_width(root, Value::points(100.0));
//! tree.set_height(root, Value::points(100.0));
//!
//! let child = tree.new_node();
//! tree.set_flex_grow(child, 1.0);
//! tree.insert_child(root, child, 0);
//!
//! tree.calculate_layout(root, f32::NAN, f32::NAN, Direction::Ltr);
//! assert_eq!(tree.layout_width(child), 100.0);
//! ```
//!
//! ## Modules
//!
//! - [`tree`] - Node arena, tree edits, style setters, layout accessors
//! - [`node`] - Per-node state and the measure/baseline/dirtied callbacks
//! - [`style`] - The style struct and edge/gutter resolution
//! - [`config`] - Behavior toggles (web defaults, errata, pixel rounding)
//! - [`enums`], [`value`], [`layout`], [`math`] - Supporting types
//!
//! The flexbox pass itself, measurement caching, and pixel-grid rounding
//! live in a private `algorithm` module behind
//! [`LayoutTree::calculate_layout`].

mod algorithm;
pub mod config;
pub mod enums;
pub mod layout;
pub mod math;
pub mod node;
pub mod style;
pub mod tree;
pub mod value;

// Re-export commonly used items
pub use enums::{
    Align, Dimension, Direction, Display, Edge, FlexDirection, Gutter, Justify, LogLevel,
    MeasureMode, NodeType, Overflow, PositionType, Unit, Wrap,
};

pub use config::{CloneNodeFn, Config, Errata, ExperimentalFeatures, LoggerFn};

pub use layout::{CachedMeasurement, LayoutResults, MAX_CACHED_RESULTS};

pub use node::{BaselineFunc, DirtiedFunc, MeasureFunc, Node, Size};

pub use style::Style;

pub use tree::{ConfigId, LayoutTree, NodeId};

pub use value::Value;
