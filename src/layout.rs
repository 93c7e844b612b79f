//! Mutable layout output per node, plus the measurement cache entries.

use crate::enums::{Direction, MeasureMode};
use crate::math;

/// Measurement cache capacity per node. Profiling of the original engine
/// showed ~98% of layouts need fewer than 8 distinct entries.
pub const MAX_CACHED_RESULTS: usize = 8;

// =============================================================================
// CACHED MEASUREMENT
// =============================================================================

/// One (constraints → computed size) cache entry.
#[derive(Debug, Clone, Copy)]
pub struct CachedMeasurement {
    pub available_width: f32,
    pub available_height: f32,
    pub width_measure_mode: MeasureMode,
    pub height_measure_mode: MeasureMode,
    pub computed_width: f32,
    pub computed_height: f32,
}

impl Default for CachedMeasurement {
    fn default() -> CachedMeasurement {
        CachedMeasurement {
            available_width: -1.0,
            available_height: -1.0,
            width_measure_mode: MeasureMode::Undefined,
            height_measure_mode: MeasureMode::Undefined,
            computed_width: -1.0,
            computed_height: -1.0,
        }
    }
}

/// Entry equality ignores an axis's availability when it is undefined on
/// both sides, so NaN constraints still compare equal.
impl PartialEq for CachedMeasurement {
    fn eq(&self, other: &CachedMeasurement) -> bool {
        let mut is_equal = self.width_measure_mode == other.width_measure_mode
            && self.height_measure_mode == other.height_measure_mode;

        if math::is_defined(self.available_width) || math::is_defined(other.available_width) {
            is_equal = is_equal && self.available_width == other.available_width;
        }
        if math::is_defined(self.available_height) || math::is_defined(other.available_height) {
            is_equal = is_equal && self.available_height == other.available_height;
        }
        if math::is_defined(self.computed_width) || math::is_defined(other.computed_width) {
            is_equal = is_equal && self.computed_width == other.computed_width;
        }
        if math::is_defined(self.computed_height) || math::is_defined(other.computed_height) {
            is_equal = is_equal && self.computed_height == other.computed_height;
        }
        is_equal
    }
}

// =============================================================================
// LAYOUT RESULTS
// =============================================================================

/// Layout output for one node, written by the algorithm and read by the
/// caller through the tree accessors.
#[derive(Debug, Clone)]
pub struct LayoutResults {
    /// Physical edge offsets (left/top/right/bottom).
    pub position: [f32; 4],
    /// Final width/height.
    pub dimensions: [f32; 2],
    /// Resolved margins per physical edge.
    pub margin: [f32; 4],
    /// Resolved borders per physical edge.
    pub border: [f32; 4],
    /// Resolved padding per physical edge.
    pub padding: [f32; 4],

    pub direction: Direction,
    pub had_overflow: bool,

    pub computed_flex_basis_generation: u32,
    pub computed_flex_basis: f32,

    /// Generation of the layout session that last visited this node.
    pub generation_count: u32,
    pub last_owner_direction: Direction,

    pub next_cached_measurements_index: usize,
    pub cached_measurements: [CachedMeasurement; MAX_CACHED_RESULTS],
    pub measured_dimensions: [f32; 2],

    /// Dedicated slot for the most recent full-layout result.
    pub cached_layout: CachedMeasurement,
}

impl Default for LayoutResults {
    fn default() -> LayoutResults {
        LayoutResults {
            position: [0.0; 4],
            dimensions: [math::UNDEFINED; 2],
            margin: [0.0; 4],
            border: [0.0; 4],
            padding: [0.0; 4],
            direction: Direction::Inherit,
            had_overflow: false,
            computed_flex_basis_generation: 0,
            computed_flex_basis: math::UNDEFINED,
            generation_count: 0,
            last_owner_direction: Direction::Inherit,
            next_cached_measurements_index: 0,
            cached_measurements: [CachedMeasurement::default(); MAX_CACHED_RESULTS],
            measured_dimensions: [math::UNDEFINED; 2],
            cached_layout: CachedMeasurement::default(),
        }
    }
}

impl LayoutResults {
    /// Drop every cached measurement, forcing the next visit to recompute.
    pub fn invalidate_cache(&mut self) {
        self.next_cached_measurements_index = 0;
        self.cached_layout.available_width = -1.0;
        self.cached_layout.available_height = -1.0;
        self.cached_layout.width_measure_mode = MeasureMode::Undefined;
        self.cached_layout.height_measure_mode = MeasureMode::Undefined;
        self.cached_layout.computed_width = -1.0;
        self.cached_layout.computed_height = -1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_equality_ignores_shared_undefined() {
        let a = CachedMeasurement {
            available_width: math::UNDEFINED,
            available_height: 100.0,
            width_measure_mode: MeasureMode::Undefined,
            height_measure_mode: MeasureMode::Exactly,
            computed_width: 40.0,
            computed_height: 100.0,
        };
        let mut b = a;
        assert_eq!(a, b);

        b.available_width = 50.0;
        assert_ne!(a, b);

        b.available_width = math::UNDEFINED;
        b.height_measure_mode = MeasureMode::AtMost;
        assert_ne!(a, b);
    }

    #[test]
    fn invalidate_cache_resets_layout_slot() {
        let mut layout = LayoutResults::default();
        layout.cached_layout.computed_width = 10.0;
        layout.next_cached_measurements_index = 3;
        layout.invalidate_cache();
        assert_eq!(layout.next_cached_measurements_index, 0);
        assert_eq!(layout.cached_layout.computed_width, -1.0);
    }
}
