//! Scalar helpers for layout arithmetic.
//!
//! Layout values use `f32` with NaN as the "undefined" sentinel. Every
//! comparison of layout values goes through the tolerant equality here so
//! floating-point noise never dirties a node or misses a cache entry.

use crate::enums::Unit;
use crate::value::Value;

/// Comparison tolerance for layout values.
const EPSILON: f32 = 0.0001;

// =============================================================================
// UNDEFINED SENTINEL
// =============================================================================

/// The "no value" sentinel for layout floats.
pub const UNDEFINED: f32 = f32::NAN;

/// Whether a layout float carries no value.
#[inline]
pub fn is_undefined(value: f32) -> bool {
    value.is_nan()
}

/// Whether a layout float carries a value.
#[inline]
pub fn is_defined(value: f32) -> bool {
    !value.is_nan()
}

// =============================================================================
// TOLERANT EQUALITY
// =============================================================================

/// Approximate equality for layout floats. Two undefined values are equal.
pub fn floats_equal(a: f32, b: f32) -> bool {
    if is_defined(a) && is_defined(b) {
        return (a - b).abs() < EPSILON;
    }
    is_undefined(a) && is_undefined(b)
}

/// Approximate equality at `f64` precision, for pixel-grid math.
pub fn doubles_equal(a: f64, b: f64) -> bool {
    if !a.is_nan() && !b.is_nan() {
        return (a - b).abs() < EPSILON as f64;
    }
    a.is_nan() && b.is_nan()
}

// =============================================================================
// ABSORBING MIN / MAX
// =============================================================================

/// Max where an undefined operand is absorbed by the other.
pub fn float_max(a: f32, b: f32) -> f32 {
    if is_defined(a) && is_defined(b) {
        return a.max(b);
    }
    if is_undefined(a) { b } else { a }
}

/// Min where an undefined operand is absorbed by the other.
pub fn float_min(a: f32, b: f32) -> f32 {
    if is_defined(a) && is_defined(b) {
        return a.min(b);
    }
    if is_undefined(a) { b } else { a }
}

/// Replace an undefined value with zero.
#[inline]
pub fn sanitize(value: f32) -> f32 {
    if is_undefined(value) { 0.0 } else { value }
}

// =============================================================================
// VALUE RESOLUTION
// =============================================================================

/// Resolve a style value against an owner size. Percent against an
/// undefined owner resolves to undefined, never zero.
pub fn resolve_value(value: Value, owner_size: f32) -> f32 {
    match value.unit {
        Unit::Point => value.value,
        Unit::Percent => value.value * owner_size * 0.01,
        Unit::Undefined | Unit::Auto => UNDEFINED,
    }
}

/// Resolve a margin value; `auto` margins resolve to zero here and are
/// given their free-space semantics later in the algorithm.
pub fn resolve_value_margin(value: Value, owner_size: f32) -> f32 {
    if value.unit == Unit::Auto {
        0.0
    } else {
        resolve_value(value, owner_size)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_is_nan() {
        assert!(is_undefined(UNDEFINED));
        assert!(is_defined(0.0));
        assert!(is_defined(-1.5));
    }

    #[test]
    fn tolerant_equality() {
        assert!(floats_equal(1.0, 1.0 + 0.00005));
        assert!(!floats_equal(1.0, 1.001));
        assert!(floats_equal(UNDEFINED, UNDEFINED));
        assert!(!floats_equal(UNDEFINED, 0.0));
        assert!(!floats_equal(0.0, UNDEFINED));
    }

    #[test]
    fn max_absorbs_undefined() {
        assert_eq!(float_max(UNDEFINED, 3.0), 3.0);
        assert_eq!(float_max(3.0, UNDEFINED), 3.0);
        assert!(is_undefined(float_max(UNDEFINED, UNDEFINED)));
        assert_eq!(float_max(2.0, 3.0), 3.0);
    }

    #[test]
    fn min_absorbs_undefined() {
        assert_eq!(float_min(UNDEFINED, 3.0), 3.0);
        assert_eq!(float_min(3.0, UNDEFINED), 3.0);
        assert!(is_undefined(float_min(UNDEFINED, UNDEFINED)));
        assert_eq!(float_min(2.0, 3.0), 2.0);
    }

    #[test]
    fn percent_against_undefined_owner() {
        let half = Value::percent(50.0);
        assert_eq!(resolve_value(half, 200.0), 100.0);
        assert!(is_undefined(resolve_value(half, UNDEFINED)));
    }

    #[test]
    fn auto_margin_resolves_to_zero() {
        assert_eq!(resolve_value_margin(Value::auto(), 100.0), 0.0);
        assert!(is_undefined(resolve_value(Value::auto(), 100.0)));
    }

    #[test]
    fn sanitize_clears_nan() {
        assert_eq!(sanitize(UNDEFINED), 0.0);
        assert_eq!(sanitize(5.0), 5.0);
    }
}
