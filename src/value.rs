//! Style length values: points, percentages, `auto`, or undefined.

use crate::enums::Unit;
use crate::math;

/// A style length. Undefined and auto carry a NaN payload so accidental
/// arithmetic on them stays undefined.
#[derive(Debug, Clone, Copy)]
pub struct Value {
    pub value: f32,
    pub unit: Unit,
}

pub const UNDEFINED: Value = Value { value: f32::NAN, unit: Unit::Undefined };
pub const AUTO: Value = Value { value: f32::NAN, unit: Unit::Auto };
pub const ZERO: Value = Value { value: 0.0, unit: Unit::Point };

impl Value {
    #[inline]
    pub fn points(value: f32) -> Value {
        if math::is_undefined(value) {
            UNDEFINED
        } else {
            Value { value, unit: Unit::Point }
        }
    }

    #[inline]
    pub fn percent(value: f32) -> Value {
        if math::is_undefined(value) {
            UNDEFINED
        } else {
            Value { value, unit: Unit::Percent }
        }
    }

    #[inline]
    pub fn auto() -> Value {
        AUTO
    }

    #[inline]
    pub fn undefined() -> Value {
        UNDEFINED
    }

    #[inline]
    pub fn is_undefined(self) -> bool {
        self.unit == Unit::Undefined
    }

    #[inline]
    pub fn is_auto(self) -> bool {
        self.unit == Unit::Auto
    }

    /// Resolve against an owner size. Percent against an undefined owner
    /// stays undefined.
    #[inline]
    pub fn resolve(self, owner_size: f32) -> f32 {
        math::resolve_value(self, owner_size)
    }
}

impl Default for Value {
    fn default() -> Value {
        UNDEFINED
    }
}

/// Unit-aware equality: undefined and auto compare by unit alone, point and
/// percent by tolerant payload comparison.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        if self.unit != other.unit {
            return false;
        }
        match self.unit {
            Unit::Undefined | Unit::Auto => true,
            Unit::Point | Unit::Percent => math::floats_equal(self.value, other.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_payload_collapses_to_undefined() {
        assert!(Value::points(f32::NAN).is_undefined());
        assert!(Value::percent(f32::NAN).is_undefined());
    }

    #[test]
    fn equality_by_unit() {
        assert_eq!(Value::auto(), Value::auto());
        assert_eq!(Value::undefined(), Value::undefined());
        assert_ne!(Value::auto(), Value::undefined());
        assert_eq!(Value::points(10.0), Value::points(10.0 + 0.00001));
        assert_ne!(Value::points(10.0), Value::percent(10.0));
    }

    #[test]
    fn resolution() {
        assert_eq!(Value::points(10.0).resolve(100.0), 10.0);
        assert_eq!(Value::percent(10.0).resolve(100.0), 10.0);
        assert!(crate::math::is_undefined(Value::auto().resolve(100.0)));
    }
}
