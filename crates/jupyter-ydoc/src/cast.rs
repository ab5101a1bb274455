//! Numeric kind normalization for JSON values.
//!
//! Y.js (and therefore every peer speaking its update format) has a single
//! number type. Integers written into a shared document are stored as floats,
//! and turned back into integers when the document is read, so notebook
//! fields such as `execution_count` and `nbformat` keep their JSON shape.

use serde_json::{Number, Value};

/// The kind of a JSON number leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Int,
    Float,
}

impl NumberKind {
    /// Classify a JSON number.
    pub fn of(n: &Number) -> Self {
        if n.is_f64() {
            NumberKind::Float
        } else {
            NumberKind::Int
        }
    }
}

/// Recursively convert every number of kind `from` to kind `to`.
///
/// Objects and arrays are traversed in place; strings, booleans, null and
/// numbers of another kind are left untouched. Floats only become integers
/// when they are integral and fit in an `i64`, so the conversion never loses
/// information.
pub fn cast_all(value: &mut Value, from: NumberKind, to: NumberKind) {
    if from == to {
        return;
    }

    match value {
        Value::Object(map) => {
            for v in map.values_mut() {
                cast_all(v, from, to);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                cast_all(v, from, to);
            }
        }
        Value::Number(n) if NumberKind::of(n) == from => {
            if let Some(converted) = cast_number(n, to) {
                *n = converted;
            }
        }
        _ => {}
    }
}

fn cast_number(n: &Number, to: NumberKind) -> Option<Number> {
    match to {
        NumberKind::Float => n.as_f64().and_then(Number::from_f64),
        NumberKind::Int => {
            let f = n.as_f64()?;
            // i64::MAX is not representable as f64; the bound is exclusive.
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Some(Number::from(f as i64))
            } else {
                None
            }
        }
    }
}

/// Read a JSON number as an integer, accepting integral floats.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}
