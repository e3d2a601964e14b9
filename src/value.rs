//! Scalar cell values
//!
//! A record cell is a [`Value`]: either a present [`Scalar`] or NA.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::na::NA;
use crate::schema::FieldType;

/// A single non-missing cell value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 text
    Text(String),
    /// Boolean
    Bool(bool),
}

/// A nullable cell value
pub type Value = NA<Scalar>;

impl Scalar {
    /// The field type this scalar belongs to
    pub fn dtype(&self) -> FieldType {
        match self {
            Scalar::Int(_) => FieldType::Int,
            Scalar::Float(_) => FieldType::Float,
            Scalar::Text(_) => FieldType::Text,
            Scalar::Bool(_) => FieldType::Bool,
        }
    }

    /// Numeric view of the scalar (`Int` and `Float` only)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view of the scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Order two scalars.
    ///
    /// `Int` and `Float` compare numerically with each other; text compares
    /// lexicographically and `false < true`. Any other pairing is
    /// incomparable and yields `None`.
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => Some(x.total_cmp(&y)),
                _ => None,
            },
        }
    }
}

fn float_bits(v: f64) -> u64 {
    // -0.0 and 0.0 land in the same group
    if v == 0.0 {
        0f64.to_bits()
    } else {
        v.to_bits()
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => float_bits(*a) == float_bits(*b),
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Scalar::Int(v) => v.hash(state),
            Scalar::Float(v) => float_bits(*v).hash(state),
            Scalar::Text(v) => v.hash(state),
            Scalar::Bool(v) => v.hash(state),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(v) => write!(f, "{}", v),
            Scalar::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

/// Build a present cell value from anything convertible to a [`Scalar`]
pub fn val(v: impl Into<Scalar>) -> Value {
    NA::Value(v.into())
}

/// The missing cell value
pub fn na() -> Value {
    NA::NA
}
