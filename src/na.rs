use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::ops::Add;

use serde::{Serialize, Serializer};

/// A value that may be missing (NA, Not Available)
///
/// Every nullable cell in a table is an `NA<T>`. The per-reducer rules for how
/// missing values flow through aggregation live in
/// [`Reducer::null_policy`](crate::aggregate::Reducer::null_policy).
#[derive(Clone, Copy)]
pub enum NA<T> {
    /// A present value
    Value(T),
    /// A missing value
    NA,
}

impl<T> NA<T> {
    /// Whether the value is missing
    pub fn is_na(&self) -> bool {
        match self {
            NA::Value(_) => false,
            NA::NA => true,
        }
    }

    /// Whether a value is present
    pub fn is_value(&self) -> bool {
        !self.is_na()
    }

    /// Borrow the value, if present
    pub fn value(&self) -> Option<&T> {
        match self {
            NA::Value(v) => Some(v),
            NA::NA => None,
        }
    }

    /// Borrow the value, falling back to `default` when missing
    pub fn value_or<'a>(&'a self, default: &'a T) -> &'a T {
        match self {
            NA::Value(v) => v,
            NA::NA => default,
        }
    }

    /// Map the inner value, keeping NA as NA
    pub fn map<U, F>(&self, f: F) -> NA<U>
    where
        F: FnOnce(&T) -> U,
    {
        match self {
            NA::Value(v) => NA::Value(f(v)),
            NA::NA => NA::NA,
        }
    }

    /// Convert into an `Option`
    pub fn into_option(self) -> Option<T> {
        self.into()
    }
}

impl<T> From<T> for NA<T> {
    fn from(value: T) -> Self {
        NA::Value(value)
    }
}

impl<T> From<Option<T>> for NA<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => NA::Value(v),
            None => NA::NA,
        }
    }
}

impl<T> From<NA<T>> for Option<T> {
    fn from(na: NA<T>) -> Self {
        match na {
            NA::Value(v) => Some(v),
            NA::NA => None,
        }
    }
}

impl<T: Debug> Debug for NA<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NA::Value(v) => write!(f, "{:?}", v),
            NA::NA => write!(f, "NA"),
        }
    }
}

impl<T: Display> Display for NA<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NA::Value(v) => write!(f, "{}", v),
            NA::NA => write!(f, "NA"),
        }
    }
}

// NA equals NA so that missing values form their own group key
impl<T: PartialEq> PartialEq for NA<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NA::Value(a), NA::Value(b)) => a == b,
            (NA::NA, NA::NA) => true,
            _ => false,
        }
    }
}

impl<T: Eq> Eq for NA<T> {}

impl<T: Hash> Hash for NA<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            NA::Value(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            NA::NA => {
                1u8.hash(state);
            }
        }
    }
}

impl<T: Add<Output = T>> Add for NA<T> {
    type Output = NA<T>;

    fn add(self, other: Self) -> Self::Output {
        match (self, other) {
            (NA::Value(a), NA::Value(b)) => NA::Value(a + b),
            _ => NA::NA,
        }
    }
}

impl<T: Serialize> Serialize for NA<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            NA::Value(v) => v.serialize(serializer),
            NA::NA => serializer.serialize_none(),
        }
    }
}
