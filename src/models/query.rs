//! Positional query arguments.
//!
//! Executor hooks receive the same argument slice the driver binds, so
//! [`QueryArg`] is the single currency for parameters of any supported type.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A positional argument for a parameterized query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryArg {
    /// NULL value
    Null,
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(JsonValue),
}

impl QueryArg {
    /// Check if this argument is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this argument for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Json(_) => "json",
        }
    }
}

impl From<bool> for QueryArg {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),+) => {
        $(
            impl From<$t> for QueryArg {
                fn from(v: $t) -> Self {
                    Self::Int(i64::from(v))
                }
            }
        )+
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for QueryArg {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for QueryArg {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for QueryArg {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for QueryArg {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for QueryArg {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&[u8]> for QueryArg {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<JsonValue> for QueryArg {
    fn from(v: JsonValue) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<QueryArg>> From<Option<T>> for QueryArg {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Build a `Vec<QueryArg>` from a list of values of mixed types.
///
/// ```
/// use dbreg::{QueryArg, query_args};
///
/// let args = query_args![1, "alice", None::<i64>, true];
/// assert_eq!(args[1], QueryArg::Text("alice".into()));
/// assert!(args[2].is_null());
/// ```
#[macro_export]
macro_rules! query_args {
    () => {
        ::std::vec::Vec::<$crate::QueryArg>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::QueryArg::from($value)),+]
    };
}
