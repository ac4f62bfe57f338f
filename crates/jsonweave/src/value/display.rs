//! Display and Debug implementations for Value

use std::fmt;

use super::*;

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n.as_str()),
            Value::String(s) => write!(f, "{:?}", s.as_ref()),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(map) => f
                .debug_map()
                .entries(map.iter().map(|(k, v)| (k.as_ref(), v)))
                .finish(),
            Value::Placeholder(p) => write!(f, "<{}>", p),
        }
    }
}

/// Canonical JSON text, as produced by [`crate::to_string`].
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::serialize::to_string(self))
    }
}
