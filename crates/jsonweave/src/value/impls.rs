//! Value trait implementations: constructors, predicates, extractors, copy-on-write, From traits, PartialEq

use std::sync::Arc;

use super::*;
use crate::error::{type_name, ValueError};

// ═══════════════════════════════════════════════════════════════════
// Convenience Constructors
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Create a plain string value. Prefixes are not interpreted.
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    /// Create a string value, turning `~X:` text into a placeholder.
    pub fn string_or_placeholder(s: &str) -> Self {
        match PlaceholderKind::split(s) {
            Some((kind, name)) => Value::Placeholder(Placeholder::new(kind, name)),
            None => Value::String(Arc::from(s)),
        }
    }

    /// Create a number from its lexical text.
    pub fn number(text: &str) -> Result<Self, ValueError> {
        Number::new(text).map(Value::Number)
    }

    /// Create a boolean from a word.
    ///
    /// Accepts `true`/`false`, `yes`/`no`, `on`/`off` and `1`/`0`, in any case.
    pub fn bool_from_text(text: &str) -> Result<Self, ValueError> {
        parse_bool_word(text)
            .map(Value::Bool)
            .ok_or_else(|| ValueError::InvalidBoolean(text.to_string()))
    }

    /// Create an array value
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }

    /// Create an empty object value
    pub fn object() -> Self {
        Value::Object(Arc::new(Map::new()))
    }

    /// Create an object value from a map
    pub fn from_map(map: Map) -> Self {
        Value::Object(Arc::new(map))
    }

    /// Create a placeholder value
    pub fn placeholder(kind: PlaceholderKind, name: impl Into<Arc<str>>) -> Self {
        Value::Placeholder(Placeholder::new(kind, name))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Type Predicates
    // ═══════════════════════════════════════════════════════════════════

    /// The variant of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
            Value::Placeholder(p) => Kind::Placeholder(p.kind),
        }
    }

    /// JSON type name (`"object"`, `"string"`, ...)
    pub fn type_name(&self) -> &'static str {
        type_name(self)
    }

    /// Check if value is `null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is an array or object
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Check if value is a placeholder
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Value::Placeholder(_))
    }

    /// Whether another holder shares this value's container payload.
    pub fn is_shared(&self) -> bool {
        match self {
            Value::Array(items) => Arc::strong_count(items) > 1,
            Value::Object(map) => Arc::strong_count(map) > 1,
            _ => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Value Extractors
    // ═══════════════════════════════════════════════════════════════════

    /// Extract bool if this is a Bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract the number if this is a Number
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Extract string slice if this is a String
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract the elements if this is an Array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Extract the map if this is an Object
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Extract the placeholder if this is one
    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Value::Placeholder(p) => Some(p),
            _ => None,
        }
    }

    /// Text used when this value is substituted as a string.
    ///
    /// Scalars give their plain text, placeholders their prefixed form, and
    /// containers their canonical serialization. `null` has no text.
    pub fn substitution_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.as_str().to_string()),
            Value::String(s) => Some(s.to_string()),
            Value::Placeholder(p) => Some(p.text()),
            Value::Array(_) | Value::Object(_) => Some(crate::serialize::to_string(self)),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Copy-on-write Access
    // ═══════════════════════════════════════════════════════════════════

    /// Break sharing of this value's container payload.
    ///
    /// Only the container's own storage is copied; its children stay shared
    /// until they are themselves mutated.
    pub fn make_unique(&mut self) {
        match self {
            Value::Array(items) => {
                Arc::make_mut(items);
            }
            Value::Object(map) => {
                Arc::make_mut(map);
            }
            _ => {}
        }
    }

    /// Mutable access to array elements, duplicating them first if shared.
    pub fn array_mut(&mut self) -> Result<&mut Vec<Value>, ValueError> {
        match self {
            Value::Array(items) => Ok(Arc::make_mut(items)),
            other => Err(ValueError::TypeError {
                expected: "array",
                got: type_name(other),
            }),
        }
    }

    /// Mutable access to object members, duplicating them first if shared.
    pub fn object_mut(&mut self) -> Result<&mut Map, ValueError> {
        match self {
            Value::Object(map) => Ok(Arc::make_mut(map)),
            other => Err(ValueError::TypeError {
                expected: "object",
                got: type_name(other),
            }),
        }
    }

    /// Mutable access to array elements only if no other holder exists.
    pub fn try_array_mut(&mut self) -> Result<&mut Vec<Value>, ValueError> {
        match self {
            Value::Array(items) => Arc::get_mut(items).ok_or(ValueError::Shared {
                type_name: "array",
            }),
            other => Err(ValueError::TypeError {
                expected: "array",
                got: type_name(other),
            }),
        }
    }

    /// Mutable access to object members only if no other holder exists.
    pub fn try_object_mut(&mut self) -> Result<&mut Map, ValueError> {
        match self {
            Value::Object(map) => Arc::get_mut(map).ok_or(ValueError::Shared {
                type_name: "object",
            }),
            other => Err(ValueError::TypeError {
                expected: "object",
                got: type_name(other),
            }),
        }
    }

    /// Move the value out, leaving `null` behind.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }
}

/// Boolean words accepted for `~B:` substitutions and [`Value::bool_from_text`].
pub(crate) fn parse_bool_word(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════
// PartialEq Implementation
// ═══════════════════════════════════════════════════════════════════

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,

            // Numbers compare by lexical text
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,

            // Shared payloads are trivially equal
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Object(a), Value::Object(b)) => {
                Arc::ptr_eq(a, b) || (a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y))
            }

            (Value::Placeholder(a), Value::Placeholder(b)) => a == b,

            // Different types are never equal
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// From Trait Implementations
// ═══════════════════════════════════════════════════════════════════

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<Placeholder> for Value {
    fn from(p: Placeholder) -> Self {
        Value::Placeholder(p)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::from_map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

macro_rules! value_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

value_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::array(iter.into_iter().collect())
    }
}

impl<K: Into<Arc<str>>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::from_map(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
