//! Value representation for JSON documents

mod display;
pub(crate) mod impls;
pub(crate) mod number;
mod placeholder;

pub use number::Number;
pub use placeholder::{Placeholder, PlaceholderKind};

use std::sync::Arc;

use indexmap::IndexMap;

/// Ordered object storage. Keys keep insertion order.
pub type Map = IndexMap<Arc<str>, Value>;

/// A JSON document node.
///
/// Payloads are held behind `Arc`, so cloning a `Value` is cheap and
/// shares structure with the original. Mutation goes through
/// [`Value::array_mut`] / [`Value::object_mut`], which duplicate a shared
/// container before handing out a mutable reference. Another holder's view
/// is therefore never changed underneath it.
#[derive(Clone, Default)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Scalars
    // ═══════════════════════════════════════════════════════════════════
    /// JSON `null`
    #[default]
    Null,

    /// JSON `true` / `false`
    Bool(bool),

    /// Number, stored as its original lexical text
    Number(Number),

    /// UTF-8 string
    String(Arc<str>),

    // ═══════════════════════════════════════════════════════════════════
    // Containers
    // ═══════════════════════════════════════════════════════════════════
    /// Ordered sequence
    Array(Arc<Vec<Value>>),

    /// Ordered string-keyed mapping
    Object(Arc<Map>),

    // ═══════════════════════════════════════════════════════════════════
    // Templates
    // ═══════════════════════════════════════════════════════════════════
    /// Named substitution point, written as `~X:name`
    Placeholder(Placeholder),
}

/// The variant of a [`Value`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// Number
    Number,
    /// String
    String,
    /// Array
    Array,
    /// Object
    Object,
    /// Placeholder of the given kind
    Placeholder(PlaceholderKind),
}
