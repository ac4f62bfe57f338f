//! Where template substitution values come from

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::value::Value;

/// Supplies values for placeholder names at apply time.
///
/// `None` means the name is unbound; the placeholder then becomes `null`.
pub trait SubstitutionSource {
    /// Look up the value bound to `name`.
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl<S: SubstitutionSource + ?Sized> SubstitutionSource for &S {
    fn lookup(&self, name: &str) -> Option<Value> {
        (**self).lookup(name)
    }
}

/// An object document used directly as a mapping. Non-objects bind nothing.
impl SubstitutionSource for Value {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.as_object()?.get(name).cloned()
    }
}

impl SubstitutionSource for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl SubstitutionSource for IndexMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

// ═══════════════════════════════════════════════════════════════════
// Bindings
// ═══════════════════════════════════════════════════════════════════

/// Name to value mapping for template substitution.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    bindings: IndexMap<String, Value>,
}

impl Bindings {
    /// Create new empty bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    /// Create bindings with a single entry.
    pub fn single(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut bindings = Self::new();
        bindings.bind(name, value);
        bindings
    }

    /// Builder form of [`Bindings::bind`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind(name, value);
        self
    }

    /// Get a binding by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Check if a binding exists.
    pub fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Get all binding names, in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.bindings.keys().map(|s| s.as_str()).collect()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if bindings are empty.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Consult `fallback` for names this mapping does not bind.
    pub fn or<F: SubstitutionSource>(self, fallback: F) -> Fallback<Self, F> {
        Fallback {
            primary: self,
            fallback,
        }
    }
}

impl SubstitutionSource for Bindings {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut bindings = Self::new();
        for (name, value) in iter {
            bindings.bind(name, value);
        }
        bindings
    }
}

// ═══════════════════════════════════════════════════════════════════
// External lookups
// ═══════════════════════════════════════════════════════════════════

/// Delegates lookups to a host callback, such as a variable table owned by
/// an embedding interpreter.
///
/// ```
/// use jsonweave::{LookupFn, SubstitutionSource, Value};
///
/// let source = LookupFn(|name: &str| (name == "user").then(|| Value::from("ada")));
/// assert_eq!(source.lookup("user"), Some(Value::from("ada")));
/// assert_eq!(source.lookup("other"), None);
/// ```
pub struct LookupFn<F>(pub F);

impl<F: Fn(&str) -> Option<Value>> SubstitutionSource for LookupFn<F> {
    fn lookup(&self, name: &str) -> Option<Value> {
        (self.0)(name)
    }
}

/// Tries `primary` first, then `fallback`.
#[derive(Debug, Clone)]
pub struct Fallback<A, B> {
    primary: A,
    fallback: B,
}

impl<A: SubstitutionSource, B: SubstitutionSource> SubstitutionSource for Fallback<A, B> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.primary
            .lookup(name)
            .or_else(|| self.fallback.lookup(name))
    }
}
