//! Compiled templates: compile once, apply many times
//!
//! A template is an ordinary document containing placeholders. Compiling it
//! walks the tree once and records a [`Tape`]: the path to every placeholder
//! as enter/pop instructions, plus one slot per distinct `(name, kind)` pair.
//! Applying the tape fetches each slot's value from a
//! [`SubstitutionSource`] once, then rebuilds only the containers on the
//! live paths. Everything else stays shared with the template.
//!
//! ```
//! use jsonweave::{Bindings, Engine};
//!
//! let mut engine = Engine::new();
//! let doc = engine.parse(r#"{"user":"~S:name","tags":["~S:name","x"]}"#).unwrap();
//! let out = engine.template(&doc, &Bindings::single("name", "bob")).unwrap();
//! assert_eq!(out.to_string(), r#"{"user":"bob","tags":["bob","x"]}"#);
//! ```

pub(crate) mod coerce;
mod compiler;
mod executor;
mod source;

pub use compiler::compile;
pub(crate) use compiler::Compiler;
pub(crate) use executor::Executor;
pub use source::{Bindings, Fallback, LookupFn, SubstitutionSource};

use std::fmt;
use std::sync::Arc;

use crate::value::PlaceholderKind;

/// One step of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Reserve this many slots
    AllocateSlots(usize),
    /// Reserve a container stack of this depth, root included
    AllocateStack(usize),
    /// Look a name up in the substitution source
    Fetch(Arc<str>),
    /// Load a literal string without any lookup
    Literal(Arc<str>),
    /// Convert the fetched value to the given placeholder kind
    Coerce(PlaceholderKind),
    /// Store the current value in a slot
    FillSlot(usize),
    /// Descend into an object member
    EnterKey(Arc<str>),
    /// Descend into an array element
    EnterIndex(usize),
    /// Return this many levels towards the root
    Pop(usize),
    /// Replace the current node with a slot's value
    ReplaceValue(usize),
    /// Rename the current member to a slot's text
    ReplaceKey(usize),
}

/// A compiled template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tape {
    instructions: Vec<Instruction>,
    slots: usize,
    max_depth: usize,
}

impl Tape {
    /// The instruction sequence.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// A template with no placeholders compiles to an empty tape.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of distinct `(name, kind)` slots.
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    /// Deepest container stack the tape needs, root included.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// One instruction per line, for debugging.
impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            match instruction {
                Instruction::AllocateSlots(n) => writeln!(f, "ALLOCATE_SLOTS {n}")?,
                Instruction::AllocateStack(n) => writeln!(f, "ALLOCATE_STACK {n}")?,
                Instruction::Fetch(name) => writeln!(f, "FETCH {name:?}")?,
                Instruction::Literal(name) => writeln!(f, "LITERAL {name:?}")?,
                Instruction::Coerce(kind) => writeln!(f, "COERCE {kind:?}")?,
                Instruction::FillSlot(i) => writeln!(f, "FILL_SLOT {i}")?,
                Instruction::EnterKey(key) => writeln!(f, "ENTER_KEY {key:?}")?,
                Instruction::EnterIndex(i) => writeln!(f, "ENTER_INDEX {i}")?,
                Instruction::Pop(n) => writeln!(f, "POP {n}")?,
                Instruction::ReplaceValue(i) => writeln!(f, "REPLACE_VALUE {i}")?,
                Instruction::ReplaceKey(i) => writeln!(f, "REPLACE_KEY {i}")?,
            }
        }
        Ok(())
    }
}
