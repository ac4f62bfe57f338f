//! Template document to [`Tape`]

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::{Instruction, Tape};
use crate::error::TemplateError;
use crate::intern::Interner;
use crate::value::{PlaceholderKind, Value};

/// Compile `doc` without interning or caching.
///
/// [`Engine::compile_template`](crate::Engine::compile_template) is the
/// cached entry point.
pub fn compile(doc: &Value) -> Result<Tape, TemplateError> {
    Compiler::new(None).compile(doc)
}

pub(crate) struct Compiler<'i> {
    tape: Vec<Instruction>,
    slots: HashMap<(Arc<str>, PlaceholderKind), usize>,
    interner: Option<&'i mut dyn Interner>,
}

impl<'i> Compiler<'i> {
    pub(crate) fn new(interner: Option<&'i mut dyn Interner>) -> Self {
        Self {
            tape: Vec::new(),
            slots: HashMap::new(),
            interner,
        }
    }

    pub(crate) fn compile(mut self, doc: &Value) -> Result<Tape, TemplateError> {
        self.walk(doc)?;

        while matches!(self.tape.last(), Some(Instruction::Pop(_))) {
            self.tape.pop();
        }
        if self.slots.is_empty() {
            return Ok(Tape::default());
        }

        let max_depth = replay_depth(&self.tape);
        let mut instructions = Vec::with_capacity(self.tape.len() + 2);
        instructions.push(Instruction::AllocateSlots(self.slots.len()));
        instructions.push(Instruction::AllocateStack(max_depth));
        instructions.append(&mut self.tape);

        trace!(
            instructions = instructions.len(),
            slots = self.slots.len(),
            max_depth,
            "compiled template"
        );
        Ok(Tape {
            instructions,
            slots: self.slots.len(),
            max_depth,
        })
    }

    fn walk(&mut self, node: &Value) -> Result<(), TemplateError> {
        match node {
            Value::Object(map) => {
                for (key, child) in map.iter() {
                    self.tape.push(Instruction::EnterKey(key.clone()));
                    self.walk(child)?;
                    if let Some((kind, name)) = PlaceholderKind::split(key) {
                        if !kind.allowed_as_key() {
                            return Err(TemplateError::KeyKind {
                                key: key.to_string(),
                            });
                        }
                        let slot = self.slot(kind, name);
                        self.tape.push(Instruction::ReplaceKey(slot));
                    }
                    self.pop();
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    self.tape.push(Instruction::EnterIndex(i));
                    self.walk(child)?;
                    self.pop();
                }
            }
            Value::Placeholder(p) => {
                let slot = self.slot(p.kind, &p.name);
                self.tape.push(Instruction::ReplaceValue(slot));
            }
            _ => {}
        }
        Ok(())
    }

    /// Slot for `(name, kind)`, emitting its fill sequence on first use.
    fn slot(&mut self, kind: PlaceholderKind, name: &str) -> usize {
        let name = match self.interner.as_deref_mut() {
            Some(interner) => interner.intern(name),
            None => Arc::from(name),
        };
        if let Some(&slot) = self.slots.get(&(name.clone(), kind)) {
            return slot;
        }

        let slot = self.slots.len();
        self.slots.insert((name.clone(), kind), slot);
        match kind {
            PlaceholderKind::Literal => self.tape.push(Instruction::Literal(name)),
            _ => {
                self.tape.push(Instruction::Fetch(name));
                self.tape.push(Instruction::Coerce(kind));
            }
        }
        self.tape.push(Instruction::FillSlot(slot));
        slot
    }

    /// Close one level: drop an enter that reached nothing, or fold into
    /// the previous pop.
    fn pop(&mut self) {
        match self.tape.last_mut() {
            Some(Instruction::EnterKey(_) | Instruction::EnterIndex(_)) => {
                self.tape.pop();
            }
            Some(Instruction::Pop(n)) => *n += 1,
            _ => self.tape.push(Instruction::Pop(1)),
        }
    }
}

fn replay_depth(tape: &[Instruction]) -> usize {
    let mut depth = 1usize;
    let mut max = 1;
    for instruction in tape {
        match instruction {
            Instruction::EnterKey(_) | Instruction::EnterIndex(_) => {
                depth += 1;
                max = max.max(depth);
            }
            Instruction::Pop(n) => depth = depth.saturating_sub(*n),
            _ => {}
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;
    use Instruction::*;

    fn tape(text: &str) -> Tape {
        compile(&parse(text).unwrap()).unwrap()
    }

    #[test]
    fn test_no_placeholders_is_empty() {
        let t = tape(r#"{"a":[1,2,{"b":"c"}],"d":null}"#);
        assert!(t.is_empty());
        assert_eq!(t.slot_count(), 0);
    }

    #[test]
    fn test_single_value_placeholder() {
        let t = tape(r#"{"a":"~S:name"}"#);
        assert_eq!(
            t.instructions(),
            [
                AllocateSlots(1),
                AllocateStack(2),
                EnterKey("a".into()),
                Fetch("name".into()),
                Coerce(PlaceholderKind::String),
                FillSlot(0),
                ReplaceValue(0),
            ]
        );
    }

    #[test]
    fn test_pops_fold_and_empty_enters_elide() {
        let t = tape(r#"{"x":1,"a":{"b":["~N:n"]},"c":"~N:n"}"#);
        assert_eq!(
            t.instructions(),
            [
                AllocateSlots(1),
                AllocateStack(4),
                EnterKey("a".into()),
                EnterKey("b".into()),
                EnterIndex(0),
                Fetch("n".into()),
                Coerce(PlaceholderKind::Number),
                FillSlot(0),
                ReplaceValue(0),
                Pop(3),
                EnterKey("c".into()),
                ReplaceValue(0),
            ]
        );
    }

    #[test]
    fn test_same_name_different_kind_gets_own_slot() {
        let t = tape(r#"["~S:v","~N:v","~S:v"]"#);
        assert_eq!(t.slot_count(), 2);
        let fetches = t
            .instructions()
            .iter()
            .filter(|i| matches!(i, Fetch(_)))
            .count();
        assert_eq!(fetches, 2);
    }

    #[test]
    fn test_key_placeholder() {
        let t = tape(r#"{"~S:k":1}"#);
        assert_eq!(
            t.instructions(),
            [
                AllocateSlots(1),
                AllocateStack(2),
                EnterKey("~S:k".into()),
                Fetch("k".into()),
                Coerce(PlaceholderKind::String),
                FillSlot(0),
                ReplaceKey(0),
            ]
        );
    }

    #[test]
    fn test_literal_never_fetches() {
        let t = tape(r#"["~L:~S:x"]"#);
        assert!(t.instructions().contains(&Literal("~S:x".into())));
        assert!(!t.instructions().iter().any(|i| matches!(i, Fetch(_))));
    }

    #[test]
    fn test_disallowed_key_kinds() {
        for key in ["~N:k", "~B:k", "~J:k", "~T:k"] {
            let doc = parse(&format!(r#"{{"{key}":1}}"#)).unwrap();
            assert_eq!(
                compile(&doc),
                Err(TemplateError::KeyKind { key: key.to_string() })
            );
        }
    }

    #[test]
    fn test_root_placeholder() {
        let t = tape(r#""~J:doc""#);
        assert_eq!(t.max_depth(), 1);
        assert_eq!(t.instructions().last(), Some(&ReplaceValue(0)));
    }

    #[test]
    fn test_display_listing() {
        let listing = tape(r#"["~B:f"]"#).to_string();
        assert!(listing.starts_with("ALLOCATE_SLOTS 1\nALLOCATE_STACK 2\nENTER_INDEX 0\n"));
        assert!(listing.contains("COERCE Bool"));
    }
}
