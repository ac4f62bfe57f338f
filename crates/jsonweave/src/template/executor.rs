//! Stack machine that applies a [`Tape`] to a template document

use std::sync::Arc;

use super::coerce::coerce;
use super::{Instruction, SubstitutionSource, Tape};
use crate::engine::Engine;
use crate::error::{TemplateError, ValueError};
use crate::value::{PlaceholderKind, Value};

/// Where a detached child came from in its parent.
enum Step {
    Key {
        key: Arc<str>,
        rename: Option<Rename>,
    },
    Index(usize),
}

/// New key for a member, and the placeholder it came from.
struct Rename {
    key: Arc<str>,
    name: Arc<str>,
}

/// An ancestor of the current target. Its child has been moved out into
/// the target and is put back when the frame is popped.
struct Frame {
    container: Value,
    step: Step,
}

pub(crate) struct Executor<'e, 's> {
    engine: &'e mut Engine,
    source: &'s dyn SubstitutionSource,
    depth: usize,
}

impl<'e, 's> Executor<'e, 's> {
    pub(crate) fn new(engine: &'e mut Engine, source: &'s dyn SubstitutionSource, depth: usize) -> Self {
        Self {
            engine,
            source,
            depth,
        }
    }

    pub(crate) fn run(&mut self, doc: &Value, tape: &Tape) -> Result<Value, TemplateError> {
        let mut target = doc.clone();
        if tape.is_empty() {
            return Ok(target);
        }

        let mut stack: Vec<Frame> = Vec::new();
        let mut stack_limit = 1;
        let mut slots: Vec<Value> = Vec::new();
        let mut slot_names: Vec<Arc<str>> = Vec::new();

        // Registers: last fetched name and value, last produced value
        let mut name: Arc<str> = Arc::from("");
        let mut fetched: Option<Value> = None;
        let mut current = Value::Null;

        for instruction in tape.instructions() {
            match instruction {
                Instruction::AllocateSlots(n) => {
                    slots = vec![Value::Null; *n];
                    slot_names = vec![Arc::from(""); *n];
                }
                Instruction::AllocateStack(depth) => {
                    stack_limit = *depth;
                    stack = Vec::with_capacity(depth.saturating_sub(1));
                }
                Instruction::Fetch(key) => {
                    name = key.clone();
                    fetched = self.source.lookup(key);
                }
                Instruction::Literal(text) => {
                    name = text.clone();
                    current = Value::String(text.clone());
                }
                Instruction::Coerce(kind) => {
                    let value = coerce(*kind, &name, fetched.take(), self.engine.config())?;
                    current = match (*kind, value) {
                        (PlaceholderKind::Template, Value::Null) => Value::Null,
                        (PlaceholderKind::Template, nested) => {
                            self.engine
                                .template_nested(&nested, self.source, self.depth + 1)?
                        }
                        (_, value) => value,
                    };
                }
                Instruction::FillSlot(i) => {
                    let slot = slots.get_mut(*i).ok_or_else(|| bad_slot(*i))?;
                    *slot = current.take();
                    if let Some(slot_name) = slot_names.get_mut(*i) {
                        *slot_name = name.clone();
                    }
                }
                Instruction::EnterKey(key) => {
                    check_depth(stack.len() + 2, stack_limit)?;
                    let child = target
                        .object_mut()
                        .map_err(mismatch)?
                        .get_mut(key.as_ref())
                        .map(Value::take)
                        .ok_or_else(|| TemplateError::Mismatch(format!("no key \"{key}\"")))?;
                    stack.push(Frame {
                        container: std::mem::replace(&mut target, child),
                        step: Step::Key {
                            key: key.clone(),
                            rename: None,
                        },
                    });
                }
                Instruction::EnterIndex(index) => {
                    check_depth(stack.len() + 2, stack_limit)?;
                    let child = target
                        .array_mut()
                        .map_err(mismatch)?
                        .get_mut(*index)
                        .map(Value::take)
                        .ok_or_else(|| TemplateError::Mismatch(format!("no index {index}")))?;
                    stack.push(Frame {
                        container: std::mem::replace(&mut target, child),
                        step: Step::Index(*index),
                    });
                }
                Instruction::Pop(n) => {
                    for _ in 0..*n {
                        let frame = stack
                            .pop()
                            .ok_or_else(|| TemplateError::Mismatch("pop past root".into()))?;
                        target = reattach(frame, target)?;
                    }
                }
                Instruction::ReplaceValue(i) => {
                    target = slots.get(*i).cloned().ok_or_else(|| bad_slot(*i))?;
                }
                Instruction::ReplaceKey(i) => {
                    let value = slots.get(*i).ok_or_else(|| bad_slot(*i))?;
                    let slot_name = slot_names.get(*i).cloned().unwrap_or_else(|| Arc::from(""));
                    let new_key = key_text(value).ok_or_else(|| TemplateError::NullKey {
                        name: slot_name.to_string(),
                    })?;
                    match stack.last_mut() {
                        Some(Frame {
                            step: Step::Key { rename, .. },
                            ..
                        }) => {
                            *rename = Some(Rename {
                                key: self.engine.intern(&new_key),
                                name: slot_name,
                            })
                        }
                        _ => {
                            return Err(TemplateError::Mismatch(
                                "key replacement outside an object".into(),
                            ))
                        }
                    }
                }
            }
        }

        // Trailing pops are trimmed at compile time
        while let Some(frame) = stack.pop() {
            target = reattach(frame, target)?;
        }
        Ok(target)
    }
}

fn reattach(frame: Frame, child: Value) -> Result<Value, TemplateError> {
    let mut parent = frame.container;
    match frame.step {
        Step::Key { key, rename } => {
            let map = parent.object_mut().map_err(mismatch)?;
            match rename {
                Some(rename) if rename.key != key => {
                    // Holds earlier members as renamed and later ones as written
                    if map.contains_key(rename.key.as_ref()) {
                        return Err(TemplateError::DuplicateKey {
                            name: rename.name.to_string(),
                            key: rename.key.to_string(),
                        });
                    }
                    // The renamed member keeps its position
                    match map.shift_remove_full(key.as_ref()) {
                        Some((i, _, _)) => {
                            map.shift_insert(i, rename.key, child);
                        }
                        None => {
                            map.insert(rename.key, child);
                        }
                    }
                }
                _ => {
                    if let Some(slot) = map.get_mut(key.as_ref()) {
                        *slot = child;
                    }
                }
            }
        }
        Step::Index(index) => {
            let items = parent.array_mut().map_err(mismatch)?;
            if let Some(slot) = items.get_mut(index) {
                *slot = child;
            }
        }
    }
    Ok(parent)
}

fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_string()),
        other => other.substitution_text(),
    }
}

fn check_depth(depth: usize, max: usize) -> Result<(), TemplateError> {
    if depth > max {
        Err(TemplateError::StackOverflow { depth, max })
    } else {
        Ok(())
    }
}

fn bad_slot(i: usize) -> TemplateError {
    TemplateError::Mismatch(format!("slot {i} not allocated"))
}

fn mismatch(err: ValueError) -> TemplateError {
    TemplateError::Mismatch(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{compile, Bindings};
    use crate::{parse, Engine};
    use pretty_assertions::assert_eq;

    fn apply(template: &str, source: &Bindings) -> Result<Value, TemplateError> {
        let doc = parse(template).unwrap();
        let tape = compile(&doc).unwrap();
        let mut engine = Engine::new();
        Executor::new(&mut engine, source, 0).run(&doc, &tape)
    }

    #[test]
    fn test_substitutes_value() {
        let out = apply(r#"{"a":"~S:name"}"#, &Bindings::single("name", "bob")).unwrap();
        assert_eq!(out.to_string(), r#"{"a":"bob"}"#);
    }

    #[test]
    fn test_missing_value_is_null() {
        let out = apply(r#"{"a":"~S:name"}"#, &Bindings::new()).unwrap();
        assert_eq!(out.to_string(), r#"{"a":null}"#);
    }

    #[test]
    fn test_template_document_is_untouched() {
        let doc = parse(r#"{"keep":[1,2],"a":["~N:n"]}"#).unwrap();
        let before = doc.to_string();
        let tape = compile(&doc).unwrap();
        let mut engine = Engine::new();
        let out = Executor::new(&mut engine, &Bindings::single("n", 5), 0)
            .run(&doc, &tape)
            .unwrap();

        assert_eq!(doc.to_string(), before);
        assert_eq!(out.to_string(), r#"{"keep":[1,2],"a":[5]}"#);

        // Untouched branches stay shared with the template
        let keep = |v: &Value| match v.as_object().unwrap().get("keep").unwrap() {
            Value::Array(items) => items.clone(),
            _ => unreachable!(),
        };
        assert!(Arc::ptr_eq(&keep(&doc), &keep(&out)));
    }

    #[test]
    fn test_key_rename_preserves_value() {
        let out = apply(
            r#"{"~S:k":{"nested":"~S:v"},"other":1}"#,
            &Bindings::new().with("k", "renamed").with("v", "x"),
        )
        .unwrap();
        assert_eq!(out.to_string(), r#"{"renamed":{"nested":"x"},"other":1}"#);
    }

    #[test]
    fn test_literal_key() {
        let out = apply(r#"{"~L:~S:raw":true}"#, &Bindings::new()).unwrap();
        assert_eq!(out.to_string(), r#"{"~S:raw":true}"#);
    }

    #[test]
    fn test_null_key_rejected() {
        let err = apply(r#"{"~S:k":1}"#, &Bindings::new()).unwrap_err();
        assert_eq!(err, TemplateError::NullKey { name: "k".into() });
    }

    #[test]
    fn test_renamed_key_colliding_with_sibling() {
        let source = Bindings::single("k", "b");
        let cases = [
            (r#"{"~S:k":1,"b":2}"#, "k"),
            (r#"{"b":2,"~S:k":1}"#, "k"),
            // The literal key is renamed second and collides with the first
            (r#"{"~S:k":1,"~L:b":2}"#, "b"),
        ];
        for (template, name) in cases {
            assert_eq!(
                apply(template, &source).unwrap_err(),
                TemplateError::DuplicateKey {
                    name: name.into(),
                    key: "b".into()
                },
                "{template}"
            );
        }
    }

    #[test]
    fn test_key_renamed_to_itself() {
        let out = apply(r#"{"~S:k":1,"b":2}"#, &Bindings::single("k", "~S:k")).unwrap();
        assert_eq!(out.to_string(), r#"{"~S:k":1,"b":2}"#);
    }

    #[test]
    fn test_bad_number() {
        let err = apply(r#"{"q":"~N:qty"}"#, &Bindings::single("qty", "abc")).unwrap_err();
        assert_eq!(
            err,
            TemplateError::NotANumber {
                name: "qty".into(),
                value: "abc".into()
            }
        );
    }

    #[test]
    fn test_root_replacement() {
        let out = apply(r#""~J:doc""#, &Bindings::single("doc", r#"{"a":[true]}"#)).unwrap();
        assert_eq!(out.to_string(), r#"{"a":[true]}"#);
    }

    #[test]
    fn test_string_with_prefix_becomes_placeholder() {
        let out = apply(r#"["~S:v"]"#, &Bindings::single("v", "~N:later")).unwrap();
        assert_eq!(
            out.as_array().unwrap()[0],
            Value::placeholder(PlaceholderKind::Number, "later")
        );
    }

    #[test]
    fn test_nested_template() {
        let source = Bindings::new()
            .with("inner", r#"{"who":"~S:name"}"#)
            .with("name", "ada");
        let out = apply(r#"{"t":"~T:inner"}"#, &source).unwrap();
        assert_eq!(out.to_string(), r#"{"t":{"who":"ada"}}"#);
    }

    #[test]
    fn test_tape_mismatch_is_reported() {
        let tape = compile(&parse(r#"{"a":"~S:x"}"#).unwrap()).unwrap();
        let other = parse(r#"[1]"#).unwrap();
        let mut engine = Engine::new();
        let err = Executor::new(&mut engine, &Bindings::new(), 0)
            .run(&other, &tape)
            .unwrap_err();
        assert!(matches!(err, TemplateError::Mismatch(_)));
    }
}
