//! Addressing into documents by a sequence of steps
//!
//! A step is an object key, or against an array an index: a plain integer,
//! `end`, `end-N` or `end+N`. The last step may instead be a modifier that
//! asks about the value reached so far:
//!
//! | Modifier | Applies to | Result |
//! |----------|-----------|--------|
//! | `?length` | array, string, placeholder | element or character count |
//! | `?size` | object | member count |
//! | `?type` | anything | type name |
//! | `?keys` | object | array of keys |
//!
//! A last step that really starts with `?` is written with the `?` doubled.
//!
//! ```
//! use jsonweave::{parse, path};
//!
//! let doc = parse(r#"{"list":[10,20,30]}"#).unwrap();
//! assert_eq!(path::get(&doc, &["list", "end-1"]).unwrap(), 20.into());
//! assert_eq!(path::get(&doc, &["list", "?length"]).unwrap(), 3.into());
//!
//! let doc = path::set(&doc, &["new", "deep"], true.into()).unwrap();
//! assert_eq!(doc.to_string(), r#"{"list":[10,20,30],"new":{"deep":true}}"#);
//! ```
//!
//! Writes are copy-on-write: only the containers along the path are copied,
//! and the document passed to [`set`] or [`unset`] is left as it was.

use std::sync::Arc;

use crate::error::{type_name, PathError};
use crate::value::{Map, Value};

static NULL: Value = Value::Null;

/// Most nulls [`set`] will pad an array with to reach an index past its end.
pub const MAX_ARRAY_PADDING: usize = 1 << 16;

enum Modifier {
    Length,
    Size,
    Type,
    Keys,
}

/// A step is either a key/index or, in last position, a modifier.
enum Step<'p> {
    Descend(&'p str),
    Modifier(Modifier, &'p str),
}

fn classify(step: &str, last: bool) -> Result<Step<'_>, PathError> {
    if !last || !step.starts_with('?') {
        return Ok(Step::Descend(step));
    }
    if step.starts_with("??") {
        return Ok(Step::Descend(&step[1..]));
    }
    let modifier = match step {
        "?length" => Modifier::Length,
        "?size" => Modifier::Size,
        "?type" => Modifier::Type,
        "?keys" => Modifier::Keys,
        _ => {
            return Err(PathError::UnknownModifier {
                modifier: step.to_string(),
            })
        }
    };
    Ok(Step::Modifier(modifier, step))
}

/// Resolve an array step against an array of `len` elements.
///
/// The result may fall outside the array; callers decide what that means.
/// `end±N` saturates instead of overflowing, which keeps it out of range.
fn index(step: &str, len: usize) -> Result<i64, PathError> {
    if let Ok(i) = step.parse::<i64>() {
        return Ok(i);
    }
    let bad = || PathError::BadIndex {
        step: step.to_string(),
    };
    let rest = step.strip_prefix("end").ok_or_else(bad)?;
    let last = i64::try_from(len).unwrap_or(i64::MAX).saturating_sub(1);
    if rest.is_empty() {
        return Ok(last);
    }
    if !rest.starts_with(['+', '-']) {
        return Err(bad());
    }
    let offset: i64 = rest.parse().map_err(|_| bad())?;
    Ok(last.saturating_add(offset))
}

fn apply_modifier(modifier: Modifier, text: &str, value: &Value) -> Result<Value, PathError> {
    let unsupported = || PathError::UnsupportedModifier {
        modifier: text.to_string(),
        type_name: type_name(value),
    };
    match (modifier, value) {
        (Modifier::Length, Value::Array(items)) => Ok(Value::from(items.len())),
        (Modifier::Length, Value::String(s)) => Ok(Value::from(s.chars().count())),
        (Modifier::Length, Value::Placeholder(p)) => Ok(Value::from(p.name.chars().count() + 3)),
        (Modifier::Size, Value::Object(map)) => Ok(Value::from(map.len())),
        (Modifier::Type, value) => Ok(Value::from(type_name(value))),
        (Modifier::Keys, Value::Object(map)) => Ok(map
            .keys()
            .map(|key| Value::String(key.clone()))
            .collect()),
        _ => Err(unsupported()),
    }
}

enum Resolved<'d> {
    Node(&'d Value),
    Computed(Value),
}

fn resolve<'d, S: AsRef<str>>(doc: &'d Value, path: &[S]) -> Result<Resolved<'d>, PathError> {
    let mut node = doc;
    for (i, step) in path.iter().enumerate() {
        let step = match classify(step.as_ref(), i + 1 == path.len())? {
            Step::Descend(step) => step,
            Step::Modifier(modifier, text) => {
                return apply_modifier(modifier, text, node).map(Resolved::Computed)
            }
        };
        node = match node {
            Value::Object(map) => map.get(step).ok_or_else(|| PathError::NotFound {
                step: step.to_string(),
            })?,
            Value::Array(items) => {
                let i = index(step, items.len())?;
                // Out of range reads as null
                usize::try_from(i)
                    .ok()
                    .and_then(|i| items.get(i))
                    .unwrap_or(&NULL)
            }
            scalar => {
                return Err(PathError::AtomicDescent {
                    type_name: type_name(scalar),
                    step: step.to_string(),
                })
            }
        };
    }
    Ok(Resolved::Node(node))
}

// ═══════════════════════════════════════════════════════════════════
// Reads
// ═══════════════════════════════════════════════════════════════════

/// Value at `path`, or the result of a trailing modifier.
///
/// A missing object key is an error; an array index out of range reads
/// as `null`.
pub fn get<S: AsRef<str>>(doc: &Value, path: &[S]) -> Result<Value, PathError> {
    match resolve(doc, path)? {
        Resolved::Node(node) => Ok(node.clone()),
        Resolved::Computed(value) => Ok(value),
    }
}

/// Whether `path` leads to a non-null value. Never fails.
///
/// A trailing modifier counts as existing when it applies to the value.
pub fn exists<S: AsRef<str>>(doc: &Value, path: &[S]) -> bool {
    match resolve(doc, path) {
        Ok(Resolved::Node(node)) => !node.is_null(),
        Ok(Resolved::Computed(_)) => true,
        Err(_) => false,
    }
}

/// Whether the value at `path` is null. A path that cannot be followed
/// counts as null.
pub fn is_null<S: AsRef<str>>(doc: &Value, path: &[S]) -> bool {
    match resolve(doc, path) {
        Ok(Resolved::Node(node)) => node.is_null(),
        Ok(Resolved::Computed(value)) => value.is_null(),
        Err(_) => true,
    }
}

/// [`get`] plus the type name of the result.
pub fn get_typed<S: AsRef<str>>(
    doc: &Value,
    path: &[S],
) -> Result<(Value, &'static str), PathError> {
    let value = get(doc, path)?;
    let name = type_name(&value);
    Ok((value, name))
}

// ═══════════════════════════════════════════════════════════════════
// Writes
// ═══════════════════════════════════════════════════════════════════

/// Copy of `doc` with `value` stored at `path`.
///
/// Missing keys are created. An index past the end pads the array with
/// nulls and a negative index prepends. Once the walk has created a
/// node, every remaining step becomes a nested object key. An empty path
/// replaces the whole document.
pub fn set<S: AsRef<str>>(doc: &Value, path: &[S], value: Value) -> Result<Value, PathError> {
    let mut out = doc.clone();
    set_in_place(&mut out, path, value)?;
    Ok(out)
}

/// [`set`] on a document the caller owns.
///
/// Nodes still shared with other documents are copied on the way down.
pub fn set_in_place<S: AsRef<str>>(
    doc: &mut Value,
    path: &[S],
    value: Value,
) -> Result<(), PathError> {
    let mut target = doc;
    let mut rest = path;

    while let Some((step, tail)) = rest.split_first() {
        let step = step.as_ref();
        rest = tail;
        let (next, created) = match target {
            Value::Object(map) => {
                let map = Arc::make_mut(map);
                let (i, created) = match map.get_index_of(step) {
                    Some(i) => (i, false),
                    None => (map.insert_full(Arc::from(step), Value::Null).0, true),
                };
                (&mut map[i], created)
            }
            Value::Array(items) => {
                let items = Arc::make_mut(items);
                let i = index(step, items.len())?;
                let bad_index = || PathError::BadIndex {
                    step: step.to_string(),
                };
                match usize::try_from(i) {
                    Err(_) => {
                        items.insert(0, Value::Null);
                        (items.first_mut().ok_or_else(bad_index)?, true)
                    }
                    Ok(i) if i >= items.len() => {
                        if i - items.len() > MAX_ARRAY_PADDING {
                            return Err(bad_index());
                        }
                        items.resize(i + 1, Value::Null);
                        (items.last_mut().ok_or_else(bad_index)?, true)
                    }
                    Ok(i) => (&mut items[i], false),
                }
            }
            scalar => {
                return Err(PathError::AtomicDescent {
                    type_name: type_name(scalar),
                    step: step.to_string(),
                })
            }
        };
        target = next;
        if created {
            break;
        }
    }

    let mut value = value;
    for step in rest.iter().rev() {
        let mut map = Map::with_capacity(1);
        map.insert(Arc::from(step.as_ref()), value);
        value = Value::from_map(map);
    }
    *target = value;
    Ok(())
}

/// Copy of `doc` with the element at `path` removed.
///
/// Every step but the last must exist. Removing a missing key or an index
/// out of range changes nothing. An empty path returns `doc` unchanged.
pub fn unset<S: AsRef<str>>(doc: &Value, path: &[S]) -> Result<Value, PathError> {
    let mut out = doc.clone();
    unset_in_place(&mut out, path)?;
    Ok(out)
}

/// [`unset`] on a document the caller owns.
pub fn unset_in_place<S: AsRef<str>>(doc: &mut Value, path: &[S]) -> Result<(), PathError> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };

    let mut target = doc;
    for (depth, step) in parents.iter().enumerate() {
        let step = step.as_ref();
        let bad_path = || PathError::BadPath {
            prefix: join(&path[..=depth]),
        };
        target = match target {
            Value::Object(map) => {
                if !map.contains_key(step) {
                    return Err(bad_path());
                }
                Arc::make_mut(map).get_mut(step).ok_or_else(bad_path)?
            }
            Value::Array(items) => {
                let i = usize::try_from(index(step, items.len())?)
                    .ok()
                    .filter(|&i| i < items.len())
                    .ok_or_else(bad_path)?;
                &mut Arc::make_mut(items)[i]
            }
            scalar => {
                return Err(PathError::AtomicDescent {
                    type_name: type_name(scalar),
                    step: step.to_string(),
                })
            }
        };
    }

    let last = last.as_ref();
    match target {
        Value::Object(map) => {
            if map.contains_key(last) {
                Arc::make_mut(map).shift_remove(last);
            }
        }
        Value::Array(items) => {
            let i = index(last, items.len())?;
            if let Ok(i) = usize::try_from(i) {
                if i < items.len() {
                    Arc::make_mut(items).remove(i);
                }
            }
        }
        scalar => {
            return Err(PathError::AtomicDescent {
                type_name: type_name(scalar),
                step: last.to_string(),
            })
        }
    }
    Ok(())
}

fn join<S: AsRef<str>>(steps: &[S]) -> String {
    steps
        .iter()
        .map(|step| step.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
}
