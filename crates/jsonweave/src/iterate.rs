//! Driving a caller's loop body over arrays and objects
//!
//! Several lanes can be walked in lockstep. Each lane hands `width`
//! values to every iteration: array lanes take the next `width` elements,
//! object lanes (always width 2) take the next key and value. The loop
//! runs until the longest lane is used up; shorter lanes pad with `null`.
//!
//! ```
//! use jsonweave::iterate::{map_collect, Lane};
//! use jsonweave::{parse, IterateError, Value};
//!
//! let names = parse(r#"["a","b","c"]"#).unwrap();
//! let ages = parse("[1,2]").unwrap();
//! let rows: Vec<String> = map_collect::<_, IterateError, _>(
//!     &[Lane::single(&names), Lane::single(&ages)],
//!     |vars| Ok(Some(format!("{}={}", vars[0], vars[1]))),
//! )
//! .unwrap();
//! assert_eq!(rows, ["\"a\"=1", "\"b\"=2", "\"c\"=null"]);
//! ```

use std::sync::Arc;

use crate::error::{type_name, IterateError};
use crate::value::Value;

/// What the loop does after a body returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Go on to the next iteration
    Continue,
    /// Stop iterating
    Break,
}

/// One sequence to iterate and how many values it binds per iteration.
#[derive(Debug, Clone, Copy)]
pub struct Lane<'v> {
    value: &'v Value,
    width: usize,
}

impl<'v> Lane<'v> {
    /// Bind `width` values per iteration from `value`.
    pub fn new(value: &'v Value, width: usize) -> Self {
        Self { value, width }
    }

    /// One element per iteration.
    pub fn single(value: &'v Value) -> Self {
        Self::new(value, 1)
    }

    /// Key and value per iteration, for objects.
    pub fn pairs(value: &'v Value) -> Self {
        Self::new(value, 2)
    }
}

enum Cursor<'v> {
    Items {
        items: &'v [Value],
        width: usize,
        next: usize,
    },
    Members(indexmap::map::Iter<'v, Arc<str>, Value>),
}

impl<'v> Cursor<'v> {
    fn open(lane: &Lane<'v>) -> Result<(Self, usize), IterateError> {
        if lane.width == 0 {
            return Err(IterateError::EmptyLane);
        }
        match lane.value {
            Value::Array(items) => {
                let loops = items.len().div_ceil(lane.width);
                let cursor = Cursor::Items {
                    items,
                    width: lane.width,
                    next: 0,
                };
                Ok((cursor, loops))
            }
            Value::Object(map) => {
                if lane.width != 2 {
                    return Err(IterateError::ObjectWidth);
                }
                Ok((Cursor::Members(map.iter()), map.len()))
            }
            Value::Null => {
                let cursor = Cursor::Items {
                    items: &[],
                    width: lane.width,
                    next: 0,
                };
                Ok((cursor, 0))
            }
            scalar => Err(IterateError::NotIterable(type_name(scalar))),
        }
    }

    fn bind(&mut self, vars: &mut Vec<Value>) {
        match self {
            Cursor::Items { items, width, next } => {
                for _ in 0..*width {
                    vars.push(items.get(*next).cloned().unwrap_or_default());
                    *next += 1;
                }
            }
            Cursor::Members(members) => match members.next() {
                Some((key, value)) => {
                    vars.push(Value::String(key.clone()));
                    vars.push(value.clone());
                }
                None => vars.extend([Value::Null, Value::Null]),
            },
        }
    }
}

/// Open every lane and run `step` once per iteration with the bound values.
fn drive<E, F>(lanes: &[Lane<'_>], mut step: F) -> Result<(), E>
where
    E: From<IterateError>,
    F: FnMut(&[Value]) -> Result<Flow, E>,
{
    let mut cursors = Vec::with_capacity(lanes.len());
    let mut loops = 0;
    for lane in lanes {
        let (cursor, n) = Cursor::open(lane)?;
        loops = loops.max(n);
        cursors.push(cursor);
    }

    let width = lanes.iter().map(|lane| lane.width).sum();
    let mut vars = Vec::with_capacity(width);
    for _ in 0..loops {
        vars.clear();
        for cursor in &mut cursors {
            cursor.bind(&mut vars);
        }
        if step(&vars)? == Flow::Break {
            break;
        }
    }
    Ok(())
}

/// Run `body` over the lanes until they are exhausted or it breaks.
///
/// Errors from `body` stop the loop and are returned as-is.
pub fn for_each<E, F>(lanes: &[Lane<'_>], body: F) -> Result<(), E>
where
    E: From<IterateError>,
    F: FnMut(&[Value]) -> Result<Flow, E>,
{
    drive(lanes, body)
}

/// Like [`for_each`], collecting what `body` returns.
///
/// `Ok(None)` skips an iteration without contributing a result.
pub fn map_collect<T, E, F>(lanes: &[Lane<'_>], mut body: F) -> Result<Vec<T>, E>
where
    E: From<IterateError>,
    F: FnMut(&[Value]) -> Result<Option<T>, E>,
{
    let mut out = Vec::new();
    drive::<E, _>(lanes, |vars| {
        if let Some(item) = body(vars)? {
            out.push(item);
        }
        Ok(Flow::Continue)
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn collect(lanes: &[Lane<'_>]) -> Result<Vec<String>, IterateError> {
        map_collect(lanes, |vars| {
            Ok(Some(
                vars.iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
            ))
        })
    }

    #[test]
    fn test_array_in_groups() {
        let doc = parse("[1,2,3,4,5]").unwrap();
        assert_eq!(
            collect(&[Lane::new(&doc, 2)]).unwrap(),
            ["1 2", "3 4", "5 null"]
        );
    }

    #[test]
    fn test_object_pairs() {
        let doc = parse(r#"{"a":1,"b":[true]}"#).unwrap();
        assert_eq!(
            collect(&[Lane::pairs(&doc)]).unwrap(),
            [r#""a" 1"#, r#""b" [true]"#]
        );
    }

    #[test]
    fn test_lockstep_pads_shorter_lanes() {
        let list = parse("[1,2,3]").unwrap();
        let obj = parse(r#"{"k":"v"}"#).unwrap();
        assert_eq!(
            collect(&[Lane::single(&list), Lane::pairs(&obj)]).unwrap(),
            [r#"1 "k" "v""#, "2 null null", "3 null null"]
        );
    }

    #[test]
    fn test_null_lane_is_empty() {
        assert!(collect(&[Lane::single(&Value::Null)]).unwrap().is_empty());
    }

    #[test]
    fn test_break_stops_early() {
        let doc = parse("[1,2,3,4]").unwrap();
        let mut seen = Vec::new();
        for_each::<IterateError, _>(&[Lane::single(&doc)], |vars| {
            seen.push(vars[0].clone());
            Ok(if seen.len() == 2 {
                Flow::Break
            } else {
                Flow::Continue
            })
        })
        .unwrap();
        assert_eq!(seen, [Value::from(1), Value::from(2)]);
    }

    #[test]
    fn test_map_collect_skips_none() {
        let doc = parse("[1,2,3,4]").unwrap();
        let odd = map_collect::<_, IterateError, _>(&[Lane::single(&doc)], |vars| {
            let n = vars[0].as_number().and_then(|n| n.as_i64()).unwrap_or(0);
            Ok((n % 2 == 1).then_some(n))
        })
        .unwrap();
        assert_eq!(odd, [1, 3]);
    }

    #[test]
    fn test_lane_errors() {
        let obj = parse(r#"{"a":1}"#).unwrap();
        let list = parse("[1]").unwrap();
        assert_eq!(collect(&[Lane::single(&obj)]), Err(IterateError::ObjectWidth));
        assert_eq!(collect(&[Lane::new(&list, 0)]), Err(IterateError::EmptyLane));
        assert_eq!(
            collect(&[Lane::single(&Value::from(3))]),
            Err(IterateError::NotIterable("number"))
        );
    }

    #[test]
    fn test_body_errors_propagate() {
        let doc = parse("[1,2]").unwrap();
        let mut calls = 0;
        let err = for_each::<crate::JsonError, _>(&[Lane::single(&doc)], |_| {
            calls += 1;
            Err(crate::error::PathError::NotFound { step: "x".into() }.into())
        })
        .unwrap_err();
        assert_eq!(calls, 1);
        assert!(matches!(err, crate::JsonError::Path(_)));
    }

    #[test]
    fn test_map_collect_with_caller_error_type() {
        let doc = parse(r#"{"a":[1],"b":2}"#).unwrap();
        let lengths = map_collect::<_, crate::JsonError, _>(&[Lane::pairs(&doc)], |vars| {
            let len = crate::path::get(&vars[1], &["?length"])?;
            Ok(Some(len))
        });
        assert!(matches!(lengths, Err(crate::JsonError::Path(_))));

        let err = map_collect::<Value, crate::JsonError, _>(&[Lane::single(&doc)], |_| Ok(None))
            .unwrap_err();
        assert!(matches!(err, crate::JsonError::Iterate(IterateError::ObjectWidth)));
    }
}
