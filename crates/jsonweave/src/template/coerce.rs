//! Converting looked-up values into the kind a placeholder asks for

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::TemplateError;
use crate::parser::Parser;
use crate::value::impls::parse_bool_word;
use crate::value::number::is_json_number;
use crate::value::{Number, PlaceholderKind, Value};

/// Coerce a fetched value for a placeholder of `kind` named `name`.
///
/// Absent and `null` fetches become `null` for every kind except Literal,
/// which never looks anything up and always yields its own name.
/// Template substitutions come back parsed but not yet applied.
pub(crate) fn coerce(
    kind: PlaceholderKind,
    name: &str,
    fetched: Option<Value>,
    config: &EngineConfig,
) -> Result<Value, TemplateError> {
    if kind == PlaceholderKind::Literal {
        return Ok(Value::String(Arc::from(name)));
    }
    let value = match fetched {
        None | Some(Value::Null) => return Ok(Value::Null),
        Some(value) => value,
    };
    match kind {
        PlaceholderKind::String => Ok(string(value)),
        PlaceholderKind::Number => number(name, value),
        PlaceholderKind::Bool => boolean(name, value),
        PlaceholderKind::Json | PlaceholderKind::Template => json(name, value, config),
        PlaceholderKind::Literal => Ok(Value::String(Arc::from(name))),
    }
}

/// Strings keep placeholder meaning if their text carries a prefix.
fn string(value: Value) -> Value {
    match value {
        Value::String(s) => Value::string_or_placeholder(&s),
        Value::Placeholder(p) => Value::Placeholder(p),
        other => match other.substitution_text() {
            Some(text) => Value::String(Arc::from(text)),
            None => Value::Null,
        },
    }
}

fn number(name: &str, value: Value) -> Result<Value, TemplateError> {
    match value {
        Value::Number(n) => Ok(Value::Number(n)),
        Value::String(s) if is_json_number(s.trim().as_bytes()) => {
            Ok(Value::Number(Number::from_validated(Arc::from(s.trim()))))
        }
        other => Err(TemplateError::NotANumber {
            name: name.to_string(),
            value: other.substitution_text().unwrap_or_default(),
        }),
    }
}

fn boolean(name: &str, value: Value) -> Result<Value, TemplateError> {
    let rejected = |value: &Value| TemplateError::NotABoolean {
        name: name.to_string(),
        value: value.substitution_text().unwrap_or_default(),
    };
    match &value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Number(n) => n
            .as_f64()
            .map(|f| Value::Bool(f != 0.0))
            .ok_or_else(|| rejected(&value)),
        Value::String(s) => parse_bool_word(s)
            .map(Value::Bool)
            .ok_or_else(|| rejected(&value)),
        _ => Err(rejected(&value)),
    }
}

/// String substitutions hold JSON text; anything else is already a value.
fn json(name: &str, value: Value, config: &EngineConfig) -> Result<Value, TemplateError> {
    match value {
        Value::String(text) => {
            Parser::new(config)
                .parse(text.as_bytes())
                .map_err(|source| TemplateError::InvalidJson {
                    name: name.to_string(),
                    source,
                })
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(kind: PlaceholderKind, fetched: Option<Value>) -> Result<Value, TemplateError> {
        coerce(kind, "v", fetched, &EngineConfig::default())
    }

    #[test]
    fn test_absent_is_null() {
        for kind in [
            PlaceholderKind::String,
            PlaceholderKind::Number,
            PlaceholderKind::Bool,
            PlaceholderKind::Json,
            PlaceholderKind::Template,
        ] {
            assert_eq!(run(kind, None), Ok(Value::Null));
        }
    }

    #[test]
    fn test_literal_ignores_fetch() {
        assert_eq!(
            run(PlaceholderKind::Literal, Some(Value::from(1))),
            Ok(Value::from("v"))
        );
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(run(PlaceholderKind::String, Some(Value::from(12))), Ok(Value::from("12")));
        assert_eq!(
            run(PlaceholderKind::String, Some(Value::from("~N:x"))),
            Ok(Value::placeholder(PlaceholderKind::Number, "x"))
        );
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(
            run(PlaceholderKind::Number, Some(Value::from(" 1.50 "))),
            Ok(Value::number("1.50").unwrap())
        );
        assert_eq!(
            run(PlaceholderKind::Number, Some(Value::from("abc"))),
            Err(TemplateError::NotANumber {
                name: "v".into(),
                value: "abc".into()
            })
        );
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(run(PlaceholderKind::Bool, Some(Value::from("yes"))), Ok(Value::Bool(true)));
        assert_eq!(run(PlaceholderKind::Bool, Some(Value::from(0))), Ok(Value::Bool(false)));
        assert!(run(PlaceholderKind::Bool, Some(Value::array(vec![]))).is_err());
    }

    #[test]
    fn test_json_coercion_parses_text() {
        let value = run(PlaceholderKind::Json, Some(Value::from("[1,2]"))).unwrap();
        assert_eq!(value.to_string(), "[1,2]");
        let err = run(PlaceholderKind::Json, Some(Value::from("[1,"))).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidJson { .. }));
    }

    #[test]
    fn test_json_coercion_keeps_values() {
        let doc = Value::array(vec![Value::Bool(true)]);
        assert_eq!(run(PlaceholderKind::Json, Some(doc.clone())), Ok(doc));
    }
}
