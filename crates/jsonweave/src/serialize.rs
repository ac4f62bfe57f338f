//! Writing values back out as JSON text
//!
//! - **Normal**: compact canonical text. Numbers are written verbatim and
//!   placeholders as `~X:name` strings, so `parse(to_string(v)) == v`.
//! - **Pretty**: normal text with indentation and aligned object values.
//! - **Template**: substitutes placeholders while writing, for a document
//!   that is rendered once rather than compiled and reused.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::config::EngineConfig;
use crate::error::TemplateError;
use crate::template::coerce::coerce;
use crate::template::SubstitutionSource;
use crate::value::{PlaceholderKind, Value};

/// Output style for [`Engine::serialize`](crate::Engine::serialize).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode<'a> {
    /// Compact canonical text
    Normal,
    /// Indented text using the given indent string
    Pretty(&'a str),
}

/// Serialize `value` as compact canonical JSON.
pub fn to_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Serialize `value` with one `indent` per nesting level.
///
/// ```
/// let doc = jsonweave::parse(r#"{"a":1,"bb":2}"#).unwrap();
/// assert_eq!(jsonweave::to_pretty(&doc, "  "), "{\n  \"a\":  1,\n  \"bb\": 2\n}");
/// ```
pub fn to_pretty(value: &Value, indent: &str) -> String {
    PrettyPrinter::new(indent).print(value)
}

/// Canonical text that still tells placeholders from plain strings.
///
/// Placeholders are written unquoted, as `~S"name"`, which no JSON string
/// can produce. The result is not JSON; it identifies a template.
pub(crate) fn to_template_key(value: &Value) -> String {
    let mut out = String::new();
    write_tree(&mut out, value, true);
    out
}

pub(crate) fn write_value(out: &mut String, value: &Value) {
    write_tree(out, value, false);
}

fn write_tree(out: &mut String, value: &Value, tag_placeholders: bool) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => out.push_str(n.as_str()),
        Value::String(s) => write_string(out, s),
        Value::Placeholder(p) if tag_placeholders => {
            out.push_str(p.kind.prefix().trim_end_matches(':'));
            write_string(out, &p.name);
        }
        Value::Placeholder(p) => {
            out.push('"');
            out.push_str(p.kind.prefix());
            write_escaped(out, &p.name);
            out.push('"');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_tree(out, item, tag_placeholders);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_tree(out, item, tag_placeholders);
            }
            out.push('}');
        }
    }
}

/// Write `s` as a quoted JSON string.
pub(crate) fn write_string(out: &mut String, s: &str) {
    out.push('"');
    write_escaped(out, s);
    out.push('"');
}

fn write_escaped(out: &mut String, s: &str) {
    let mut run = 0;
    for (i, c) in s.char_indices() {
        let escaped = match c {
            '"' => "\\\"",
            '\\' => "\\\\",
            '\u{08}' => "\\b",
            '\u{0C}' => "\\f",
            '\n' => "\\n",
            '\r' => "\\r",
            '\t' => "\\t",
            c if (c as u32) < 0x20 => "",
            _ => continue,
        };
        out.push_str(&s[run..i]);
        if escaped.is_empty() {
            let _ = write!(out, "\\u{:04X}", c as u32);
        } else {
            out.push_str(escaped);
        }
        run = i + c.len_utf8();
    }
    out.push_str(&s[run..]);
}

// ═══════════════════════════════════════════════════════════════════
// Pretty printing
// ═══════════════════════════════════════════════════════════════════

/// Indented writer. Object values line up on the longest key, up to a cap.
#[derive(Debug, Clone)]
pub struct PrettyPrinter<'a> {
    indent: &'a str,
    key_cap: usize,
}

impl<'a> PrettyPrinter<'a> {
    /// Create a printer with the default key cap of 20 characters.
    pub fn new(indent: &'a str) -> Self {
        Self {
            indent,
            key_cap: EngineConfig::default().pretty_key_cap,
        }
    }

    /// Keys longer than `key_cap` characters do not widen the alignment.
    pub fn with_key_cap(mut self, key_cap: usize) -> Self {
        self.key_cap = key_cap;
        self
    }

    /// Render `value`.
    pub fn print(&self, value: &Value) -> String {
        let mut out = String::new();
        self.write(&mut out, value, "");
        out
    }

    fn write(&self, out: &mut String, value: &Value, pad: &str) {
        let next_pad = format!("{pad}{}", self.indent);
        match value {
            Value::Object(map) if map.is_empty() => out.push_str("{}"),
            Value::Array(items) if items.is_empty() => out.push_str("[]"),
            Value::Object(map) => {
                let width = map
                    .keys()
                    .map(|k| k.chars().count())
                    .filter(|&len| len <= self.key_cap)
                    .max()
                    .unwrap_or(0);

                out.push_str("{\n");
                for (i, (key, item)) in map.iter().enumerate() {
                    out.push_str(&next_pad);
                    write_string(out, key);
                    out.push_str(": ");
                    let len = key.chars().count();
                    if len < width {
                        out.extend(std::iter::repeat(' ').take(width - len));
                    }
                    self.write(out, item, &next_pad);
                    out.push_str(if i + 1 < map.len() { ",\n" } else { "\n" });
                }
                out.push_str(pad);
                out.push('}');
            }
            Value::Array(items) => {
                out.push_str("[\n");
                for (i, item) in items.iter().enumerate() {
                    out.push_str(&next_pad);
                    self.write(out, item, &next_pad);
                    out.push_str(if i + 1 < items.len() { ",\n" } else { "\n" });
                }
                out.push_str(pad);
                out.push(']');
            }
            scalar => write_value(out, scalar),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Template mode
// ═══════════════════════════════════════════════════════════════════

/// Writes a template document with substitutions applied on the fly.
pub struct TemplateRenderer<'a> {
    source: &'a dyn SubstitutionSource,
    config: &'a EngineConfig,
}

impl<'a> TemplateRenderer<'a> {
    /// Create a renderer resolving placeholders against `source`.
    pub fn new(source: &'a dyn SubstitutionSource, config: &'a EngineConfig) -> Self {
        Self { source, config }
    }

    /// Render `template` to JSON text.
    pub fn render(&self, template: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        self.write(&mut out, template, 0)?;
        Ok(out)
    }

    fn write(&self, out: &mut String, value: &Value, depth: usize) -> Result<(), TemplateError> {
        match value {
            Value::Placeholder(p) => {
                let fetched = match p.kind {
                    PlaceholderKind::Literal => None,
                    _ => self.source.lookup(&p.name),
                };
                let resolved = coerce(p.kind, &p.name, fetched, self.config)?;
                match (p.kind, &resolved) {
                    (PlaceholderKind::Template, Value::Null) => out.push_str("null"),
                    (PlaceholderKind::Template, nested) => {
                        if depth + 1 > self.config.max_template_depth {
                            return Err(TemplateError::RecursionLimit {
                                max: self.config.max_template_depth,
                            });
                        }
                        self.write(out, nested, depth + 1)?;
                    }
                    // Literal text is emitted as-is, never re-read as a placeholder
                    (PlaceholderKind::Literal, _) => write_string(out, &p.name),
                    (_, resolved) => write_value(out, resolved),
                }
            }
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write(out, item, depth)?;
                }
                out.push(']');
            }
            Value::Object(map) => {
                let mut written: HashSet<String> = HashSet::with_capacity(map.len());
                out.push('{');
                for (i, (template_key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let key = self.key(template_key)?;
                    // A substituted key may not meet an earlier key as written
                    // out, nor a later one as it stands in the template
                    if let Some((_, name)) = PlaceholderKind::split(template_key) {
                        let clash = key != **template_key
                            && (written.contains(&key)
                                || map.keys().skip(i + 1).any(|k| **k == *key));
                        if clash {
                            return Err(TemplateError::DuplicateKey {
                                name: name.to_string(),
                                key,
                            });
                        }
                    }
                    write_string(out, &key);
                    out.push(':');
                    self.write(out, item, depth)?;
                    written.insert(key);
                }
                out.push('}');
            }
            scalar => write_value(out, scalar),
        }
        Ok(())
    }

    fn key(&self, key: &str) -> Result<String, TemplateError> {
        match PlaceholderKind::split(key) {
            None => Ok(key.to_string()),
            Some((PlaceholderKind::Literal, name)) => Ok(name.to_string()),
            Some((PlaceholderKind::String, name)) => {
                match self.source.lookup(name).and_then(|v| v.substitution_text()) {
                    Some(text) => Ok(text),
                    None => Err(TemplateError::NullKey {
                        name: name.to_string(),
                    }),
                }
            }
            Some(_) => Err(TemplateError::KeyKind {
                key: key.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use crate::template::Bindings;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escaping() {
        let value = Value::from("q\"b\\s\u{8}\u{c}\n\r\t\u{1}\u{1f}é");
        assert_eq!(
            to_string(&value),
            r#""q\"b\\s\b\f\n\r\t\u0001\u001Fé""#
        );
    }

    #[test]
    fn test_numbers_verbatim() {
        let value = parse("[1.0, 1e5, -0, 12345678901234567890123]").unwrap();
        assert_eq!(to_string(&value), "[1.0,1e5,-0,12345678901234567890123]");
    }

    #[test]
    fn test_placeholders_keep_prefix() {
        let value = Value::array(vec![
            Value::placeholder(PlaceholderKind::Json, "doc"),
            Value::placeholder(PlaceholderKind::String, "a\"b"),
        ]);
        assert_eq!(to_string(&value), r#"["~J:doc","~S:a\"b"]"#);
    }

    #[test]
    fn test_template_key_tags_placeholders() {
        let template = parse(r#"{"~S:k":["~S:x","~L:a\"b"]}"#).unwrap();
        assert_eq!(to_template_key(&template), r#"{"~S:k":[~S"x",~L"a\"b"]}"#);

        let plain = Value::array(vec![Value::string("~S:x")]);
        assert_eq!(to_string(&plain), to_string(&parse(r#"["~S:x"]"#).unwrap()));
        assert_ne!(
            to_template_key(&plain),
            to_template_key(&parse(r#"["~S:x"]"#).unwrap())
        );
    }

    #[test]
    fn test_pretty_aligns_values() {
        let value = parse(r#"{"a":1,"bb":2}"#).unwrap();
        assert_eq!(to_pretty(&value, "    "), "{\n    \"a\":  1,\n    \"bb\": 2\n}");
    }

    #[test]
    fn test_pretty_nested() {
        let value = parse(r#"{"list":[1,{}],"o":{"k":[]}}"#).unwrap();
        let expected = "{\n  \"list\": [\n    1,\n    {}\n  ],\n  \"o\":    {\n    \"k\": []\n  }\n}";
        assert_eq!(to_pretty(&value, "  "), expected);
    }

    #[test]
    fn test_pretty_key_cap() {
        let value = parse(r#"{"a":1,"bbbbb":2}"#).unwrap();
        let printed = PrettyPrinter::new(" ").with_key_cap(3).print(&value);
        assert_eq!(printed, "{\n \"a\": 1,\n \"bbbbb\": 2\n}");
    }

    #[test]
    fn test_pretty_scalars_and_empties() {
        assert_eq!(to_pretty(&Value::from(3), "  "), "3");
        assert_eq!(to_pretty(&Value::object(), "  "), "{}");
        assert_eq!(to_pretty(&Value::array(vec![]), "  "), "[]");
    }

    fn render(template: &str, source: &Bindings) -> Result<String, TemplateError> {
        let config = EngineConfig::default();
        TemplateRenderer::new(source, &config).render(&parse(template).unwrap())
    }

    #[test]
    fn test_render_substitutes_every_kind() {
        let source = Bindings::new()
            .with("s", "bob")
            .with("n", "42")
            .with("b", "no")
            .with("j", "[1,2]")
            .with("t", r#"{"inner":"~S:s"}"#);
        let out = render(
            r#"{"s":"~S:s","n":"~N:n","b":"~B:b","j":"~J:j","t":"~T:t","l":"~L:~S:s","m":"~S:missing"}"#,
            &source,
        )
        .unwrap();
        assert_eq!(
            out,
            r#"{"s":"bob","n":42,"b":false,"j":[1,2],"t":{"inner":"bob"},"l":"~S:s","m":null}"#
        );
    }

    #[test]
    fn test_render_key_substitution() {
        let source = Bindings::single("k", "name");
        assert_eq!(render(r#"{"~S:k":1,"~L:~N:x":2}"#, &source).unwrap(), r#"{"name":1,"~N:x":2}"#);
    }

    #[test]
    fn test_render_rejects_non_string_keys() {
        let err = render(r#"{"~N:k":1}"#, &Bindings::new()).unwrap_err();
        assert_eq!(err.to_string(), "Only strings allowed as object keys");
    }

    #[test]
    fn test_render_rejects_colliding_keys() {
        let source = Bindings::single("k", "b");
        let err = render(r#"{"~S:k":1,"b":2}"#, &source).unwrap_err();
        assert_eq!(
            err,
            TemplateError::DuplicateKey {
                name: "k".into(),
                key: "b".into()
            }
        );
        assert!(render(r#"{"b":2,"~S:k":1}"#, &source).is_err());
        assert_eq!(render(r#"{"~S:k":1,"c":2}"#, &source).unwrap(), r#"{"b":1,"c":2}"#);
    }

    #[test]
    fn test_render_rejects_null_keys() {
        let err = render(r#"{"~S:k":1}"#, &Bindings::new()).unwrap_err();
        assert_eq!(err, TemplateError::NullKey { name: "k".into() });
    }

    #[test]
    fn test_render_number_error() {
        let err = render(r#"["~N:qty"]"#, &Bindings::single("qty", "abc")).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Error substituting value from "qty" into template, not a number: "abc""#
        );
    }

    #[test]
    fn test_render_recursion_limit() {
        let source = Bindings::single("t", r#"["~T:t"]"#);
        let err = render(r#""~T:t""#, &source).unwrap_err();
        assert!(matches!(err, TemplateError::RecursionLimit { .. }));
    }
}
