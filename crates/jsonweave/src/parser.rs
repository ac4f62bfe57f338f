//! JSON text to [`Value`] trees
//!
//! The parser is a single left-to-right scan. Containers under construction
//! live on an explicit frame stack instead of the call stack, so nesting is
//! limited by [`EngineConfig::max_depth`] and deep input reports
//! [`ParseErrorKind::TooDeep`] rather than overflowing.
//!
//! Besides plain JSON it accepts `//` and `/* */` comments between tokens,
//! and reads strings carrying a `~X:` prefix as [`Placeholder`] values.
//! Object keys always stay plain strings, prefix included.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::{ParseError, ParseErrorKind};
use crate::intern::Interner;
use crate::value::number::{is_json_number, number_run};
use crate::value::{Map, Number, Placeholder, PlaceholderKind, Value};

/// Parse JSON text with default limits and no interning.
pub fn parse(text: &str) -> Result<Value, ParseError> {
    Parser::default().parse(text.as_bytes())
}

/// Parse raw bytes with default limits and no interning.
pub fn parse_bytes(input: &[u8]) -> Result<Value, ParseError> {
    Parser::default().parse(input)
}

/// Configurable entry point.
///
/// ```
/// use jsonweave::{EngineConfig, Parser};
///
/// let mut parser = Parser::new(&EngineConfig::with_max_depth(2));
/// assert!(parser.parse(b"[[1]]").is_ok());
/// assert!(parser.parse(b"[[[1]]]").is_err());
/// ```
pub struct Parser<'c> {
    max_depth: usize,
    interner: Option<&'c mut dyn Interner>,
}

impl Default for Parser<'_> {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl<'c> Parser<'c> {
    /// Create a parser using the limits from `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            interner: None,
        }
    }

    /// Route object keys and placeholder names through `interner`.
    pub fn with_interner(mut self, interner: &'c mut dyn Interner) -> Self {
        self.interner = Some(interner);
        self
    }

    /// Parse one complete document.
    pub fn parse(&mut self, input: &[u8]) -> Result<Value, ParseError> {
        debug!(bytes = input.len(), "parsing");
        let mut scanner = Scanner {
            input,
            pos: 0,
            max_depth: self.max_depth,
            interner: self.interner.as_deref_mut(),
        };
        let value = scanner.document()?;
        trace!(kind = value.type_name(), "parsed");
        Ok(value)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Scanner
// ═══════════════════════════════════════════════════════════════════

enum Container {
    Object(Map),
    Array(Vec<Value>),
}

struct Frame {
    container: Container,
    key: Option<Arc<str>>,
    start: usize,
}

impl Frame {
    fn unterminated(&self) -> ParseErrorKind {
        match self.container {
            Container::Object(_) => ParseErrorKind::UnterminatedObject,
            Container::Array(_) => ParseErrorKind::UnterminatedArray,
        }
    }

    fn into_value(self) -> Value {
        match self.container {
            Container::Object(map) => Value::from_map(map),
            Container::Array(items) => Value::array(items),
        }
    }
}

struct Scanner<'a, 'c, 'i> {
    input: &'a [u8],
    pos: usize,
    max_depth: usize,
    interner: Option<&'c mut (dyn Interner + 'i)>,
}

impl<'a, 'c, 'i> Scanner<'a, 'c, 'i> {
    fn document(&mut self) -> Result<Value, ParseError> {
        let mut stack: Vec<Frame> = Vec::with_capacity(self.max_depth.min(16));

        'value: loop {
            self.skip_whitespace()?;

            // Either a complete scalar or empty container, or a freshly
            // pushed frame that now wants its first element.
            let mut value = match self.peek() {
                None => {
                    return Err(match stack.last() {
                        Some(frame) => self.error_at(frame.unterminated(), frame.start),
                        None => self.error(ParseErrorKind::NoValue),
                    });
                }
                Some(b'{') => {
                    self.push(&mut stack, Container::Object(Map::new()))?;
                    self.skip_whitespace()?;
                    if self.peek() == Some(b'}') {
                        self.pos += 1;
                        pop(&mut stack)
                    } else {
                        let start = stack.last().map_or(0, |f| f.start);
                        let key = self.object_key(start)?;
                        if let Some(frame) = stack.last_mut() {
                            frame.key = Some(key);
                        }
                        continue 'value;
                    }
                }
                Some(b'[') => {
                    self.push(&mut stack, Container::Array(Vec::new()))?;
                    self.skip_whitespace()?;
                    if self.peek() == Some(b']') {
                        self.pos += 1;
                        pop(&mut stack)
                    } else {
                        continue 'value;
                    }
                }
                Some(b'"') => self.string_value()?,
                Some(b't') => self.literal(b"true", Value::Bool(true))?,
                Some(b'f') => self.literal(b"false", Value::Bool(false))?,
                Some(b'n') => self.literal(b"null", Value::Null)?,
                Some(b'-' | b'0'..=b'9') => self.number()?,
                Some(_) => return Err(self.error(ParseErrorKind::IllegalCharacter)),
            };

            // Attach the finished value and consume separators, closing as
            // many containers as the input closes.
            loop {
                let Some(frame) = stack.last_mut() else {
                    self.skip_whitespace()?;
                    if self.pos < self.input.len() {
                        return Err(self.error(ParseErrorKind::TrailingGarbage));
                    }
                    return Ok(value);
                };

                let is_object = match &mut frame.container {
                    Container::Object(map) => {
                        if let Some(key) = frame.key.take() {
                            map.insert(key, value);
                        }
                        true
                    }
                    Container::Array(items) => {
                        items.push(value);
                        false
                    }
                };
                let start = frame.start;
                let unterminated = frame.unterminated();

                self.skip_whitespace()?;
                match (is_object, self.peek()) {
                    (_, None) => return Err(self.error_at(unterminated, start)),
                    (true, Some(b',')) => {
                        self.pos += 1;
                        self.skip_whitespace()?;
                        let key = self.object_key(start)?;
                        if let Some(frame) = stack.last_mut() {
                            frame.key = Some(key);
                        }
                        continue 'value;
                    }
                    (false, Some(b',')) => {
                        self.pos += 1;
                        continue 'value;
                    }
                    (true, Some(b'}')) | (false, Some(b']')) => {
                        self.pos += 1;
                        value = pop(&mut stack);
                    }
                    (true, Some(_)) => return Err(self.error(ParseErrorKind::ExpectedObjectClose)),
                    (false, Some(_)) => return Err(self.error(ParseErrorKind::ExpectedArrayClose)),
                }
            }
        }
    }

    fn push(&mut self, stack: &mut Vec<Frame>, container: Container) -> Result<(), ParseError> {
        if stack.len() >= self.max_depth {
            return Err(self.error(ParseErrorKind::TooDeep {
                max: self.max_depth,
            }));
        }
        stack.push(Frame {
            container,
            key: None,
            start: self.pos,
        });
        self.pos += 1;
        Ok(())
    }

    /// Read `"key" :` with whitespace already skipped before the key.
    fn object_key(&mut self, object_start: usize) -> Result<Arc<str>, ParseError> {
        match self.peek() {
            None => {
                return Err(self.error_at(ParseErrorKind::UnterminatedObject, object_start));
            }
            Some(b'"') => {}
            Some(_) => return Err(self.error(ParseErrorKind::KeyNotString)),
        }
        let text = self.string()?;
        let key = self.intern(&text);

        self.skip_whitespace()?;
        match self.peek() {
            Some(b':') => {
                self.pos += 1;
                Ok(key)
            }
            None => Err(self.error_at(ParseErrorKind::UnterminatedObject, object_start)),
            Some(_) => Err(self.error(ParseErrorKind::ExpectedColon)),
        }
    }

    fn string_value(&mut self) -> Result<Value, ParseError> {
        let text = self.string()?;
        Ok(match PlaceholderKind::split(&text) {
            Some((kind, name)) => {
                let name = self.intern(name);
                Value::Placeholder(Placeholder { kind, name })
            }
            None => Value::String(Arc::from(text.as_ref())),
        })
    }

    /// Read a quoted string starting at the opening quote.
    fn string(&mut self) -> Result<Cow<'a, str>, ParseError> {
        let open = self.pos;
        self.pos += 1;
        let mut owned: Option<String> = None;
        let mut run = self.pos;

        loop {
            let Some(&b) = self.input.get(self.pos) else {
                return Err(self.error_at(ParseErrorKind::UnterminatedString, open));
            };
            match b {
                b'"' => {
                    let tail = self.utf8(run, self.pos)?;
                    self.pos += 1;
                    return Ok(match owned {
                        None => Cow::Borrowed(tail),
                        Some(mut s) => {
                            s.push_str(tail);
                            Cow::Owned(s)
                        }
                    });
                }
                b'\\' => {
                    let chunk = self.utf8(run, self.pos)?;
                    let c = self.escape()?;
                    let s = owned.get_or_insert_with(String::new);
                    s.push_str(chunk);
                    s.push(c);
                    run = self.pos;
                }
                0x00..=0x1F => return Err(self.error(ParseErrorKind::ControlCharacter)),
                _ => self.pos += 1,
            }
        }
    }

    /// Decode one escape; `pos` is on the backslash.
    fn escape(&mut self) -> Result<char, ParseError> {
        let backslash = self.pos;
        self.pos += 1;
        let Some(&b) = self.input.get(self.pos) else {
            return Err(self.error_at(ParseErrorKind::InvalidEscape, backslash));
        };
        self.pos += 1;
        Ok(match b {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{08}',
            b'f' => '\u{0C}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => return self.unicode_escape(backslash),
            _ => return Err(self.error_at(ParseErrorKind::InvalidEscape, backslash)),
        })
    }

    fn unicode_escape(&mut self, backslash: usize) -> Result<char, ParseError> {
        let invalid = |s: &Self| s.error_at(ParseErrorKind::InvalidUnicodeEscape, backslash);
        let high = self.hex4().ok_or_else(|| invalid(self))?;

        let code = match high {
            0xD800..=0xDBFF => {
                if self.input.get(self.pos..self.pos + 2) != Some(b"\\u".as_slice()) {
                    return Err(invalid(self));
                }
                self.pos += 2;
                let low = self.hex4().ok_or_else(|| invalid(self))?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(invalid(self));
                }
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(invalid(self)),
            code => code,
        };
        char::from_u32(code).ok_or_else(|| invalid(self))
    }

    fn hex4(&mut self) -> Option<u32> {
        let digits = self.input.get(self.pos..self.pos + 4)?;
        let mut value = 0u32;
        for &d in digits {
            value = (value << 4) | (d as char).to_digit(16)?;
        }
        self.pos += 4;
        Some(value)
    }

    fn number(&mut self) -> Result<Value, ParseError> {
        let input: &'a [u8] = self.input;
        let start = self.pos;
        let len = number_run(&input[start..]);
        let bytes = &input[start..start + len];
        if !is_json_number(bytes) {
            return Err(self.error(ParseErrorKind::InvalidNumber));
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|_| self.error(ParseErrorKind::InvalidNumber))?;
        self.pos += len;
        Ok(Value::Number(Number::from_validated(Arc::from(text))))
    }

    fn literal(&mut self, word: &[u8], value: Value) -> Result<Value, ParseError> {
        if self.input[self.pos..].starts_with(word) {
            self.pos += word.len();
            Ok(value)
        } else {
            Err(self.error(ParseErrorKind::IllegalCharacter))
        }
    }

    fn skip_whitespace(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.pos += 1,
                Some(b'/') => match self.input.get(self.pos + 1) {
                    Some(b'/') => {
                        self.pos += 2;
                        while let Some(b) = self.peek() {
                            self.pos += 1;
                            if b == b'\n' {
                                break;
                            }
                        }
                    }
                    Some(b'*') => {
                        let open = self.pos;
                        let body = &self.input[self.pos + 2..];
                        match body.windows(2).position(|w| w == b"*/") {
                            Some(end) => self.pos += 2 + end + 2,
                            None => {
                                return Err(
                                    self.error_at(ParseErrorKind::UnterminatedComment, open)
                                );
                            }
                        }
                    }
                    _ => return Err(self.error(ParseErrorKind::IllegalCharacter)),
                },
                _ => return Ok(()),
            }
        }
    }

    fn intern(&mut self, s: &str) -> Arc<str> {
        match self.interner.as_deref_mut() {
            Some(interner) => interner.intern(s),
            None => Arc::from(s),
        }
    }

    fn utf8(&self, from: usize, to: usize) -> Result<&'a str, ParseError> {
        let input: &'a [u8] = self.input;
        std::str::from_utf8(&input[from..to])
            .map_err(|e| self.error_at(ParseErrorKind::InvalidUtf8, from + e.valid_up_to()))
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(kind, self.pos)
    }

    /// Translate a byte offset to a character offset.
    fn error_at(&self, kind: ParseErrorKind, byte: usize) -> ParseError {
        let end = byte.min(self.input.len());
        let continuation = self.input[..end]
            .iter()
            .filter(|b| (**b & 0xC0) == 0x80)
            .count();
        ParseError::new(kind, end - continuation)
    }
}

fn pop(stack: &mut Vec<Frame>) -> Value {
    stack.pop().map_or(Value::Null, Frame::into_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::InternCache;

    fn kind_of(text: &str) -> ParseErrorKind {
        parse(text).unwrap_err().kind
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse("null").unwrap(), Value::Null);
        assert_eq!(parse(" true ").unwrap(), Value::Bool(true));
        assert_eq!(parse("-1.50e3").unwrap(), Value::number("-1.50e3").unwrap());
        assert_eq!(parse("\"hi\"").unwrap(), Value::from("hi"));
    }

    #[test]
    fn test_nested_containers() {
        let value = parse(r#"{"a": [1, {"b": null}], "c": {}}"#).unwrap();
        let a = value.as_object().unwrap().get("a").unwrap();
        assert_eq!(a.as_array().unwrap().len(), 2);
        assert_eq!(value.as_object().unwrap().get("c"), Some(&Value::object()));
    }

    #[test]
    fn test_key_order_preserved() {
        let value = parse(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_ref()).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        let value = parse(r#"{"a":1,"b":2,"a":3}"#).unwrap();
        assert_eq!(value.to_string(), r#"{"a":3,"b":2}"#);
    }

    #[test]
    fn test_escapes() {
        let value = parse(r#""a\"b\\c\/d\né😀""#).unwrap();
        assert_eq!(value.as_str(), Some("a\"b\\c/d\né😀"));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            parse(r#""~N:qty""#).unwrap(),
            Value::placeholder(PlaceholderKind::Number, "qty")
        );
        assert_eq!(parse(r#""~Z:qty""#).unwrap(), Value::from("~Z:qty"));
    }

    #[test]
    fn test_placeholder_keys_stay_strings() {
        let value = parse(r#"{"~S:k": 1}"#).unwrap();
        assert!(value.as_object().unwrap().contains_key("~S:k"));
    }

    #[test]
    fn test_comments() {
        let value = parse("// lead\n[1, /* two */ 2] // tail").unwrap();
        assert_eq!(value.to_string(), "[1,2]");
        assert_eq!(kind_of("[1 /* open"), ParseErrorKind::UnterminatedComment);
        assert_eq!(kind_of("[1 / 2]"), ParseErrorKind::IllegalCharacter);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(kind_of(""), ParseErrorKind::NoValue);
        assert_eq!(kind_of("   "), ParseErrorKind::NoValue);
        assert_eq!(kind_of("{1:2}"), ParseErrorKind::KeyNotString);
        assert_eq!(kind_of(r#"{"a" 1}"#), ParseErrorKind::ExpectedColon);
        assert_eq!(kind_of(r#"{"a":1 "b":2}"#), ParseErrorKind::ExpectedObjectClose);
        assert_eq!(kind_of("[1 2]"), ParseErrorKind::ExpectedArrayClose);
        assert_eq!(kind_of("1 2"), ParseErrorKind::TrailingGarbage);
        assert_eq!(kind_of(r#"{"a":1"#), ParseErrorKind::UnterminatedObject);
        assert_eq!(kind_of("[1,"), ParseErrorKind::UnterminatedArray);
        assert_eq!(kind_of("\"abc"), ParseErrorKind::UnterminatedString);
        assert_eq!(kind_of("@"), ParseErrorKind::IllegalCharacter);
        assert_eq!(kind_of("[1,]"), ParseErrorKind::IllegalCharacter);
        assert_eq!(kind_of("tru"), ParseErrorKind::IllegalCharacter);
        assert_eq!(kind_of("01"), ParseErrorKind::InvalidNumber);
        assert_eq!(kind_of(r#""\q""#), ParseErrorKind::InvalidEscape);
        assert_eq!(kind_of(r#""\ud800x""#), ParseErrorKind::InvalidUnicodeEscape);
        assert_eq!(kind_of("\"a\u{1}\""), ParseErrorKind::ControlCharacter);
    }

    #[test]
    fn test_unterminated_reports_container_start() {
        let err = parse(r#"[1, {"a": 2"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedObject);
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn test_offsets_count_characters() {
        // "é" is two bytes but one character.
        let err = parse(r#"["é" x]"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ExpectedArrayClose);
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn test_invalid_utf8() {
        let err = parse_bytes(b"\"a\xff\"").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidUtf8);
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_depth_limit() {
        let config = EngineConfig::with_max_depth(3);
        let mut parser = Parser::new(&config);
        assert!(parser.parse(b"[[[]]]").is_ok());
        let err = parser.parse(b"[[[[]]]]").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeep { max: 3 });
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn test_keys_are_interned() {
        let mut cache = InternCache::new(64, 16);
        let value = Parser::default()
            .with_interner(&mut cache)
            .parse(br#"[{"id":1},{"id":2}]"#)
            .unwrap();
        let items = value.as_array().unwrap();
        let first = items[0].as_object().unwrap().keys().next().unwrap().clone();
        let second = items[1].as_object().unwrap().keys().next().unwrap().clone();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits("id"), Some(1));
    }
}
