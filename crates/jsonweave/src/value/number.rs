//! Lexically preserved JSON numbers

use std::fmt;
use std::sync::Arc;

use crate::error::ValueError;

/// A JSON number kept as the exact text it was written with.
///
/// `1.0`, `1e0` and `1` are all distinct numbers here. Nothing is ever
/// reformatted, so large integers and long decimals survive a round trip.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Number(Arc<str>);

impl Number {
    /// Validate `text` against the JSON number grammar.
    pub fn new(text: &str) -> Result<Self, ValueError> {
        if is_json_number(text.as_bytes()) {
            Ok(Number(Arc::from(text)))
        } else {
            Err(ValueError::InvalidNumber(text.to_string()))
        }
    }

    /// Wrap text the caller has already validated.
    pub(crate) fn from_validated(text: Arc<str>) -> Self {
        Number(text)
    }

    /// The original lexical text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret as an `i64`, if the text is an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// Interpret as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        self.0.parse().ok()
    }
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! number_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(n: $t) -> Self {
                    Number(Arc::from(n.to_string()))
                }
            }
        )*
    };
}

number_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Length of the longest prefix of `bytes` that could belong to a number
/// token. The parser validates the run with [`is_json_number`] afterwards.
pub(crate) fn number_run(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|b| matches!(b, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E'))
        .count()
}

/// `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`
pub(crate) fn is_json_number(bytes: &[u8]) -> bool {
    let mut i = 0;
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    if bytes.first() == Some(&b'-') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i += digits(i),
        _ => return false,
    }
    if bytes.get(i) == Some(&b'.') {
        let n = digits(i + 1);
        if n == 0 {
            return false;
        }
        i += 1 + n;
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let n = digits(i);
        if n == 0 {
            return false;
        }
        i += n;
    }
    i == bytes.len()
}
