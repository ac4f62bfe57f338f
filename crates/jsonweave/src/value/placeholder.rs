//! Template placeholders and the `~X:` prefix convention

use std::fmt;
use std::sync::Arc;

/// The six placeholder kinds, one per prefix letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlaceholderKind {
    /// `~S:` substitutes a string
    String,
    /// `~N:` substitutes a number
    Number,
    /// `~B:` substitutes a boolean
    Bool,
    /// `~J:` substitutes any JSON value
    Json,
    /// `~T:` substitutes a nested template
    Template,
    /// `~L:` escapes text that starts with one of the other prefixes
    Literal,
}

impl PlaceholderKind {
    /// All kinds in prefix order.
    pub const ALL: [PlaceholderKind; 6] = [
        PlaceholderKind::String,
        PlaceholderKind::Number,
        PlaceholderKind::Bool,
        PlaceholderKind::Json,
        PlaceholderKind::Template,
        PlaceholderKind::Literal,
    ];

    /// The three-byte textual prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            PlaceholderKind::String => "~S:",
            PlaceholderKind::Number => "~N:",
            PlaceholderKind::Bool => "~B:",
            PlaceholderKind::Json => "~J:",
            PlaceholderKind::Template => "~T:",
            PlaceholderKind::Literal => "~L:",
        }
    }

    /// Look up a kind by its prefix letter.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'S' => Some(PlaceholderKind::String),
            b'N' => Some(PlaceholderKind::Number),
            b'B' => Some(PlaceholderKind::Bool),
            b'J' => Some(PlaceholderKind::Json),
            b'T' => Some(PlaceholderKind::Template),
            b'L' => Some(PlaceholderKind::Literal),
            _ => None,
        }
    }

    /// Whether a placeholder of this kind may appear as an object key.
    pub fn allowed_as_key(self) -> bool {
        matches!(self, PlaceholderKind::String | PlaceholderKind::Literal)
    }

    /// Split `text` into a kind and a name if it carries a known prefix.
    ///
    /// ```
    /// use jsonweave::PlaceholderKind;
    ///
    /// assert_eq!(
    ///     PlaceholderKind::split("~N:qty"),
    ///     Some((PlaceholderKind::Number, "qty"))
    /// );
    /// assert_eq!(PlaceholderKind::split("~X:qty"), None);
    /// ```
    pub fn split(text: &str) -> Option<(PlaceholderKind, &str)> {
        let bytes = text.as_bytes();
        if bytes.len() < 3 || bytes[0] != b'~' || bytes[2] != b':' {
            return None;
        }
        // The first three bytes are ASCII, so 3 is a char boundary.
        PlaceholderKind::from_tag(bytes[1]).map(|kind| (kind, &text[3..]))
    }
}

/// A named substitution point inside a template document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    /// How the substitution is coerced
    pub kind: PlaceholderKind,
    /// Lookup name, without the prefix
    pub name: Arc<str>,
}

impl Placeholder {
    /// Create a placeholder.
    pub fn new(kind: PlaceholderKind, name: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// The placeholder as it appears in JSON text, prefix included.
    pub fn text(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.name)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.name)
    }
}
