//! Error types for jsonweave operations

use thiserror::Error;

use crate::value::Value;

/// What went wrong while scanning a JSON document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A byte that cannot start or continue any token
    #[error("Illegal character")]
    IllegalCharacter,

    /// Something other than a string in object key position
    #[error("Object key is not a string")]
    KeyNotString,

    /// Missing `:` between a key and its value
    #[error("Expecting : after object key")]
    ExpectedColon,

    /// An object member was not followed by `}` or `,`
    #[error("Expecting }} or ,")]
    ExpectedObjectClose,

    /// An array element was not followed by `]` or `,`
    #[error("Expecting ] or ,")]
    ExpectedArrayClose,

    /// Non-whitespace after the root value
    #[error("Trailing garbage after value")]
    TrailingGarbage,

    /// Input ended inside an object
    #[error("Unterminated object")]
    UnterminatedObject,

    /// Input ended inside an array
    #[error("Unterminated array")]
    UnterminatedArray,

    /// Input ended inside a string
    #[error("Unterminated string")]
    UnterminatedString,

    /// Input ended inside a `/* */` comment
    #[error("Unterminated comment")]
    UnterminatedComment,

    /// Empty or whitespace-only input
    #[error("No JSON value found")]
    NoValue,

    /// Backslash followed by something other than a JSON escape
    #[error("Invalid escape sequence")]
    InvalidEscape,

    /// Malformed `\u` escape or an unpaired surrogate
    #[error("Invalid \\u escape")]
    InvalidUnicodeEscape,

    /// Raw byte below 0x20 inside a string
    #[error("Unescaped control character in string")]
    ControlCharacter,

    /// Number token that does not follow the JSON grammar
    #[error("Invalid number")]
    InvalidNumber,

    /// String contents that are not valid UTF-8
    #[error("Invalid UTF-8 in string")]
    InvalidUtf8,

    /// Container nesting went past the configured bound
    #[error("Too deeply nested (maximum depth {max})")]
    TooDeep {
        /// Configured maximum depth
        max: usize,
    },
}

/// A failed parse, positioned by character offset.
///
/// Multi-byte UTF-8 sequences count as a single character, so the offset
/// lines up with what an editor shows rather than the raw byte index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error parsing JSON value: {kind} at offset {offset}")]
pub struct ParseError {
    /// Error category
    pub kind: ParseErrorKind,
    /// Character offset into the input
    pub offset: usize,
}

impl ParseError {
    /// Create a parse error at a character offset.
    pub fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

/// Errors from building values directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Text that is not a JSON number
    #[error("Invalid JSON number: \"{0}\"")]
    InvalidNumber(String),

    /// Text that is not a recognised boolean word
    #[error("Invalid boolean: \"{0}\"")]
    InvalidBoolean(String),

    /// In-place mutation requested while another holder shares the payload
    #[error("Cannot mutate a shared {type_name} in place")]
    Shared {
        /// Type of the shared node
        type_name: &'static str,
    },

    /// Mutable container access on a non-container
    #[error("Type error: expected {expected}, got {got}")]
    TypeError {
        /// Expected type
        expected: &'static str,
        /// Actual type
        got: &'static str,
    },
}

/// Errors from path get/set/unset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Object key missing during a read
    #[error("Path element \"{step}\" not found")]
    NotFound {
        /// The missing key
        step: String,
    },

    /// A step used against an array that is not an index
    #[error("Expected an integer index or end(+/-integer)?, got {step}")]
    BadIndex {
        /// The offending step
        step: String,
    },

    /// Path continues below a scalar
    #[error("Cannot descend into atomic type \"{type_name}\" with path element \"{step}\"")]
    AtomicDescent {
        /// Type of the scalar
        type_name: &'static str,
        /// Step that tried to descend
        step: String,
    },

    /// A known modifier applied to a type it does not support
    #[error("{modifier} modifier is not supported for type {type_name}")]
    UnsupportedModifier {
        /// The modifier, including its `?`
        modifier: String,
        /// Type it was applied to
        type_name: &'static str,
    },

    /// A `?` step that names no modifier
    #[error("Unknown modifier \"{modifier}\"")]
    UnknownModifier {
        /// The modifier text
        modifier: String,
    },

    /// Missing intermediate element while removing
    #[error("Path element \"{prefix}\" doesn't exist")]
    BadPath {
        /// Path prefix up to and including the missing element
        prefix: String,
    },
}

/// Errors from compiling or applying templates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Number, Bool, Json or Template placeholder used as an object key
    #[error("Only strings allowed as object keys")]
    KeyKind {
        /// The offending key text
        key: String,
    },

    /// `~N:` substitution that is not numeric
    #[error("Error substituting value from \"{name}\" into template, not a number: \"{value}\"")]
    NotANumber {
        /// Placeholder name
        name: String,
        /// Rejected text
        value: String,
    },

    /// `~B:` substitution that is not a boolean
    #[error("Error substituting value from \"{name}\" into template, not a boolean: \"{value}\"")]
    NotABoolean {
        /// Placeholder name
        name: String,
        /// Rejected text
        value: String,
    },

    /// Key placeholder whose substitution is absent or null
    #[error("Error substituting value from \"{name}\" into template, object key is null")]
    NullKey {
        /// Placeholder name
        name: String,
    },

    /// Substituted key equal to a sibling's key
    #[error("Error substituting value from \"{name}\" into template, duplicate object key \"{key}\"")]
    DuplicateKey {
        /// Placeholder name
        name: String,
        /// The colliding key
        key: String,
    },

    /// `~J:` or `~T:` substitution text that does not parse
    #[error("Error substituting value from \"{name}\" into template: {source}")]
    InvalidJson {
        /// Placeholder name
        name: String,
        /// Underlying parse failure
        #[source]
        source: ParseError,
    },

    /// Nested `~T:` templates went past the configured bound
    #[error("Template recursion too deep (maximum {max})")]
    RecursionLimit {
        /// Configured maximum
        max: usize,
    },

    /// Executor container stack exceeded its preallocated depth
    #[error("Template stack overflow: depth {depth} exceeds {max}")]
    StackOverflow {
        /// Attempted depth
        depth: usize,
        /// Preallocated depth
        max: usize,
    },

    /// A tape that does not match the document it is applied to
    #[error("Template tape does not fit document: {0}")]
    Mismatch(String),
}

/// Errors from the iteration driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IterateError {
    /// A lane that binds no values
    #[error("foreach varlist is empty")]
    EmptyLane,

    /// Object lanes bind exactly a key and a value
    #[error("When iterating over a JSON object, varlist must be a pair of varnames (key value)")]
    ObjectWidth,

    /// Scalars cannot be iterated
    #[error("Cannot iterate over JSON type {0}")]
    NotIterable(&'static str),
}

/// Main error type for jsonweave operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsonError {
    /// Parse failure
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Value construction failure
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Path failure
    #[error(transparent)]
    Path(#[from] PathError),

    /// Template failure
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Iteration failure
    #[error(transparent)]
    Iterate(#[from] IterateError),
}

/// Result type alias for jsonweave operations
pub type Result<T> = std::result::Result<T, JsonError>;

/// Get the JSON type name of a value.
///
/// Placeholders report `"string"`, matching how they serialize.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) | Value::Placeholder(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
