//! # jsonweave
//!
//! A JSON document engine built around copy-on-write values.
//!
//! Documents are immutable trees of `Arc`-shared nodes. Reads never copy,
//! and writes copy only the containers on the path being changed, so many
//! documents can share most of their structure. Strings of the form
//! `~X:name` are placeholders, and a document holding them is a template
//! that can be compiled once and stamped with substitution values many
//! times.
//!
//! ## Architecture
//!
//! - **Value**: tagged nodes with `Arc` payloads and copy-on-write mutation
//! - **Parser**: single-pass scanner with an explicit, bounded container stack
//! - **Serializer**: compact canonical text, pretty printing, and one-shot
//!   template rendering
//! - **Path**: get/set/unset/exists with `end`-relative indices and modifiers
//! - **Template**: compiler to an instruction tape and a stack machine that
//!   applies it
//! - **Intern**: bounded cache sharing short keys and placeholder names
//! - **Engine**: owns the caches and the configured limits
//!
//! ## Example
//!
//! ```
//! use jsonweave::{path, Bindings, Engine};
//!
//! let mut engine = Engine::new();
//! let template = engine.parse(r#"{"name":"~S:who","age":"~N:age"}"#).unwrap();
//!
//! let doc = engine
//!     .template(&template, &Bindings::new().with("who", "ada").with("age", "36"))
//!     .unwrap();
//! assert_eq!(doc.to_string(), r#"{"name":"ada","age":36}"#);
//!
//! let doc = path::set(&doc, &["langs", "0"], "rust".into()).unwrap();
//! assert!(path::exists(&doc, &["langs", "0"]));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod intern;
#[cfg(feature = "serde_json")]
mod interop;
pub mod iterate;
pub mod parser;
pub mod path;
pub mod serialize;
pub mod template;
pub mod value;

// Re-export main types
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{
    type_name, IterateError, JsonError, ParseError, ParseErrorKind, PathError, Result,
    TemplateError, ValueError,
};
pub use intern::{EvictionPolicy, HalfLife, InternCache, InternStats, Interner};
pub use iterate::{Flow, Lane};
pub use parser::{parse, parse_bytes, Parser};
pub use serialize::{to_pretty, to_string, Mode, PrettyPrinter, TemplateRenderer};
pub use template::{
    compile, Bindings, Fallback, Instruction, LookupFn, SubstitutionSource, Tape,
};
pub use value::{Kind, Map, Number, Placeholder, PlaceholderKind, Value};

/// jsonweave version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
