//! The engine: configuration plus the caches that outlive a single call

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::{ParseError, TemplateError};
use crate::intern::{InternCache, Interner};
use crate::parser::Parser;
use crate::serialize::{to_string, to_template_key, Mode, PrettyPrinter, TemplateRenderer};
use crate::template::{Compiler, Executor, SubstitutionSource, Tape};
use crate::value::Value;

/// Owns the string interning cache and the compiled template cache.
///
/// Everything an engine does is single-threaded and synchronous. Free
/// functions such as [`parse`](crate::parse) and [`to_string`] work without
/// one; the engine adds interning, template caching and configured limits.
///
/// # Example
///
/// ```
/// use jsonweave::{Bindings, Engine};
///
/// let mut engine = Engine::new();
/// let doc = engine.parse(r#"{"qty":"~N:qty"}"#).unwrap();
///
/// let first = engine.compile_template(&doc).unwrap();
/// let again = engine.compile_template(&doc).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &again));
///
/// let out = engine.apply_template(&doc, &first, &Bindings::single("qty", 3)).unwrap();
/// assert_eq!(out.to_string(), r#"{"qty":3}"#);
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    interner: InternCache,
    /// Keyed by canonical template text with placeholders tagged, oldest first
    templates: IndexMap<String, Arc<Tape>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with default settings.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with custom limits.
    pub fn with_config(config: EngineConfig) -> Self {
        let interner = InternCache::new(config.intern_capacity, config.intern_max_len);
        Self {
            config,
            interner,
            templates: IndexMap::new(),
        }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════════
    // Text in, text out
    // ═══════════════════════════════════════════════════════════════════

    /// Parse a document, interning short keys and placeholder names.
    pub fn parse(&mut self, input: impl AsRef<[u8]>) -> Result<Value, ParseError> {
        Parser::new(&self.config)
            .with_interner(&mut self.interner)
            .parse(input.as_ref())
    }

    /// Parse and re-serialize in normal mode.
    pub fn normalize(&mut self, input: impl AsRef<[u8]>) -> Result<String, ParseError> {
        self.parse(input).map(|value| to_string(&value))
    }

    /// Serialize `value` in the given mode.
    pub fn serialize(&self, value: &Value, mode: Mode<'_>) -> String {
        match mode {
            Mode::Normal => to_string(value),
            Mode::Pretty(indent) => PrettyPrinter::new(indent)
                .with_key_cap(self.config.pretty_key_cap)
                .print(value),
        }
    }

    /// Pretty print with the configured indent.
    pub fn pretty(&self, value: &Value) -> String {
        self.serialize(value, Mode::Pretty(&self.config.pretty_indent))
    }

    /// Serialize `template`, substituting placeholders while writing.
    ///
    /// Suited to one-off documents; [`Engine::template`] is cheaper when the
    /// same template is applied repeatedly.
    pub fn render_template(
        &self,
        template: &Value,
        source: &dyn SubstitutionSource,
    ) -> Result<String, TemplateError> {
        TemplateRenderer::new(source, &self.config).render(template)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Compiled templates
    // ═══════════════════════════════════════════════════════════════════

    /// Compile `doc`, reusing a cached tape for an identical template.
    pub fn compile_template(&mut self, doc: &Value) -> Result<Arc<Tape>, TemplateError> {
        let key = to_template_key(doc);
        if let Some(tape) = self.templates.get(&key) {
            trace!(bytes = key.len(), "template cache hit");
            return Ok(tape.clone());
        }
        trace!(bytes = key.len(), "template cache miss");

        let interner: &mut dyn Interner = &mut self.interner;
        let tape = Arc::new(Compiler::new(Some(interner)).compile(doc)?);

        if self.config.template_cache_capacity > 0 {
            if self.templates.len() >= self.config.template_cache_capacity {
                self.templates.shift_remove_index(0);
            }
            self.templates.insert(key, tape.clone());
        }
        Ok(tape)
    }

    /// Run a compiled `tape` over `doc`. `doc` itself is never modified.
    pub fn apply_template(
        &mut self,
        doc: &Value,
        tape: &Tape,
        source: &dyn SubstitutionSource,
    ) -> Result<Value, TemplateError> {
        Executor::new(self, source, 0).run(doc, tape)
    }

    /// Compile (cached) and apply in one step.
    pub fn template(
        &mut self,
        doc: &Value,
        source: &dyn SubstitutionSource,
    ) -> Result<Value, TemplateError> {
        self.template_nested(doc, source, 0)
    }

    /// Apply a `~T:` sub-template found `depth` levels down.
    pub(crate) fn template_nested(
        &mut self,
        doc: &Value,
        source: &dyn SubstitutionSource,
        depth: usize,
    ) -> Result<Value, TemplateError> {
        if depth > self.config.max_template_depth {
            return Err(TemplateError::RecursionLimit {
                max: self.config.max_template_depth,
            });
        }
        let tape = self.compile_template(doc)?;
        Executor::new(self, source, depth).run(doc, &tape)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Caches
    // ═══════════════════════════════════════════════════════════════════

    pub(crate) fn intern(&mut self, s: &str) -> Arc<str> {
        self.interner.intern(s)
    }

    /// The string interning cache.
    pub fn interner(&self) -> &InternCache {
        &self.interner
    }

    /// Number of compiled templates currently cached.
    pub fn cached_templates(&self) -> usize {
        self.templates.len()
    }

    /// Drop every interned string and compiled template.
    pub fn clear_caches(&mut self) {
        debug!(
            interned = self.interner.len(),
            templates = self.templates.len(),
            "clearing caches"
        );
        self.interner.clear();
        self.templates.clear();
    }
}
