//! Engine configuration

/// Limits and tuning knobs for an [`Engine`](crate::Engine).
///
/// Every stack the engine uses is bounded by one of these values, so a
/// hostile document produces an error instead of exhausting memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum container nesting accepted by the parser
    pub max_depth: usize,

    /// Maximum nesting of `~T:` sub-templates during apply and render
    pub max_template_depth: usize,

    /// Number of slots in the string interning cache
    pub intern_capacity: usize,

    /// Strings longer than this (in bytes) bypass the interning cache
    pub intern_max_len: usize,

    /// Compiled templates kept per engine; the oldest is dropped first
    pub template_cache_capacity: usize,

    /// Widest key the pretty printer pads to
    pub pretty_key_cap: usize,

    /// Indent used by pretty printing when none is given
    pub pretty_indent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_template_depth: 16,
            intern_capacity: 4096,
            intern_max_len: 16,
            template_cache_capacity: 256,
            pretty_key_cap: 20,
            pretty_indent: "    ".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with a custom parser nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Default::default()
        }
    }

    /// Create a config with a custom interning cache size.
    pub fn with_intern_capacity(intern_capacity: usize) -> Self {
        Self {
            intern_capacity,
            ..Default::default()
        }
    }

    /// Tight limits for untrusted input.
    pub fn strict() -> Self {
        Self {
            max_depth: 32,
            max_template_depth: 4,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_depth, 100);
        assert_eq!(config.pretty_key_cap, 20);
        assert_eq!(config.pretty_indent, "    ");
        assert_eq!(config.template_cache_capacity, 256);
    }

    #[test]
    fn test_with_max_depth_keeps_other_defaults() {
        let config = EngineConfig::with_max_depth(5);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.intern_capacity, 4096);
    }

    #[test]
    fn test_strict_is_tighter() {
        let strict = EngineConfig::strict();
        assert!(strict.max_depth < EngineConfig::default().max_depth);
    }
}
