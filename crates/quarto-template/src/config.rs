/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Engine configuration.

use crate::runtime::DEFAULT_MAX_INCLUDE_DEPTH;
use serde::{Deserialize, Serialize};

/// Settings that control how templates are compiled and rendered.
///
/// Every field has a default, so a configuration file only needs to name
/// the settings it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Treat undefined variables and attributes as errors instead of null.
    pub strict_variables: bool,

    /// Keep compiled templates, keyed by their loader cache key.
    pub cache_templates: bool,

    /// Upper bound on cached templates; the oldest are evicted first.
    /// `None` keeps every template until the cache is cleared.
    pub cache_capacity: Option<usize>,

    /// Maximum nesting of `include` before rendering fails.
    pub max_include_depth: usize,

    /// Locale used by renders that do not pass one.
    pub default_locale: Option<String>,

    /// Worker threads for `parallel` blocks. `None` renders them inline.
    pub parallel_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_variables: false,
            cache_templates: true,
            cache_capacity: None,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            default_locale: None,
            parallel_threads: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"strict_variables": true, "parallel_threads": 4}"#).unwrap();
        assert!(config.strict_variables);
        assert!(config.cache_templates);
        assert_eq!(config.cache_capacity, None);
        assert_eq!(config.max_include_depth, 50);
        assert_eq!(config.parallel_threads, Some(4));
        assert_eq!(config.default_locale, None);
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig {
            default_locale: Some("es_US".to_string()),
            cache_capacity: Some(64),
            ..EngineConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<EngineConfig>(&json).unwrap(), config);
    }
}
