/*
 * string.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Loader whose template names are the template sources.

use super::{Loader, LoaderSettings, SharedSettings, TemplateReader};
use crate::error::LoaderError;
use std::io::Cursor;

/// Treats the template name itself as the template source.
///
/// Useful for compiling one-off templates and as the last resort of a
/// delegating chain. Prefix and suffix are recorded but not applied.
#[derive(Debug, Default)]
pub struct StringLoader {
    settings: SharedSettings,
    uncached: bool,
}

impl StringLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the engine from caching templates compiled from this loader.
    /// Every distinct source would otherwise stay cached.
    pub fn without_caching(mut self) -> Self {
        self.uncached = true;
        self
    }
}

impl Loader for StringLoader {
    type CacheKey = String;

    fn create_cache_key(&self, template_name: &str) -> String {
        template_name.to_string()
    }

    fn reader(&self, key: &String) -> Result<TemplateReader, LoaderError> {
        Ok(Box::new(Cursor::new(key.clone().into_bytes())))
    }

    fn cacheable(&self, _key: &String) -> bool {
        !self.uncached
    }

    fn resolve_relative_path(&self, _relative_path: &str, _anchor_path: &str) -> Option<String> {
        None
    }

    fn settings(&self) -> LoaderSettings {
        self.settings.get()
    }

    fn set_prefix(&self, prefix: Option<String>) {
        self.settings.update(|s| s.prefix = prefix);
    }

    fn set_suffix(&self, suffix: Option<String>) {
        self.settings.update(|s| s.suffix = suffix);
    }

    fn set_charset(&self, charset: String) {
        self.settings.update(|s| s.charset = charset);
    }
}
