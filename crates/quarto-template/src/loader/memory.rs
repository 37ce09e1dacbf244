/*
 * memory.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Loader for templates held in memory.

use super::{Loader, LoaderSettings, SharedSettings, TemplateReader, resolve_relative_path};
use crate::error::LoaderError;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{PoisonError, RwLock};

/// Templates bundled with the application, looked up by qualified name
/// (prefix and suffix applied).
///
/// Useful for testing and for templates embedded in a binary.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    templates: RwLock<HashMap<String, String>>,
    settings: SharedSettings,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    /// Create a loader with the given templates.
    pub fn with_templates(
        templates: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let loader = Self::new();
        for (name, source) in templates {
            loader.insert(name, source);
        }
        loader
    }

    /// Add or replace a template.
    pub fn insert(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), source.into());
    }
}

impl Loader for MemoryLoader {
    type CacheKey = String;

    fn create_cache_key(&self, template_name: &str) -> String {
        template_name.to_string()
    }

    fn reader(&self, key: &String) -> Result<TemplateReader, LoaderError> {
        let name = self.settings.get().qualified_name(key);
        let templates = self.templates.read().unwrap_or_else(PoisonError::into_inner);
        match templates.get(&name) {
            Some(source) => Ok(Box::new(Cursor::new(source.clone().into_bytes()))),
            None => Err(LoaderError::not_found(key.as_str())),
        }
    }

    fn resolve_relative_path(&self, relative_path: &str, anchor_path: &str) -> Option<String> {
        resolve_relative_path(relative_path, anchor_path)
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_lookup_by_qualified_name() {
        let loader = MemoryLoader::with_templates([("partials/header.html", "<h1>")]);
        assert!(loader.reader(&"header".to_string()).is_err());

        loader.set_prefix(Some("partials".to_string()));
        loader.set_suffix(Some(".html".to_string()));
        let mut text = String::new();
        loader
            .reader(&"header".to_string())
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "<h1>");
    }
}
