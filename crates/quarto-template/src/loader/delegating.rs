/*
 * delegating.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A loader that tries a list of loaders in order.

use super::{DynLoader, Loader, LoaderSettings, SharedSettings, TemplateKey, TemplateReader};
use crate::error::LoaderError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Cache key of a [`DelegatingLoader`]: one key per child loader, in
/// order, plus the template name.
#[derive(Debug, Clone)]
pub struct DelegatingCacheKey {
    template_name: String,
    keys: Vec<TemplateKey>,
}

impl DelegatingCacheKey {
    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn keys(&self) -> &[TemplateKey] {
        &self.keys
    }
}

impl PartialEq for DelegatingCacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.template_name == other.template_name && self.keys == other.keys
    }
}

impl Eq for DelegatingCacheKey {}

impl Hash for DelegatingCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.template_name.hash(state);
        self.keys.hash(state);
    }
}

/// Delegates to child loaders in order; the first one that finds the
/// template wins.
///
/// Failures of individual children are not errors. Only when every child
/// has failed does reading fail, with [`LoaderError::NotFound`].
pub struct DelegatingLoader {
    loaders: Vec<Arc<dyn DynLoader>>,
    settings: SharedSettings,
}

impl DelegatingLoader {
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            settings: SharedSettings::default(),
        }
    }

    /// Append a child loader.
    pub fn with_loader(self, loader: impl Loader) -> Self {
        self.with_shared_loader(Arc::new(loader))
    }

    pub fn with_shared_loader(mut self, loader: Arc<dyn DynLoader>) -> Self {
        self.loaders.push(loader);
        self
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl Default for DelegatingLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DelegatingLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingLoader")
            .field("loaders", &self.loaders.len())
            .field("settings", &self.settings.get())
            .finish()
    }
}

impl FromIterator<Arc<dyn DynLoader>> for DelegatingLoader {
    fn from_iter<I: IntoIterator<Item = Arc<dyn DynLoader>>>(iter: I) -> Self {
        Self {
            loaders: iter.into_iter().collect(),
            settings: SharedSettings::default(),
        }
    }
}

impl Loader for DelegatingLoader {
    type CacheKey = DelegatingCacheKey;

    fn create_cache_key(&self, template_name: &str) -> DelegatingCacheKey {
        DelegatingCacheKey {
            template_name: template_name.to_string(),
            keys: self
                .loaders
                .iter()
                .map(|loader| loader.clone().bind_key(template_name))
                .collect(),
        }
    }

    fn reader(&self, key: &DelegatingCacheKey) -> Result<TemplateReader, LoaderError> {
        for (index, child) in key.keys.iter().enumerate() {
            match child.reader() {
                Ok(reader) => {
                    tracing::trace!(
                        template = %key.template_name,
                        loader = index,
                        "Template found"
                    );
                    return Ok(reader);
                }
                Err(error) => {
                    tracing::debug!(
                        template = %key.template_name,
                        loader = index,
                        error = %error,
                        "Loader could not provide template; trying next"
                    );
                }
            }
        }
        Err(LoaderError::not_found(key.template_name.as_str()))
    }

    /// Any child may end up answering, so every child must allow caching.
    fn cacheable(&self, key: &DelegatingCacheKey) -> bool {
        key.keys.iter().all(TemplateKey::cacheable)
    }

    fn resolve_relative_path(&self, relative_path: &str, anchor_path: &str) -> Option<String> {
        self.loaders
            .iter()
            .find_map(|loader| loader.resolve_relative(relative_path, anchor_path))
    }

    fn settings(&self) -> LoaderSettings {
        self.settings.get()
    }

    fn set_prefix(&self, prefix: Option<String>) {
        self.settings.update(|s| s.prefix = prefix.clone());
        for loader in &self.loaders {
            loader.apply_prefix(prefix.clone());
        }
    }

    fn set_suffix(&self, suffix: Option<String>) {
        self.settings.update(|s| s.suffix = suffix.clone());
        for loader in &self.loaders {
            loader.apply_suffix(suffix.clone());
        }
    }

    fn set_charset(&self, charset: String) {
        self.settings.update(|s| s.charset = charset.clone());
        for loader in &self.loaders {
            loader.apply_charset(charset.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{MemoryLoader, StringLoader};
    use std::io::Read;

    fn read(loader: &DelegatingLoader, name: &str) -> Result<String, LoaderError> {
        let key = loader.create_cache_key(name);
        let mut text = String::new();
        loader
            .reader(&key)?
            .read_to_string(&mut text)
            .map_err(|source| LoaderError::Io {
                name: name.to_string(),
                source,
            })?;
        Ok(text)
    }

    #[test]
    fn test_first_successful_loader_wins() {
        let loader = DelegatingLoader::new()
            .with_loader(MemoryLoader::new().with_template("a", "from memory"))
            .with_loader(StringLoader::new());

        assert_eq!(read(&loader, "a").unwrap(), "from memory");
        // the memory loader misses, the string loader treats the name as source
        assert_eq!(read(&loader, "hello").unwrap(), "hello");
    }

    #[test]
    fn test_all_loaders_failing_is_not_found() {
        let loader = DelegatingLoader::new()
            .with_loader(MemoryLoader::new())
            .with_loader(MemoryLoader::new().with_template("other", ""));

        let err = read(&loader, "missing").unwrap_err();
        assert_eq!(err.to_string(), "Could not find template \"missing\"");
    }

    #[test]
    fn test_empty_chain_is_not_found() {
        let loader = DelegatingLoader::new();
        assert!(matches!(
            read(&loader, "x"),
            Err(LoaderError::NotFound { .. })
        ));
    }

    #[test]
    fn test_cache_key_has_one_key_per_loader() {
        let loader = DelegatingLoader::new()
            .with_loader(MemoryLoader::new())
            .with_loader(StringLoader::new());
        let key = loader.create_cache_key("page");
        assert_eq!(key.template_name(), "page");
        assert_eq!(key.keys().len(), 2);
        assert!(key.keys().iter().all(|k| k.template_name() == "page"));
        assert_eq!(key, loader.create_cache_key("page"));
        assert_ne!(key, loader.create_cache_key("other"));
    }

    #[test]
    fn test_cacheable_only_when_every_child_is() {
        let loader = DelegatingLoader::new()
            .with_loader(MemoryLoader::new())
            .with_loader(StringLoader::new());
        assert!(loader.cacheable(&loader.create_cache_key("page")));

        let loader = loader.with_loader(StringLoader::new().without_caching());
        assert!(!loader.cacheable(&loader.create_cache_key("page")));
    }

    #[test]
    fn test_settings_propagate_to_children() {
        let memory = Arc::new(MemoryLoader::new().with_template("pages/home.html", "home"));
        let loader = DelegatingLoader::new().with_shared_loader(memory.clone());

        loader.set_prefix(Some("pages".to_string()));
        loader.set_suffix(Some(".html".to_string()));
        loader.set_charset("utf8".to_string());

        assert_eq!(memory.settings().prefix.as_deref(), Some("pages"));
        assert_eq!(memory.settings().suffix.as_deref(), Some(".html"));
        assert_eq!(memory.settings().charset, "utf8");
        assert_eq!(loader.settings().charset, "utf8");
        assert_eq!(read(&loader, "home").unwrap(), "home");
    }

    #[test]
    fn test_resolve_relative_path_uses_first_answer() {
        let loader = DelegatingLoader::new()
            .with_loader(StringLoader::new())
            .with_loader(MemoryLoader::new());
        assert_eq!(
            loader.resolve_relative_path("./footer", "pages/index"),
            Some("pages/footer".to_string())
        );
        assert_eq!(loader.resolve_relative_path("footer", "pages/index"), None);
    }
}
