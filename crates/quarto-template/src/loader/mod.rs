/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template loaders.
//!
//! A [`Loader`] turns a template name into a reader over the template's
//! source. Each loader chooses its own cache key type; the engine and the
//! [`DelegatingLoader`] work with loaders of different key types through the
//! object-safe [`DynLoader`] view, which pairs every key with the loader that
//! created it ([`TemplateKey`]).

mod delegating;
mod file;
mod memory;
mod string;

pub use delegating::{DelegatingCacheKey, DelegatingLoader};
pub use file::FileLoader;
pub use memory::MemoryLoader;
pub use string::StringLoader;

use crate::error::LoaderError;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::sync::{Arc, PoisonError, RwLock};

/// Source text of a template, as produced by a loader.
pub type TemplateReader = Box<dyn Read + Send>;

/// The only character encoding loaders accept.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Settings shared by all loaders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
    /// Prepended to every template name, as a directory.
    pub prefix: Option<String>,
    /// Appended to every template name.
    pub suffix: Option<String>,
    pub charset: String,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            prefix: None,
            suffix: None,
            charset: DEFAULT_CHARSET.to_string(),
        }
    }
}

impl LoaderSettings {
    /// Template name with prefix and suffix applied.
    pub fn qualified_name(&self, template_name: &str) -> String {
        let mut name = String::new();
        if let Some(prefix) = self.prefix.as_deref().filter(|p| !p.is_empty()) {
            name.push_str(prefix);
            if !prefix.ends_with('/') {
                name.push('/');
            }
        }
        name.push_str(template_name);
        if let Some(suffix) = &self.suffix {
            name.push_str(suffix);
        }
        name
    }

    pub fn check_charset(&self) -> Result<(), LoaderError> {
        let normalized = self.charset.to_ascii_lowercase().replace(['-', '_'], "");
        if normalized == "utf8" {
            Ok(())
        } else {
            Err(LoaderError::UnsupportedCharset {
                charset: self.charset.clone(),
            })
        }
    }
}

/// Interior-mutable [`LoaderSettings`] for loaders shared across threads.
#[derive(Debug, Default)]
pub(crate) struct SharedSettings(RwLock<LoaderSettings>);

impl SharedSettings {
    pub(crate) fn get(&self) -> LoaderSettings {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut LoaderSettings)) {
        let mut settings = self.0.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut settings);
    }
}

/// A source of template text.
///
/// Loaders are shared between concurrent renders, so every method takes
/// `&self`; settings are held behind interior mutability.
pub trait Loader: Send + Sync + 'static {
    /// Identifies a template for caching.
    type CacheKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    fn create_cache_key(&self, template_name: &str) -> Self::CacheKey;

    /// Open the template identified by `key`.
    fn reader(&self, key: &Self::CacheKey) -> Result<TemplateReader, LoaderError>;

    /// Resolve `relative_path` against the template `anchor_path`.
    ///
    /// Returns `None` if this loader does not treat `relative_path` as
    /// relative.
    fn resolve_relative_path(&self, relative_path: &str, anchor_path: &str) -> Option<String>;

    fn settings(&self) -> LoaderSettings;

    fn set_prefix(&self, prefix: Option<String>);

    fn set_suffix(&self, suffix: Option<String>);

    fn set_charset(&self, charset: String);

    /// Whether the engine may keep the template compiled from `key`.
    /// Loaders whose sources change between loads return `false`.
    fn cacheable(&self, _key: &Self::CacheKey) -> bool {
        true
    }
}

/// A cache key bound to the loader that created it.
pub trait BoundKey: Send + Sync + fmt::Debug {
    fn template_name(&self) -> &str;

    /// Open the template through the loader that created this key.
    fn reader(&self) -> Result<TemplateReader, LoaderError>;

    fn cacheable(&self) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn key_eq(&self, other: &dyn BoundKey) -> bool;

    fn key_hash(&self, state: &mut dyn Hasher);
}

struct Bound<L: Loader> {
    loader: Arc<L>,
    key: L::CacheKey,
    name: String,
}

impl<L: Loader> fmt::Debug for Bound<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("loader", &std::any::type_name::<L>())
            .field("key", &self.key)
            .finish()
    }
}

impl<L: Loader> BoundKey for Bound<L> {
    fn template_name(&self) -> &str {
        &self.name
    }

    fn reader(&self) -> Result<TemplateReader, LoaderError> {
        self.loader.reader(&self.key)
    }

    fn cacheable(&self) -> bool {
        self.loader.cacheable(&self.key)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn key_eq(&self, other: &dyn BoundKey) -> bool {
        other
            .as_any()
            .downcast_ref::<Bound<L>>()
            .is_some_and(|other| Arc::ptr_eq(&self.loader, &other.loader) && self.key == other.key)
    }

    fn key_hash(&self, mut state: &mut dyn Hasher) {
        self.key.hash(&mut state);
    }
}

/// Hashable handle on a [`BoundKey`].
#[derive(Debug, Clone)]
pub struct TemplateKey(Arc<dyn BoundKey>);

impl TemplateKey {
    pub fn template_name(&self) -> &str {
        self.0.template_name()
    }

    pub fn reader(&self) -> Result<TemplateReader, LoaderError> {
        self.0.reader()
    }

    pub fn cacheable(&self) -> bool {
        self.0.cacheable()
    }
}

impl PartialEq for TemplateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.key_eq(other.0.as_ref())
    }
}

impl Eq for TemplateKey {}

impl Hash for TemplateKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.key_hash(state);
    }
}

/// Object-safe view of a [`Loader`], implemented for every loader.
pub trait DynLoader: Send + Sync {
    /// Create a cache key for `template_name`, bound to this loader.
    fn bind_key(self: Arc<Self>, template_name: &str) -> TemplateKey;

    fn resolve_relative(&self, relative_path: &str, anchor_path: &str) -> Option<String>;

    fn current_settings(&self) -> LoaderSettings;

    fn apply_prefix(&self, prefix: Option<String>);

    fn apply_suffix(&self, suffix: Option<String>);

    fn apply_charset(&self, charset: String);
}

impl<L: Loader> DynLoader for L {
    fn bind_key(self: Arc<Self>, template_name: &str) -> TemplateKey {
        let key = self.create_cache_key(template_name);
        TemplateKey(Arc::new(Bound {
            loader: self,
            key,
            name: template_name.to_string(),
        }))
    }

    fn resolve_relative(&self, relative_path: &str, anchor_path: &str) -> Option<String> {
        self.resolve_relative_path(relative_path, anchor_path)
    }

    fn current_settings(&self) -> LoaderSettings {
        self.settings()
    }

    fn apply_prefix(&self, prefix: Option<String>) {
        self.set_prefix(prefix);
    }

    fn apply_suffix(&self, suffix: Option<String>) {
        self.set_suffix(suffix);
    }

    fn apply_charset(&self, charset: String) {
        self.set_charset(charset);
    }
}

/// Resolve `./` and `../` paths against the directory of `anchor_path`.
///
/// Other paths are not relative and yield `None`. `..` never climbs above
/// the root of the anchor.
pub fn resolve_relative_path(relative_path: &str, anchor_path: &str) -> Option<String> {
    if !(relative_path.starts_with("./") || relative_path.starts_with("../")) {
        return None;
    }

    let absolute = anchor_path.starts_with('/');
    let directory = anchor_path.rfind('/').map_or("", |i| &anchor_path[..i]);
    let mut parts: Vec<&str> = directory
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();

    for part in relative_path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }

    let joined = parts.join("/");
    Some(if absolute {
        format!("/{}", joined)
    } else {
        joined
    })
}
