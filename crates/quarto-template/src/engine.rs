/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The engine: loader, extensions, configuration and template cache.
//!
//! ```ignore
//! use quarto_template::{Engine, MemoryLoader, Value};
//!
//! let engine = Engine::builder()
//!     .loader(MemoryLoader::new().with_template("hello", "Hello, {{ name | upper }}!"))
//!     .build()?;
//!
//! let template = engine.get_template("hello")?;
//! let output = template.render([("name", Value::from("world"))])?;
//! assert_eq!(output, "Hello, WORLD!");
//! ```

use crate::config::EngineConfig;
use crate::error::{LoaderError, ParseError, TemplateResult};
use crate::extension::core::CoreExtension;
use crate::extension::{Extension, ExtensionRegistry, ExtensionRegistryBuilder};
use crate::loader::{DynLoader, FileLoader, Loader, LoaderSettings, TemplateKey};
use crate::node::RenderableNode;
use crate::parser::parse_template;
use crate::runtime::{Executor, thread_pool};
use crate::template::{RenderSettings, Template};
use indexmap::IndexMap;
use std::fmt;
use std::io::Read;
use std::sync::{Arc, PoisonError, RwLock};

pub(crate) struct EngineShared {
    loader: Arc<dyn DynLoader>,
    registry: Arc<ExtensionRegistry>,
    config: EngineConfig,
    settings: Arc<RenderSettings>,
    executor: Option<Arc<dyn Executor>>,
    cache: RwLock<IndexMap<TemplateKey, Template>>,
}

/// Compiles templates found through a loader.
///
/// Cloning an engine is cheap; clones share the loader, the extension
/// registry and the template cache.
#[derive(Clone)]
pub struct Engine {
    shared: Arc<EngineShared>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn from_shared(shared: Arc<EngineShared>) -> Self {
        Self { shared }
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.shared.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Load and compile a template, or return the cached copy.
    ///
    /// Compiled templates are cached under the loader's key unless caching
    /// is disabled or the loader opts out for that key. Without a
    /// `cache_capacity` the cache grows until [`Engine::clear_cache`]; with
    /// one, the oldest entries are evicted first.
    pub fn get_template(&self, name: &str) -> TemplateResult<Template> {
        let key = self.shared.loader.clone().bind_key(name);
        let config = &self.shared.config;
        let caching =
            config.cache_templates && config.cache_capacity != Some(0) && key.cacheable();

        if caching {
            let cache = self
                .shared
                .cache
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(template) = cache.get(&key) {
                tracing::trace!(template = name, "Template cache hit");
                return Ok(template.clone());
            }
        }

        tracing::debug!(template = name, "Compiling template");
        let source = read_source(&key)?;
        let template = self.compile(name, &source)?;

        if !caching {
            return Ok(template);
        }
        let mut cache = self
            .shared
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // another thread may have compiled the same template meanwhile
        if let Some(existing) = cache.get(&key) {
            return Ok(existing.clone());
        }
        if let Some(capacity) = config.cache_capacity {
            while cache.len() >= capacity {
                let Some((evicted, _)) = cache.shift_remove_index(0) else {
                    break;
                };
                tracing::trace!(template = evicted.template_name(), "Evicting cached template");
            }
        }
        cache.insert(key, template.clone());
        Ok(template)
    }

    /// Compile `source` under `name` without consulting the loader or the
    /// cache.
    pub fn compile(&self, name: &str, source: &str) -> Result<Template, ParseError> {
        let mut root = parse_template(source, name, &self.shared.registry)?;

        for factory in self.shared.registry.node_visitors() {
            let mut visitor = factory.create_visitor(name);
            root.accept(visitor.as_mut());
            root.transform(visitor.as_mut());
        }

        Ok(Template::new(
            name,
            root,
            self.shared.registry.clone(),
            self.shared.settings.clone(),
            self.shared.executor.clone(),
            Arc::downgrade(&self.shared),
        ))
    }

    /// Resolve `name` against the template `anchor`. Names the loader does
    /// not consider relative are returned unchanged.
    pub fn resolve_relative_path(&self, name: &str, anchor: &str) -> String {
        self.shared
            .loader
            .resolve_relative(name, anchor)
            .unwrap_or_else(|| name.to_string())
    }

    pub fn loader_settings(&self) -> LoaderSettings {
        self.shared.loader.current_settings()
    }

    /// Drop all cached templates.
    pub fn clear_cache(&self) {
        self.shared
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn cached_templates(&self) -> usize {
        self.shared
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.shared.registry)
            .field("config", &self.shared.config)
            .field("has_executor", &self.shared.executor.is_some())
            .finish()
    }
}

fn read_source(key: &TemplateKey) -> Result<String, LoaderError> {
    let io_error = |source| LoaderError::Io {
        name: key.template_name().to_string(),
        source,
    };
    let mut bytes = Vec::new();
    key.reader()?.read_to_end(&mut bytes).map_err(io_error)?;
    String::from_utf8(bytes)
        .map_err(|e| io_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Builder for [`Engine`].
///
/// The core extension is always registered first, so its operators can not
/// be replaced by later extensions.
pub struct EngineBuilder {
    loader: Option<Arc<dyn DynLoader>>,
    loader_settings: Option<LoaderSettings>,
    extensions: ExtensionRegistryBuilder,
    executor: Option<Arc<dyn Executor>>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            loader: None,
            loader_settings: None,
            extensions: ExtensionRegistry::builder().register(CoreExtension),
            executor: None,
            config: EngineConfig::default(),
        }
    }

    /// Where templates come from. Defaults to a [`FileLoader`] on the
    /// current directory.
    pub fn loader(self, loader: impl Loader) -> Self {
        self.shared_loader(Arc::new(loader))
    }

    pub fn shared_loader(mut self, loader: Arc<dyn DynLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Prefix, suffix and charset applied to the loader when the engine is
    /// built.
    pub fn loader_settings(mut self, settings: LoaderSettings) -> Self {
        self.loader_settings = Some(settings);
        self
    }

    pub fn extension<E: Extension>(mut self, extension: E) -> Self {
        self.extensions = self.extensions.register(extension);
        self
    }

    pub fn shared_extension<E: Extension>(mut self, extension: Arc<E>) -> Self {
        self.extensions = self.extensions.register_shared(extension);
        self
    }

    /// Run `parallel` blocks on `executor`. Takes precedence over
    /// `parallel_threads`.
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_strict_variables(mut self, strict: bool) -> Self {
        self.config.strict_variables = strict;
        self
    }

    pub fn with_cache_templates(mut self, cache: bool) -> Self {
        self.config.cache_templates = cache;
        self
    }

    /// Bound the template cache to `capacity` entries.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = Some(capacity);
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.config.max_include_depth = depth;
        self
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.config.default_locale = Some(locale.into());
        self
    }

    pub fn with_parallel_threads(mut self, threads: Option<usize>) -> Self {
        self.config.parallel_threads = threads;
        self
    }

    pub fn build(self) -> TemplateResult<Engine> {
        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(FileLoader::default()));
        if let Some(settings) = self.loader_settings {
            loader.apply_prefix(settings.prefix);
            loader.apply_suffix(settings.suffix);
            loader.apply_charset(settings.charset);
        }

        let executor = match (self.executor, self.config.parallel_threads) {
            (Some(executor), _) => Some(executor),
            (None, Some(threads)) => {
                tracing::debug!(threads, "Starting worker pool for parallel blocks");
                let pool: Arc<dyn Executor> = Arc::new(thread_pool(threads)?);
                Some(pool)
            }
            (None, None) => None,
        };

        let settings = Arc::new(RenderSettings {
            strict_variables: self.config.strict_variables,
            max_include_depth: self.config.max_include_depth,
            default_locale: self.config.default_locale.clone(),
        });

        Ok(Engine {
            shared: Arc::new(EngineShared {
                loader,
                registry: Arc::new(self.extensions.build()),
                config: self.config,
                settings,
                executor,
                cache: RwLock::new(IndexMap::new()),
            }),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
