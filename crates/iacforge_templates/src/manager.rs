//! Template loading, parsing and caching.

use std::collections::HashMap;
use std::sync::Arc;

use minijinja::{Environment, UndefinedBehavior};
use parking_lot::RwLock;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use iacforge_model::TemplateFormat;

use crate::cache::{CacheStats, TemplateCache};
use crate::config::CacheConfig;
use crate::error::{TemplateError, TemplateResult};
use crate::functions::register_functions;
use crate::source::{EmbeddedSource, TemplateSource};

/// Reserved sub-namespace holding shared partials for a format.
pub const COMMON_NAMESPACE: &str = "_common";

/// File suffixes recognised as templates.
pub const TEMPLATE_SUFFIXES: &[&str] = &[".tmpl", ".tpl"];

/// Cache key for a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub format: TemplateFormat,
    pub name: String,
}

impl TemplateKey {
    pub fn new(format: TemplateFormat, name: impl Into<String>) -> Self {
        Self {
            format,
            name: name.into(),
        }
    }
}

/// A parsed template, ready to execute.
///
/// Each compiled template owns its own environment: a clone of the format's
/// partial bundle (if one was preloaded) with this template added to it.
pub struct CompiledTemplate {
    format: TemplateFormat,
    name: String,
    env: Environment<'static>,
}

impl CompiledTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> TemplateFormat {
        self.format
    }

    /// Execute the template against the given data.
    pub fn render<S: Serialize>(&self, data: S) -> TemplateResult<String> {
        let execution_error = |source| TemplateError::Execution {
            name: self.name.clone(),
            source,
        };
        let template = self.env.get_template(&self.name).map_err(execution_error)?;
        template.render(data).map_err(execution_error)
    }
}

/// Create an environment scoped to the helper library.
pub fn new_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    register_functions(&mut env);
    env
}

/// Owns the template catalog and the parsed-template cache.
pub struct TemplateManager {
    source: Arc<dyn TemplateSource>,
    cache: TemplateCache<TemplateKey, Arc<CompiledTemplate>>,
    base_sets: RwLock<HashMap<TemplateFormat, Environment<'static>>>,
}

impl TemplateManager {
    /// Create a manager over the given catalog.
    pub fn new(source: Arc<dyn TemplateSource>, cache: &CacheConfig) -> Self {
        Self {
            source,
            cache: TemplateCache::new(cache.capacity, cache.ttl()),
            base_sets: RwLock::new(HashMap::new()),
        }
    }

    /// Manager over the embedded catalog with default cache settings.
    pub fn embedded() -> Self {
        Self::new(Arc::new(EmbeddedSource::new()), &CacheConfig::default())
    }

    pub fn source(&self) -> &dyn TemplateSource {
        self.source.as_ref()
    }

    /// Parse every partial under `<format>/_common/` into a per-format bundle.
    ///
    /// A format without a common namespace is skipped. A partial that fails
    /// to parse aborts preloading. Returns the number of partials loaded.
    pub fn preload_common_templates(&self) -> TemplateResult<usize> {
        let mut loaded = 0;
        let mut bundles = Vec::new();

        for format in TemplateFormat::all() {
            let dir = format!("{}/{}", format.as_str(), COMMON_NAMESPACE);
            let paths = match self.source.list(&dir) {
                Ok(paths) => paths,
                Err(e) if e.is_not_found() => {
                    debug!("No common templates for {}", format);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let mut env = new_environment();
            for path in paths.iter().filter(|p| is_template_file(p)) {
                let body = self.source.read(path)?;
                let name = relative_name(format, path);
                env.add_template_owned(name.clone(), body)
                    .map_err(|source| TemplateError::Parse { name, source })?;
                loaded += 1;
            }
            bundles.push((format, env));
        }

        // Installing the bundles and clearing the cache happen under one write
        // lock; get_template holds the read lock until its entry is cached.
        {
            let mut base_sets = self.base_sets.write();
            base_sets.extend(bundles);
            self.cache.clear();
        }
        info!("Preloaded {} common templates from {}", loaded, self.source.describe());
        Ok(loaded)
    }

    /// Whether a partial bundle exists for the format.
    pub fn has_common_templates(&self, format: TemplateFormat) -> bool {
        self.base_sets.read().contains_key(&format)
    }

    /// Fetch a parsed template, loading and caching it on a miss.
    pub fn get_template(
        &self,
        format: TemplateFormat,
        name: &str,
    ) -> TemplateResult<Arc<CompiledTemplate>> {
        let key = TemplateKey::new(format, name);
        if let Some(entry) = self.cache.get(&key) {
            debug!("Template cache hit: {}/{}", format, name);
            return Ok(entry.into_value());
        }

        debug!("Template cache miss: {}/{}", format, name);
        let path = format!("{}/{}", format.as_str(), name);
        let body = self.source.read(&path)?;
        let size_hint = body.len();

        let base_sets = self.base_sets.read();
        let mut env = match base_sets.get(&format) {
            Some(base) => base.clone(),
            None => new_environment(),
        };
        env.add_template_owned(name.to_string(), body)
            .map_err(|source| TemplateError::Parse {
                name: name.to_string(),
                source,
            })?;

        let compiled = Arc::new(CompiledTemplate {
            format,
            name: name.to_string(),
            env,
        });
        self.cache.set(key, Arc::clone(&compiled), size_hint);
        drop(base_sets);
        Ok(compiled)
    }

    /// Load the first template, in listing order, whose name matches `pattern`.
    ///
    /// Matching templates that fail to load are skipped.
    pub fn get_template_with_pattern(
        &self,
        format: TemplateFormat,
        pattern: &str,
    ) -> TemplateResult<(Arc<CompiledTemplate>, String)> {
        let regex = Regex::new(pattern).map_err(|source| TemplateError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        for name in self.list_templates(format)? {
            if !regex.is_match(&name) {
                continue;
            }
            match self.get_template(format, &name) {
                Ok(template) => return Ok((template, name)),
                Err(e) => debug!("Skipping {} for pattern '{}': {}", name, pattern, e),
            }
        }

        Err(TemplateError::NotFound(format!(
            "no template matching pattern '{}' for format {}",
            pattern, format
        )))
    }

    /// Template names for a format, relative to the format root.
    ///
    /// The common namespace is excluded.
    pub fn list_templates(&self, format: TemplateFormat) -> TemplateResult<Vec<String>> {
        let common_prefix = format!("{}/", COMMON_NAMESPACE);
        let names = self
            .source
            .list(format.as_str())?
            .iter()
            .filter(|path| is_template_file(path))
            .map(|path| relative_name(format, path))
            .filter(|name| !name.starts_with(&common_prefix))
            .collect();
        Ok(names)
    }

    /// Drop every cached template.
    pub fn refresh_cache(&self) {
        self.cache.clear();
        info!("Template cache refreshed");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn is_template_file(path: &str) -> bool {
    TEMPLATE_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

fn relative_name(format: TemplateFormat, path: &str) -> String {
    let prefix = format!("{}/", format.as_str());
    path.strip_prefix(&prefix).unwrap_or(path).to_string()
}
