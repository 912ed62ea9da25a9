//! Engine configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::info;

use crate::error::TemplateResult;
use crate::manager::TemplateManager;
use crate::renderer::TemplateRenderer;
use crate::selector::MappingSelector;
use crate::source::{DirectorySource, EmbeddedSource, TemplateSource};

/// Default maximum number of cached templates.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Default cache entry lifetime (30 minutes).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30 * 60;

/// Template cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of parsed templates kept.
    pub capacity: usize,
    /// Age after which a cached template is reparsed. Read from `ttl_secs`,
    /// which may be fractional.
    #[serde(rename = "ttl_secs", with = "seconds")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

mod seconds {
    use super::*;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if ttl.subsec_nanos() == 0 {
            serializer.serialize_u64(ttl.as_secs())
        } else {
            serializer.serialize_f64(ttl.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Configuration used to construct a rendering engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    /// On-disk catalog replacing the embedded one.
    pub template_dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// The catalog this configuration points at.
    pub fn source(&self) -> Arc<dyn TemplateSource> {
        match &self.template_dir {
            Some(dir) => Arc::new(DirectorySource::new(dir.clone())),
            None => Arc::new(EmbeddedSource::new()),
        }
    }

    /// Build a manager and preload its common partials.
    pub fn build_manager(&self) -> TemplateResult<TemplateManager> {
        let manager = TemplateManager::new(self.source(), &self.cache);
        manager.preload_common_templates()?;
        Ok(manager)
    }

    /// Build a renderer wired with the default selector mappings.
    pub fn build_renderer(&self) -> TemplateResult<TemplateRenderer> {
        let manager = self.build_manager()?;
        info!(
            "Template engine ready (cache capacity {}, ttl {:?})",
            self.cache.capacity, self.cache.ttl
        );
        Ok(TemplateRenderer::new(
            Arc::new(manager),
            Arc::new(MappingSelector::with_defaults()),
        ))
    }
}
