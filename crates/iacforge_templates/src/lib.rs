//! # iacforge_templates
//!
//! Template caching, selection and rendering for iacforge.
//!
//! This crate turns a [`ResourceModel`](iacforge_model::ResourceModel) into
//! Terraform HCL or Crossplane YAML. It provides:
//!
//! - A bounded, time-expiring cache of parsed templates
//! - Per-format shared partials under `<format>/_common/`
//! - Direct and pattern-based template selection per resource type
//! - A renderer that wraps resources in optional header and footer templates
//!
//! ## Example
//!
//! ```rust,no_run
//! use iacforge_model::{Resource, ResourceType, TemplateFormat};
//! use iacforge_templates::EngineConfig;
//!
//! let renderer = EngineConfig::default().build_renderer().unwrap();
//! renderer.set_global_context("region", "eu-west-1");
//!
//! let vpc = Resource::new(ResourceType::Vpc, "main")
//!     .with_property("cidr_block", "10.0.0.0/16");
//! let hcl = renderer
//!     .render_resources(TemplateFormat::Terraform, &[vpc])
//!     .unwrap();
//! println!("{hcl}");
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod functions;
pub mod manager;
pub mod output;
pub mod renderer;
pub mod selector;
pub mod source;

pub use cache::{CacheEntry, CacheStats, TemplateCache};
pub use config::{CacheConfig, EngineConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};
pub use error::{TemplateError, TemplateResult};
pub use manager::{CompiledTemplate, TemplateKey, TemplateManager, COMMON_NAMESPACE};
pub use output::{FsWriter, OutputFormatter, OutputWriter, PassthroughFormatter};
pub use renderer::{footer_template_name, header_template_name, TemplateRenderer, SECTION_SEPARATOR};
pub use selector::{generic_template_name, MappingSelector, TemplateSelector};
pub use source::{DirectorySource, EmbeddedSource, MemorySource, TemplateSource};
