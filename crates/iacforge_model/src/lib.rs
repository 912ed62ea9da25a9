//! # iacforge_model
//!
//! The infrastructure resource model consumed by the iacforge template engine.
//!
//! A [`ResourceModel`] is an ordered list of [`Resource`] values, each with a
//! [`ResourceType`], a unique name, ordered properties and the names of the
//! resources it depends on. Models are usually read from YAML:
//!
//! ```rust,no_run
//! use iacforge_model::{ModelReader, TemplateFormat};
//!
//! let model = ModelReader::from_path("infra.yaml").unwrap();
//! for resource in &model.resources {
//!     println!("{} ({})", resource.name, resource.resource_type);
//! }
//!
//! let format: TemplateFormat = "terraform".parse().unwrap();
//! assert_eq!(format.file_extension(), "tf");
//! ```

pub mod error;
pub mod models;
pub mod reader;

pub use error::{ModelError, ModelResult};
pub use models::{Property, Resource, ResourceModel, ResourceType, TemplateFormat};
pub use reader::ModelReader;
