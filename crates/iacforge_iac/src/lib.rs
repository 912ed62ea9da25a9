//! # iacforge_iac
//!
//! Validation and canonical formatting of generated Infrastructure as Code.
//!
//! Rendered output is checked per format at one of three levels:
//!
//! - `none`: no checks
//! - `basic`: HCL or YAML syntax
//! - `strict`: syntax plus `terraform init`/`validate` in a scratch
//!   directory (Terraform) or required fields on every managed resource
//!   document (Crossplane)
//!
//! A missing `terraform` binary turns the strict Terraform check into a
//! skipped check rather than a failure.
//!
//! ## Example
//!
//! ```rust,no_run
//! use iacforge_iac::{IacValidator, ValidationLevel};
//! use iacforge_model::TemplateFormat;
//!
//! let validator = IacValidator::new();
//! let report = validator
//!     .validate(
//!         TemplateFormat::Terraform,
//!         r#"resource "aws_vpc" "main" { cidr_block = "10.0.0.0/16" }"#,
//!         ValidationLevel::Strict,
//!     )
//!     .unwrap();
//! println!("{report}");
//! ```

pub mod error;
pub mod formatter;
pub mod report;
pub mod terraform;
pub mod validator;

pub use error::{IacError, IacResult};
pub use formatter::CanonicalFormatter;
pub use report::{CheckStatus, ValidationCheck, ValidationReport};
pub use terraform::{TerraformResult, TerraformRunner};
pub use validator::{
    CrossplaneValidator, HclValidator, IacValidator, ValidationLevel, Validator,
    MANAGED_API_SUFFIXES,
};
