//! Post-render validation.
//!
//! Terraform output is checked with an HCL parser and, in strict mode, with
//! `terraform init` and `terraform validate` in a scratch directory.
//! Crossplane output is checked as multi-document YAML and, in strict mode,
//! every managed resource document must carry `kind`, `metadata` and `spec`.

use std::fmt;
use std::fs;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use iacforge_model::TemplateFormat;

use crate::error::{IacError, IacResult};
use crate::report::{CheckStatus, ValidationReport};
use crate::terraform::TerraformRunner;

/// API group suffixes that mark a document as a Crossplane managed resource.
pub const MANAGED_API_SUFFIXES: &[&str] = &[".upbound.io", ".crossplane.io"];

const REQUIRED_FIELDS: &[&str] = &["kind", "metadata", "spec"];

/// How thoroughly rendered output is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// No checks; always passes.
    None,
    /// Syntax only.
    #[default]
    Basic,
    /// Syntax plus structural or external tool checks.
    Strict,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::None => "none",
            ValidationLevel::Basic => "basic",
            ValidationLevel::Strict => "strict",
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ValidationLevel {
    type Err = IacError;

    fn from_str(s: &str) -> IacResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(ValidationLevel::None),
            "basic" => Ok(ValidationLevel::Basic),
            "strict" => Ok(ValidationLevel::Strict),
            other => Err(IacError::Config(format!(
                "unknown validation level '{}' (expected none, basic or strict)",
                other
            ))),
        }
    }
}

/// A format-specific validator.
pub trait Validator: Send + Sync {
    fn format(&self) -> TemplateFormat;

    /// Check `content` at the given level. Never modifies the input.
    fn validate(&self, content: &str, level: ValidationLevel) -> IacResult<ValidationReport>;
}

/// Validator for Terraform HCL.
#[derive(Debug, Clone, Default)]
pub struct HclValidator {
    runner: TerraformRunner,
}

impl HclValidator {
    pub fn new(runner: TerraformRunner) -> Self {
        Self { runner }
    }

    fn run_terraform(&self, content: &str, report: &mut ValidationReport) -> IacResult<()> {
        let sandbox = tempfile::Builder::new().prefix("iacforge-tf-").tempdir()?;
        fs::write(sandbox.path().join("main.tf"), content)?;

        let init = match self.runner.init(sandbox.path()) {
            Ok(result) => result,
            Err(IacError::ToolNotAvailable(reason)) => {
                warn!("Skipping terraform checks: {}", reason);
                report.add_check("terraform", CheckStatus::Skipped, reason);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if !init.success {
            report.add_check("init", CheckStatus::Failed, init.output);
            return Ok(());
        }
        report.add_check("init", CheckStatus::Passed, "Initialization successful");

        let validate = self.runner.validate(sandbox.path())?;
        let status = if validate.success {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        };
        report.add_check("validate", status, validate.output);
        Ok(())
    }
}

impl Validator for HclValidator {
    fn format(&self) -> TemplateFormat {
        TemplateFormat::Terraform
    }

    fn validate(&self, content: &str, level: ValidationLevel) -> IacResult<ValidationReport> {
        let mut report = ValidationReport::new(TemplateFormat::Terraform, level);
        if level == ValidationLevel::None {
            return Ok(report);
        }

        match hcl::parse(content) {
            Ok(body) => {
                report.add_check("syntax", CheckStatus::Passed, "HCL parsed successfully");
                match hcl::format::to_string(&body) {
                    Ok(formatted) => report.formatted = Some(formatted),
                    Err(e) => debug!("Could not format HCL: {}", e),
                }
            }
            Err(e) => {
                report.add_check("syntax", CheckStatus::Failed, e.to_string());
                return Ok(report);
            }
        }

        if level == ValidationLevel::Strict {
            self.run_terraform(content, &mut report)?;
        }
        Ok(report)
    }
}

/// Validator for Crossplane YAML manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossplaneValidator;

impl CrossplaneValidator {
    pub fn new() -> Self {
        Self
    }
}

/// Parse every non-empty document of a YAML stream.
pub fn parse_documents(content: &str) -> IacResult<Vec<serde_yaml::Value>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document)?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

fn is_managed(document: &serde_yaml::Value) -> bool {
    let Some(api_version) = document.get("apiVersion").and_then(|v| v.as_str()) else {
        return false;
    };
    let Some((group, _version)) = api_version.split_once('/') else {
        return false;
    };
    MANAGED_API_SUFFIXES.iter().any(|suffix| group.ends_with(suffix))
}

fn missing_fields(document: &serde_yaml::Value) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| document.get(field).map_or(true, |v| v.is_null()))
        .collect()
}

impl Validator for CrossplaneValidator {
    fn format(&self) -> TemplateFormat {
        TemplateFormat::Crossplane
    }

    fn validate(&self, content: &str, level: ValidationLevel) -> IacResult<ValidationReport> {
        let mut report = ValidationReport::new(TemplateFormat::Crossplane, level);
        if level == ValidationLevel::None {
            return Ok(report);
        }

        let documents = match parse_documents(content) {
            Ok(documents) => documents,
            Err(e) => {
                report.add_check("syntax", CheckStatus::Failed, e.to_string());
                return Ok(report);
            }
        };
        report.add_check(
            "syntax",
            CheckStatus::Passed,
            format!("{} YAML documents parsed", documents.len()),
        );

        if level == ValidationLevel::Strict {
            let mut checked = 0;
            let mut problems = Vec::new();
            for (index, document) in documents.iter().enumerate() {
                if !is_managed(document) {
                    continue;
                }
                checked += 1;
                let missing = missing_fields(document);
                if !missing.is_empty() {
                    problems.push(format!(
                        "document {} is missing {}",
                        index + 1,
                        missing.join(", ")
                    ));
                }
            }

            if problems.is_empty() {
                report.add_check(
                    "structure",
                    CheckStatus::Passed,
                    format!("{} managed resources checked", checked),
                );
            } else {
                report.add_check("structure", CheckStatus::Failed, problems.join("; "));
            }
        }
        Ok(report)
    }
}

/// Dispatches validation to the validator for each format.
pub struct IacValidator {
    validators: Vec<Box<dyn Validator>>,
}

impl Default for IacValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl IacValidator {
    pub fn new() -> Self {
        Self::with_terraform_runner(TerraformRunner::new())
    }

    /// Use a specific runner for strict Terraform checks.
    pub fn with_terraform_runner(runner: TerraformRunner) -> Self {
        Self {
            validators: vec![
                Box::new(HclValidator::new(runner)),
                Box::new(CrossplaneValidator::new()),
            ],
        }
    }

    pub fn validate(
        &self,
        format: TemplateFormat,
        content: &str,
        level: ValidationLevel,
    ) -> IacResult<ValidationReport> {
        info!("Validating {} output ({})", format, level);
        let validator = self
            .validators
            .iter()
            .find(|v| v.format() == format)
            .ok_or_else(|| IacError::Config(format!("no validator for {}", format)))?;
        validator.validate(content, level)
    }
}
