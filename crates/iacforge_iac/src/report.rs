//! Validation reports.

use std::fmt;

use serde::Serialize;

use iacforge_model::TemplateFormat;

use crate::error::{IacError, IacResult};
use crate::validator::ValidationLevel;

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed,
    /// The check could not run, e.g. the external tool is not installed.
    Skipped,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckStatus::Passed => "passed",
            CheckStatus::Failed => "failed",
            CheckStatus::Skipped => "skipped",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationCheck {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

/// Validation report for one piece of rendered output.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub format: TemplateFormat,
    pub level: ValidationLevel,
    pub checks: Vec<ValidationCheck>,
    /// Canonically formatted copy of the input, for display only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

impl ValidationReport {
    pub fn new(format: TemplateFormat, level: ValidationLevel) -> Self {
        Self {
            format,
            level,
            checks: Vec::new(),
            formatted: None,
        }
    }

    pub fn add_check(&mut self, name: &str, status: CheckStatus, message: impl Into<String>) {
        self.checks.push(ValidationCheck {
            name: name.to_string(),
            status,
            message: message.into(),
        });
    }

    /// True when no check failed. Skipped checks do not count as failures.
    pub fn passed(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Failed)
    }

    /// True when at least one check ran and none was skipped or failed.
    pub fn fully_checked(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|c| c.status == CheckStatus::Passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationCheck> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Failed)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ValidationCheck> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Skipped)
    }

    /// Convert a failing report into `IacError::ValidationFailed`.
    pub fn into_result(self) -> IacResult<Self> {
        if self.passed() {
            return Ok(self);
        }
        let detail = self
            .failures()
            .map(|c| format!("{}: {}", c.name, c.message))
            .collect::<Vec<_>>()
            .join("\n");
        Err(IacError::ValidationFailed(detail))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} validation ({})", self.format, self.level)?;
        if self.checks.is_empty() {
            return writeln!(f, "  no checks run");
        }
        for check in &self.checks {
            writeln!(f, "  [{}] {}: {}", check.status, check.name, check.message.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_is_not_failure() {
        let mut report = ValidationReport::new(TemplateFormat::Terraform, ValidationLevel::Strict);
        report.add_check("syntax", CheckStatus::Passed, "ok");
        report.add_check("terraform", CheckStatus::Skipped, "terraform not installed");

        assert!(report.passed());
        assert!(!report.fully_checked());
        assert_eq!(report.skipped().count(), 1);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_failure_converts_to_error() {
        let mut report = ValidationReport::new(TemplateFormat::Crossplane, ValidationLevel::Basic);
        report.add_check("syntax", CheckStatus::Failed, "did not find expected key");

        assert!(!report.passed());
        let err = report.into_result().unwrap_err();
        assert!(matches!(err, IacError::ValidationFailed(msg) if msg.contains("syntax: did not find")));
    }

    #[test]
    fn test_empty_report_passes_but_is_not_checked() {
        let report = ValidationReport::new(TemplateFormat::Terraform, ValidationLevel::None);
        assert!(report.passed());
        assert!(!report.fully_checked());
        assert!(report.to_string().contains("no checks run"));
    }
}
