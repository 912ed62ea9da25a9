//! Validate command - Validate a rendered Terraform or Crossplane file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use iacforge_iac::ValidationLevel;
use iacforge_model::TemplateFormat;

use crate::config::AppConfig;

#[derive(Args)]
pub struct ValidateArgs {
    /// Format of the file (terraform or crossplane)
    #[arg(short, long)]
    pub format: TemplateFormat,

    /// File to validate
    #[arg(long)]
    pub file: PathBuf,

    /// Validation level (none, basic or strict)
    #[arg(short, long)]
    pub level: Option<ValidationLevel>,

    /// Print the canonically formatted file when available
    #[arg(long)]
    pub show_formatted: bool,
}

pub fn execute(args: ValidateArgs, config: &AppConfig) -> Result<()> {
    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let level = args.level.unwrap_or(config.validation.level);
    info!("Validating {} as {} ({})", args.file.display(), args.format, level);

    let report = config.validation.validator().validate(args.format, &content, level)?;
    println!("{}", report);

    if args.show_formatted {
        if let Some(formatted) = &report.formatted {
            println!("{}", formatted);
        }
    }

    report
        .into_result()
        .with_context(|| format!("{} is not valid", args.file.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(file: PathBuf, format: TemplateFormat) -> ValidateArgs {
        ValidateArgs {
            format,
            file,
            level: Some(ValidationLevel::Strict),
            show_formatted: false,
        }
    }

    #[test]
    fn test_valid_manifest_passes() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("vpc.yaml");
        fs::write(
            &file,
            "apiVersion: ec2.aws.upbound.io/v1beta1\nkind: VPC\nmetadata:\n  name: main\nspec:\n  forProvider:\n    cidrBlock: 10.0.0.0/16\n",
        )
        .unwrap();

        execute(args(file, TemplateFormat::Crossplane), &AppConfig::default()).unwrap();
    }

    #[test]
    fn test_invalid_hcl_fails() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("main.tf");
        fs::write(&file, "resource \"aws_vpc\" {\n").unwrap();

        let err = execute(args(file, TemplateFormat::Terraform), &AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("main.tf is not valid"));
    }

    #[test]
    fn test_missing_file() {
        let temp = tempdir().unwrap();
        let err = execute(
            args(temp.path().join("absent.tf"), TemplateFormat::Terraform),
            &AppConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
