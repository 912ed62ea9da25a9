//! Render command - Render a resource model into Terraform or Crossplane.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use iacforge_iac::{CanonicalFormatter, IacError, ValidationLevel};
use iacforge_model::{ModelReader, TemplateFormat};
use iacforge_templates::{FsWriter, OutputFormatter, OutputWriter};

use crate::config::AppConfig;

#[derive(Args)]
pub struct RenderArgs {
    /// Resource model file (.yaml, .yml or .json)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Output format (terraform or crossplane)
    #[arg(short, long)]
    pub format: TemplateFormat,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Validation level (none, basic or strict)
    #[arg(long)]
    pub validate: Option<ValidationLevel>,

    /// Template catalog directory replacing the embedded catalog
    #[arg(short, long)]
    pub templates: Option<PathBuf>,

    /// Global template variable, e.g. --set region=eu-west-1
    #[arg(short, long, value_parser = parse_key_value)]
    pub set: Vec<(String, serde_json::Value)>,
}

/// Parse `key=value`. The value is read as JSON when possible, else as a string.
pub fn parse_key_value(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn execute(args: RenderArgs, config: &AppConfig) -> Result<()> {
    let model = ModelReader::from_path(&args.model)
        .with_context(|| format!("Failed to read model {}", args.model.display()))?;
    info!("Rendering {} resources as {}", model.len(), args.format);

    let mut engine = config.engine.clone();
    if let Some(dir) = args.templates {
        engine.template_dir = Some(dir);
    }
    let renderer = engine
        .build_renderer()
        .context("Failed to initialise template engine")?;
    for (key, value) in args.set {
        renderer.set_global_context(key, value);
    }

    let rendered = renderer
        .render_resources(args.format, &model.resources)
        .context("Failed to render model")?;
    let output = CanonicalFormatter::new().format(args.format, &rendered);

    let level = args.validate.unwrap_or(config.validation.level);
    let report = config.validation.validator().validate(args.format, &output, level)?;
    eprint!("{}", report);

    match &args.output {
        Some(path) => {
            FsWriter
                .write(path, output.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", output),
    }

    report
        .into_result()
        .map(|_| ())
        .map_err(|e: IacError| anyhow::Error::new(e).context("Rendered output is not valid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("region=eu-west-1").unwrap(),
            ("region".to_string(), serde_json::json!("eu-west-1"))
        );
        assert_eq!(
            parse_key_value("replicas=3").unwrap(),
            ("replicas".to_string(), serde_json::json!(3))
        );
        assert_eq!(
            parse_key_value("tags={\"Team\":\"net\"}").unwrap().1,
            serde_json::json!({"Team": "net"})
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_render_model_to_file() {
        let temp = tempdir().unwrap();
        let model = temp.path().join("infra.yaml");
        fs::write(
            &model,
            "resources:\n  - type: VPC\n    name: main-vpc\n    properties:\n      - name: cidr_block\n        value: 10.0.0.0/16\n",
        )
        .unwrap();
        let output = temp.path().join("out/main.tf");

        let args = RenderArgs {
            model,
            format: TemplateFormat::Terraform,
            output: Some(output.clone()),
            validate: Some(ValidationLevel::Basic),
            templates: None,
            set: vec![("region".to_string(), serde_json::json!("eu-central-1"))],
        };
        execute(args, &AppConfig::default()).unwrap();

        let written = fs::read_to_string(output).unwrap();
        assert!(written.contains("resource \"aws_vpc\" \"main-vpc\""));
        assert!(written.contains("eu-central-1"));
    }

    #[test]
    fn test_invalid_output_still_written_but_fails() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("catalog/terraform")).unwrap();
        fs::write(temp.path().join("catalog/terraform/vpc.tmpl"), "resource {{ Name }} {").unwrap();
        let model = temp.path().join("infra.json");
        fs::write(&model, r#"{"resources":[{"type":"VPC","name":"a"}]}"#).unwrap();
        let output = temp.path().join("main.tf");

        let args = RenderArgs {
            model,
            format: TemplateFormat::Terraform,
            output: Some(output.clone()),
            validate: None,
            templates: Some(temp.path().join("catalog")),
            set: Vec::new(),
        };
        let err = execute(args, &AppConfig::default()).unwrap_err();

        assert!(err.to_string().contains("not valid"));
        assert_eq!(fs::read_to_string(output).unwrap(), "resource a {\n");
    }
}
