//! CLI command definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod render;
pub mod templates;
pub mod validate;

/// iacforge - render infrastructure models into Terraform or Crossplane
#[derive(Parser)]
#[command(name = "iacforge")]
#[command(version, about = "Render infrastructure models into Terraform or Crossplane")]
#[command(long_about = r#"
iacforge renders a resource model (YAML or JSON) into Terraform HCL or
Crossplane YAML using a cached template catalog, then validates the result.

COMMANDS:
  render      → Render a model and validate the output
  validate    → Validate an existing Terraform or Crossplane file
  templates   → List the templates available for a format

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Template error
  5 - IaC error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./iacforge.toml when present)
    #[arg(short, long, global = true, env = "IACFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a resource model
    Render(render::RenderArgs),

    /// Validate a rendered file
    Validate(validate::ValidateArgs),

    /// List available templates
    Templates(templates::TemplatesArgs),
}
