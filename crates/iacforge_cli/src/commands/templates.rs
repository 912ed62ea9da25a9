//! Templates command - List the templates available for a format.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use iacforge_model::{Resource, ResourceType, TemplateFormat};
use iacforge_templates::{MappingSelector, TemplateSelector};

use crate::config::AppConfig;

#[derive(Args)]
pub struct TemplatesArgs {
    /// Format to list (terraform or crossplane)
    #[arg(short, long)]
    pub format: TemplateFormat,

    /// Template catalog directory replacing the embedded catalog
    #[arg(short, long)]
    pub templates: Option<PathBuf>,
}

pub fn execute(args: TemplatesArgs, config: &AppConfig) -> Result<()> {
    let mut engine = config.engine.clone();
    if let Some(dir) = args.templates {
        engine.template_dir = Some(dir);
    }
    let manager = engine
        .build_manager()
        .context("Failed to initialise template engine")?;

    let names = manager
        .list_templates(args.format)
        .with_context(|| format!("Failed to list {} templates", args.format))?;

    println!("Templates for {} ({}):", args.format, manager.source().describe());
    for name in &names {
        println!("  {}", name);
    }

    println!();
    println!("Default selection:");
    let selector = MappingSelector::with_defaults();
    for resource_type in ResourceType::all() {
        let probe = Resource::new(resource_type, "probe");
        let name = selector.select_template(args.format, &probe)?;
        let marker = if names.contains(&name) { "" } else { " (missing)" };
        println!("  {:<16} {}{}", resource_type.as_str(), name, marker);
    }
    Ok(())
}
