//! iacforge CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Template error
//! - 5: IaC error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use iacforge_iac::IacError;
use iacforge_model::ModelError;
use iacforge_templates::TemplateError;

mod commands;
mod config;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const IAC_ERROR: u8 = 5;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = config::AppConfig::load(cli.config.as_deref()).and_then(|config| {
        match cli.command {
            Commands::Render(args) => commands::render::execute(args, &config),
            Commands::Validate(args) => commands::validate::execute(args, &config),
            Commands::Templates(args) => commands::templates::execute(args, &config),
        }
    });

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let crate_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };

    let mut filter = EnvFilter::from_default_env();
    for directive in [format!("iacforge={crate_level}"), "warn".to_string()] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // A second initialisation (e.g. under a test harness) is harmless.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Map an error chain onto an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<IacError>() {
            return match err {
                IacError::ValidationFailed(_) => ExitCodes::VALIDATION_FAILURE,
                IacError::Config(_) => ExitCodes::INVALID_ARGS,
                IacError::Template(_) => ExitCodes::TEMPLATE_ERROR,
                _ => ExitCodes::IAC_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<TemplateError>() {
            return match err {
                TemplateError::UnsupportedFormat(_) | TemplateError::InvalidPattern { .. } => {
                    ExitCodes::INVALID_ARGS
                }
                _ => ExitCodes::TEMPLATE_ERROR,
            };
        }
        if cause.downcast_ref::<ModelError>().is_some() {
            return ExitCodes::INVALID_ARGS;
        }
    }
    ExitCodes::GENERAL_ERROR
}
