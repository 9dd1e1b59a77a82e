//! Kiln CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Binding error
//! - 5: Provisioning error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kiln_config::ConfigError;
use kiln_engine::{EngineError, ErrorKind};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const BINDING_ERROR: u8 = 4;
    pub const PROVISIONING_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "kiln=debug"
    } else if cli.quiet {
        "kiln=warn"
    } else {
        "kiln=info"
    };
    let mut filter = EnvFilter::from_default_env();
    for directive in [level, "warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    // Logs go to stderr so resolved documents can be piped.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args).await,
        Commands::Validate(args) => commands::validate::execute(args).await,
        Commands::Types(args) => commands::types::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            match e.downcast_ref::<EngineError>() {
                Some(engine) => eprintln!("❌ {}: {:#}", engine.kind(), e),
                None => eprintln!("❌ Error: {:#}", e),
            }
            ExitCode::from(exit_code)
        }
    }
}

fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::SpecValidation
        | ErrorKind::ConfigSchema
        | ErrorKind::UnknownComponentType
        | ErrorKind::CyclicDependency => ExitCodes::VALIDATION_FAILURE,
        ErrorKind::CapabilityMissing
        | ErrorKind::UnsupportedAccessLevel
        | ErrorKind::NoBinderStrategy
        | ErrorKind::NotSynthesized => ExitCodes::BINDING_ERROR,
        ErrorKind::Provisioning => ExitCodes::PROVISIONING_ERROR,
        ErrorKind::Other => ExitCodes::GENERAL_ERROR,
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<EngineError>() {
        Some(EngineError::Io(io)) if io.kind() == std::io::ErrorKind::NotFound => {
            return ExitCodes::INVALID_ARGS;
        }
        Some(engine) => return exit_code_for(engine.kind()),
        None => {}
    }
    if e.downcast_ref::<ConfigError>().is_some() {
        return ExitCodes::VALIDATION_FAILURE;
    }
    match e.downcast_ref::<std::io::Error>() {
        Some(io) if io.kind() == std::io::ErrorKind::NotFound => ExitCodes::INVALID_ARGS,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
