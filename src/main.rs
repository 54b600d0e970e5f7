// Quire - Asynchronous Report Export Engine
// Copyright (c) 2025 Quire Contributors
// Licensed under the MIT License

use clap::Parser;
use quire::cli::{load_settings, Cli, Commands, EXIT_CONFIG, EXIT_FATAL};
use quire::config::{LoggingConfig, QuireConfig};
use quire::domain::Result;
use quire::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Init and validate-config do not need a loaded configuration
    let settings = match cli.command {
        Commands::Init(_) | Commands::ValidateConfig(_) => None,
        _ => Some(load_settings(&cli.config)),
    };

    let logging_config = match &settings {
        Some(Ok(config)) => config.logging.clone(),
        _ => LoggingConfig::default(),
    };
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| match &settings {
            Some(Ok(config)) => Some(config.application.log_level.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "info".to_string());

    let _guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Quire - Asynchronous Report Export Engine"
    );

    let exit_code = match execute_command(&cli, settings).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    // process::exit skips destructors, so flush file logs first
    drop(_guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(
    cli: &Cli,
    settings: Option<Result<QuireConfig>>,
) -> anyhow::Result<i32> {
    let config = match settings {
        Some(Ok(config)) => Some(config),
        Some(Err(e)) => {
            tracing::error!(error = %e, "Failed to load configuration");
            eprintln!("{e}");
            return Ok(EXIT_CONFIG);
        }
        None => None,
    };

    match (&cli.command, config) {
        (Commands::Export(args), Some(config)) => args.execute(config).await,
        (Commands::Cleanup(args), Some(config)) => args.execute(config).await,
        (Commands::Formats(args), _) => args.execute().await,
        (Commands::ValidateConfig(args), _) => args.execute(&cli.config).await,
        (Commands::Init(args), _) => args.execute().await,
        (command, None) => anyhow::bail!("No configuration loaded for {command:?}"),
    }
}
