use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use signer_cli::DEFAULT_INPUTS;
use signer_cli::config::{AppConfig, CliOverrides, ConfigManager};
use signer_cli::output::{OutputFormat, RunSummary, format_stats, format_summary};
use signer_core::{Pipeline, SignerProvider};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "signer")]
#[command(author, version, about = "Signer - Concurrent staged hashing pipeline", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Use this configuration file instead of the default location
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign a list of integers and print the combined digest
    Run {
        /// Integers to sign (defaults to 0 1 2 3 4 5)
        #[arg(allow_negative_numbers = true)]
        values: Vec<i64>,

        /// Unread values each stream holds before its producer waits
        #[arg(long)]
        capacity: Option<usize>,

        /// Maximum in-flight workers per stage
        #[arg(short, long)]
        workers: Option<usize>,

        /// Make the hash provider as slow as a rate-limited service
        #[arg(long)]
        simulate_delays: bool,

        /// Output format (defaults to output.default_format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Print the configuration file path
    Path,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g., signer.stream_capacity)
        key: String,
    },

    /// List all configuration values
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on debug flag
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("signer_core", log::LevelFilter::Debug)
            .filter_module("signer_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };

    match cli.command {
        Commands::Run {
            values,
            capacity,
            workers,
            simulate_delays,
            format,
        } => {
            let mut config = manager.load()?;
            config.apply_cli_overrides(&CliOverrides {
                capacity,
                workers,
                simulate_delays,
            });
            run_command(config, values, format).await?;
        }
        Commands::Config { command } => {
            config_command(&manager, command)?;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

async fn run_command(
    config: AppConfig,
    values: Vec<i64>,
    format: Option<OutputFormat>,
) -> Result<()> {
    config
        .signer
        .validate()
        .context("Invalid command line settings")?;

    let format = match format {
        Some(format) => format,
        None => OutputFormat::from_string(&config.output.default_format)?,
    };
    let inputs = if values.is_empty() {
        DEFAULT_INPUTS.to_vec()
    } else {
        values
    };

    log::debug!("Signing {} value(s) with {:?}", inputs.len(), config.signer);

    let provider = Arc::new(SignerProvider::from_config(&config.signer));
    let pipeline = Pipeline::signer(&config.signer, provider.clone())
        .context("Failed to build pipeline")?;

    let outcome = pipeline
        .run(inputs.iter().copied())
        .await
        .context("Pipeline run failed")?;

    let summary = RunSummary::new(inputs, &outcome, provider.stats())?;
    println!("{}", format_summary(&summary, format)?);

    if format == OutputFormat::Text {
        eprintln!("{}", format_stats(&summary, config.output.color_enabled));
    }

    Ok(())
}

fn config_command(manager: &ConfigManager, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            print!("{}", manager.render()?);
        }
        ConfigCommand::Path => {
            println!("{}", manager.get_config_path().display());
        }
        ConfigCommand::Get { key } => match manager.get(&key) {
            Ok(value) => {
                println!("{value}");
            }
            Err(e) => {
                eprintln!("{}", format!("Error: {e}").red());
                std::process::exit(1);
            }
        },
        ConfigCommand::List => {
            let items = manager.list()?;
            eprintln!("{}", "Configuration:".bold().blue());
            eprintln!("Config file: {}", manager.get_config_path().display());
            eprintln!();

            let mut current_section = "";
            for (key, value) in &items {
                let (section, name) = key.split_once('.').unwrap_or(("general", key.as_str()));
                if section != current_section {
                    if !current_section.is_empty() {
                        eprintln!();
                    }
                    eprintln!("[{}]", section.yellow());
                    current_section = section;
                }
                eprintln!("  {} = {}", name.cyan(), value);
            }
        }
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
