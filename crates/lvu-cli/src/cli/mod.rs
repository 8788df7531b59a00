//! CLI for the LVU poster-to-video engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use lvu_core::config::{self, LvuConfig};
use lvu_core::engine::EngineSettings;
use std::path::PathBuf;

use commands::{run_completions, run_config, run_resolve, run_rewrite, run_simulate};

/// Top-level CLI for LVU.
#[derive(Debug, Parser)]
#[command(name = "lvu")]
#[command(about = "LVU: swap blocked video posters for playable videos", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/lvu/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the video locator for each poster locator.
    Resolve {
        /// Poster image URLs or paths.
        #[arg(required = true)]
        locators: Vec<String>,
        /// Print JSON instead of one line per locator.
        #[arg(long)]
        json: bool,
    },

    /// Rewrite an HTML page: remove overlays and swap posters for videos.
    Rewrite {
        /// HTML file to read ("-" for stdin).
        input: PathBuf,
        /// Write the result here instead of stdout.
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
        /// Print a JSON scan report to stderr.
        #[arg(long)]
        report: bool,
    },

    /// Rewrite a page and play scripted load outcomes against it.
    Simulate {
        /// HTML file to read ("-" for stdin).
        input: PathBuf,
        /// Failed loads per video before it loads.
        #[arg(long, default_value = "2", value_name = "N")]
        failures: u32,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the config path and the effective configuration.
    Config,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Resolve { locators, json } => {
                let settings = EngineSettings::from_config(&cfg)?;
                run_resolve(&settings.resolver, &locators, json)?;
            }
            CliCommand::Rewrite {
                input,
                output,
                report,
            } => {
                let settings = EngineSettings::from_config(&cfg)?;
                run_rewrite(settings, &input, output.as_deref(), report)?;
            }
            CliCommand::Simulate {
                input,
                failures,
                json,
            } => {
                let settings = EngineSettings::from_config(&cfg)?;
                run_simulate(settings, &input, failures, json).await?;
            }
            CliCommand::Config => run_config(cli.config.as_deref(), &cfg)?,
            CliCommand::Completions { shell } => run_completions(shell)?,
        }

        Ok(())
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<LvuConfig> {
    match path {
        Some(p) => config::load_from(p),
        None => config::load_or_init(),
    }
}

#[cfg(test)]
mod tests;
