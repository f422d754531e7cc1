//! CLI for clipfetch.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use clipfetch_core::config;

use commands::{run_check, run_completions, run_fetch, run_install, run_rules, FetchArgs};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "clipfetch")]
#[command(about = "clipfetch: fetch one social-media video at a time through yt-dlp", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Report whether a URL belongs to a supported platform.
    Check {
        /// URL to test.
        url: String,
    },

    /// Download a video into the temporary file and print the JSON result.
    Fetch {
        /// Video URL.
        url: String,
        /// Give up after waiting this many seconds for the download slot.
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Refuse URLs that match no supported-platform rule.
        #[arg(long)]
        require_supported: bool,
    },

    /// Make sure the yt-dlp binary is installed and print its path.
    Install,

    /// List the active URL rules.
    Rules,

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn load_config() -> Result<config::ClipfetchConfig> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Check { url } => run_check(&load_config()?, &url)?,
            CliCommand::Fetch {
                url,
                timeout_secs,
                require_supported,
            } => {
                let args = FetchArgs {
                    url,
                    timeout_secs,
                    require_supported,
                };
                run_fetch(&load_config()?, &args).await?
            }
            CliCommand::Install => run_install(&load_config()?).await?,
            CliCommand::Rules => run_rules(&load_config()?)?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
