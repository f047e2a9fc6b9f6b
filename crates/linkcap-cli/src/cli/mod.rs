//! CLI for linkcap.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use linkcap_core::config;
use std::path::PathBuf;

use commands::{run_analyze, run_export, run_extract, run_import_har, run_summary, run_verify};

/// Default result file written by `extract` and read by `verify`.
pub const DEFAULT_LINKS_FILE: &str = "extracted_download_links.json";
pub const DEFAULT_VERIFIED_FILE: &str = "verified_download_links.json";

/// Top-level CLI for linkcap.
#[derive(Debug, Parser)]
#[command(name = "linkcap")]
#[command(about = "linkcap: capture API traffic and mine it for signed download links", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Replay a HAR file through the capture engine into a new session log.
    ImportHar {
        /// Path to the HAR file.
        path: PathBuf,
        /// Session directory (default: from config).
        #[arg(long, value_name = "DIR")]
        session_dir: Option<PathBuf>,
    },

    /// Extract download links from every session log.
    Extract {
        #[arg(long, value_name = "DIR")]
        session_dir: Option<PathBuf>,
        /// Result file (overwritten).
        #[arg(long, short, value_name = "FILE", default_value = DEFAULT_LINKS_FILE)]
        output: PathBuf,
    },

    /// Probe extracted links and re-mint expired ones.
    Verify {
        /// Result file from `extract`.
        #[arg(long, value_name = "FILE", default_value = DEFAULT_LINKS_FILE)]
        links: PathBuf,
        #[arg(long, short, value_name = "FILE", default_value = DEFAULT_VERIFIED_FILE)]
        output: PathBuf,
        /// Do not contact the minting endpoint for expired links.
        #[arg(long)]
        no_refresh: bool,
    },

    /// Break a signed download URL into its parts.
    Analyze {
        url: String,
        /// Print the decomposition as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Statistics and search over a session log.
    Summary {
        /// Log file (default: newest session log).
        #[arg(long, value_name = "FILE")]
        log: Option<PathBuf>,
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        method: Option<String>,
        #[arg(long, value_name = "CODE")]
        status: Option<u16>,
    },

    /// Write a session log as a single JSON array.
    Export { log: PathBuf, output: PathBuf },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::ImportHar { path, session_dir } => {
                let dir = match session_dir {
                    Some(d) => d,
                    None => cfg.session_dir()?,
                };
                run_import_har(&cfg, &path, &dir)?;
            }
            CliCommand::Extract {
                session_dir,
                output,
            } => {
                let dir = match session_dir {
                    Some(d) => d,
                    None => cfg.session_dir()?,
                };
                run_extract(&cfg, &dir, &output)?;
            }
            CliCommand::Verify {
                links,
                output,
                no_refresh,
            } => run_verify(&cfg, &links, &output, no_refresh).await?,
            CliCommand::Analyze { url, json } => run_analyze(&cfg, &url, json)?,
            CliCommand::Summary {
                log,
                keyword,
                method,
                status,
            } => {
                let filter = linkcap_core::summary::RecordFilter {
                    keyword,
                    method,
                    status_code: status,
                };
                run_summary(&cfg, log.as_deref(), &filter)?;
            }
            CliCommand::Export { log, output } => run_export(&log, &output)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
