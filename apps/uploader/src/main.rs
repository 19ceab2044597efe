//! ECG upload relay command-line entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ecgupload", version)]
#[command(about = "Upload a batch of study files to the SFTP landing area")]
pub struct Cli {
    /// Data category, e.g. dados_anel or visita_01_redcap
    #[arg(long)]
    pub category: String,

    /// Identity of the submitter, recorded in every sidecar
    #[arg(long)]
    pub user: String,

    /// Role of the submitter
    #[arg(long, default_value = "user")]
    pub role: String,

    /// Stage into this local directory instead of the SFTP server
    #[arg(long)]
    pub local_root: Option<PathBuf>,

    /// Configuration file (defaults to ~/.config/ecgupload/uploader.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Files to upload, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the audit records.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting ecgupload");

    let config = config::Config::load(cli.config.as_deref(), cli.local_root.is_some())?;

    let rt = tokio::runtime::Runtime::new()?;
    let records = rt.block_on(app::run(&cli, config))?;

    let mut stdout = std::io::stdout().lock();
    app::write_records(&mut stdout, &records)?;
    Ok(())
}
