//! Command-line entry point: `range-fetch <server_ip> <port> <filename>`

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;
use range_fetch::{Config, HttpDownloader};
use tracing::metadata::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "range-fetch")]
#[command(version)]
#[command(about = "Download a file over HTTP/1.1, in parallel when the server supports ranges")]
struct Cli {
    /// Server IP address or hostname
    server_ip: String,

    /// Server port
    port: u16,

    /// Resource to fetch; also its path under the download directory
    filename: String,

    /// JSON configuration file (server and port arguments take precedence)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base directory for downloaded files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Idle receive timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    init_tracing();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(1);
        }
    };

    let downloader = match HttpDownloader::new(config) {
        Ok(downloader) => downloader,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(1);
        }
    };

    match downloader.download(&cli.filename).await {
        Ok(report) => {
            tracing::info!(
                path = %report.path.display(),
                bytes = report.bytes_written,
                strategy = ?report.strategy,
                workers = report.worker_count,
                "Download complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Error downloading file");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_config(cli: &Cli) -> range_fetch::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.server.host = cli.server_ip.clone();
    config.server.port = cli.port;
    if let Some(dir) = &cli.output_dir {
        config.download.download_dir = dir.clone();
    }
    if let Some(ms) = cli.timeout_ms {
        config.transport.receive_timeout = Duration::from_millis(ms);
    }
    Ok(config)
}
