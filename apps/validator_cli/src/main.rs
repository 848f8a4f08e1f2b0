use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{download::download_report, FetchState, HttpValidationApi, ValidationApi};
use shared::domain::{Mode, QueryParams};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod page;
mod view;

use config::{load_settings, normalize_api_base, DEFAULT_CONFIG_PATH};
use page::ResultPage;

#[derive(Parser, Debug)]
#[command(name = "idea-validator", about = "Client for the startup idea validation API")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    /// Overrides the API base URL from config and environment.
    #[arg(long)]
    api_base: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the results page for an idea.
    Result {
        /// Full page address, e.g. `/result?idea=...&mode=deep`.
        #[arg(long, conflicts_with_all = ["idea", "mode"])]
        address: Option<String>,
        #[arg(long)]
        idea: Option<String>,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Print the first settled state and exit instead of waiting for commands.
        #[arg(long)]
        once: bool,
    },
    /// Download the generated pitch deck report.
    Download {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the origin of the embedded external application.
    EmbedOrigin,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Fast,
    Deep,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Fast => Mode::Fast,
            ModeArg::Deep => Mode::Deep,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(api_base) = cli.api_base {
        settings.api_base = normalize_api_base(&api_base);
    }
    info!(api_base = %settings.api_base, "loaded settings");

    let api: Arc<dyn ValidationApi> = Arc::new(HttpValidationApi::new(settings.api_base.clone()));

    match cli.command {
        Command::Result {
            address,
            idea,
            mode,
            once,
        } => {
            let address = address.unwrap_or_else(|| {
                QueryParams::new(idea.unwrap_or_default(), mode.map(Mode::from).unwrap_or_default())
                    .to_address()
            });
            let page = ResultPage::open(address, api, settings.download_dir)
                .context("failed to open results page")?;

            if once {
                return Ok(match page.run_once().await? {
                    FetchState::Success(_) => ExitCode::SUCCESS,
                    _ => ExitCode::FAILURE,
                });
            }
            page.run_interactive().await?;
        }
        Command::Download { out } => {
            let dir = out.unwrap_or(settings.download_dir);
            match download_report(api.as_ref(), &dir).await {
                Ok(path) => println!("📥 Saved report to {}", path.display()),
                Err(err) => {
                    println!("ALERT: {}", err.alert_message());
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::EmbedOrigin => {
            println!("{}", settings.embed_origin);
        }
    }

    Ok(ExitCode::SUCCESS)
}
