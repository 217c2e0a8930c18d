use clap::{Parser, Subcommand, ValueEnum};
use ticket_sheets::config::AppConfig;
use ticket_sheets::fetch::{Backend, Fetcher};
use ticket_sheets::server::{self, AppState, SheetPipeline};
use ticket_sheets::sheets::SheetsClient;
use ticket_sheets::{ExtractionMode, Pipeline, PreviewRequest};

#[derive(Parser)]
#[command(name = "ticket-sheets", about = "Publish ticket listings from a web page to Google Sheets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve,
    /// Extract a page and print the rows as JSON (nothing is written)
    Preview {
        /// Page to fetch
        #[arg(long)]
        url: String,
        /// Scope selector, e.g. "section#tickets"
        #[arg(long)]
        scope: String,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Sections,
    Headings,
}

impl From<ModeArg> for ExtractionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sections => ExtractionMode::Sections,
            ModeArg::Headings => ExtractionMode::Headings,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Http,
    Chrome,
}

impl From<BackendArg> for Backend {
    fn from(backend: BackendArg) -> Self {
        match backend {
            BackendArg::Http => Backend::Http,
            BackendArg::Chrome => Backend::Chrome,
        }
    }
}

fn build_pipeline(config: &AppConfig) -> ticket_sheets::Result<SheetPipeline> {
    Ok(Pipeline::new(
        Fetcher::from_config(&config.fetch)?,
        SheetsClient::new(&config.sheets)?,
        config.selectors.clone(),
        config.style.clone(),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for preview output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load()?;

    match cli.command {
        Commands::Serve => {
            config.require_sheets()?;
            let pipeline = build_pipeline(&config)?;
            tracing::info!(backend = ?config.fetch.backend, "starting ticket-sheets server");
            server::serve(&config.server.addr(), AppState::new(pipeline)).await?;
        }
        Commands::Preview {
            url,
            scope,
            mode,
            backend,
        } => {
            if let Some(backend) = backend {
                config.fetch.backend = backend.into();
            }
            let pipeline = build_pipeline(&config)?;
            let preview = pipeline
                .preview(PreviewRequest {
                    link: Some(url),
                    content: Some(scope),
                    mode: mode.map(Into::into),
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
    }

    Ok(())
}
