//! Registry document fetcher CLI
//!
//! Searches the registry for a business name and downloads every PDF filing
//! linked from the matching businesses' detail pages.

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use doc_fetcher::{
    error::Result,
    models::{FetchResult, ScraperConfiguration},
    pipeline::DocumentFetcher,
};

/// Exit status used when the run is interrupted with Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

/// Fetch business documents from the Secretary of State registry
#[derive(Parser, Debug)]
#[command(
    name = "doc-fetcher",
    version,
    about = "Fetch business documents from the Secretary of State registry",
    after_help = "Examples:\n  doc-fetcher \"Acme Corporation\"\n  doc-fetcher \"Tech Solutions\" --output ./my_docs\n  doc-fetcher \"Example LLC\" --delay 2.5"
)]
struct Cli {
    /// Business name or partial name to search
    business_query: String,

    /// Directory to save downloaded documents (default: ./fetched_documents)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Delay between requests in seconds (default: 1.5)
    #[arg(short, long)]
    delay: Option<f64>,

    /// Per-request timeout in seconds (default: 30)
    #[arg(long)]
    timeout: Option<u64>,

    /// Retries for transient failures (default: 3)
    #[arg(long)]
    retries: Option<u32>,

    /// TOML file with fetcher settings; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the result summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn configuration(&self) -> Result<ScraperConfiguration> {
        let mut config = match &self.config {
            Some(path) => ScraperConfiguration::load(path)?,
            None => ScraperConfiguration::default(),
        };

        if let Some(output) = &self.output {
            config.storage_directory = output.clone();
        }
        if let Some(delay) = self.delay {
            config.request_delay_seconds = delay;
        }
        if let Some(timeout) = self.timeout {
            config.connection_timeout = timeout;
        }
        if let Some(retries) = self.retries {
            config.max_retry_attempts = retries;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Print the human-readable results banner.
fn print_report(result: &FetchResult) {
    println!();
    println!("{}", "═".repeat(60));
    println!("  DOCUMENT FETCH RESULTS");
    println!("{}", "═".repeat(60));
    println!("Search Query:         {}", result.search_query);
    println!("Businesses Found:     {}", result.businesses_found);
    println!("Documents Downloaded: {}", result.documents_downloaded);

    if !result.downloaded_files.is_empty() {
        println!();
        println!("Downloaded Files:");
        for path in &result.downloaded_files {
            println!("    - {}", path.display());
        }
    }

    if result.has_failures() {
        println!();
        println!("Failures:");
        for failure in &result.failures {
            println!("    ! {failure}");
        }
    }
    println!("{}", "═".repeat(60));
}

/// Resolves when `signal` reports Ctrl-C.
///
/// If the handler could not be installed this never resolves, so the run is
/// left to finish on its own.
async fn interrupted<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        log::warn!("Ctrl-C handler unavailable: {e}");
        std::future::pending::<()>().await;
    }
}

async fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.configuration()?;
    let mut fetcher = DocumentFetcher::new(config)?;

    let outcome = tokio::select! {
        result = fetcher.process_search_and_download(&cli.business_query) => Some(result),
        () = interrupted(tokio::signal::ctrl_c()) => None,
    };
    fetcher.close();

    let Some(result) = outcome else {
        eprintln!("\nOperation cancelled by user");
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    };
    let result = result?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }

    // Per-document failures are part of a completed run.
    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
