use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fsbo_scout::config::AppConfig;
use fsbo_scout::discovery::{DiscoveryCache, JsonFileRepository};
use fsbo_scout::remote::{LobstrClient, Orchestrator};
use fsbo_scout::scrapers::{FileScraper, RemoteJobScraper, ScraperTrait};
use fsbo_scout::{BatchOutput, Pipeline, PipelineOptions, Platform};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fsbo-scout", about = "Normalize, dedupe and score real-estate classifieds")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a collector dump from disk
    Ingest {
        #[arg(long)]
        platform: Platform,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        only_new: bool,
    },
    /// Run a remote scrape job and process its results
    Fetch {
        #[arg(long)]
        platform: Platform,
        #[arg(long, env = "LOBSTR_SQUID_ID")]
        squid: String,
        #[arg(long)]
        search_url: Option<String>,
        #[arg(long)]
        max_results: Option<usize>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        only_new: bool,
    },
    /// Forget ads not seen for a number of days
    CleanCache {
        #[arg(long)]
        platform: Platform,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    info!("🏠 FSBO Scout");

    match cli.command {
        Command::Ingest {
            platform,
            input,
            output,
            only_new,
        } => {
            let scraper = FileScraper::new(platform, input);
            process(&config, &scraper, output, only_new).await
        }
        Command::Fetch {
            platform,
            squid,
            search_url,
            max_results,
            output,
            only_new,
        } => {
            let token = config
                .lobstr_api_token
                .clone()
                .context("LOBSTR_API_TOKEN must be set to run remote jobs")?;
            let client = LobstrClient::with_base_url(token, config.lobstr_base_url.clone())
                .context("Failed to create HTTP client")?;
            let orchestrator = Orchestrator::new(client, config.orchestrator());

            let mut scraper = RemoteJobScraper::new(platform, orchestrator, squid);
            if let Some(url) = search_url {
                scraper = scraper.with_search_url(url);
            }
            if let Some(max) = max_results {
                scraper = scraper.with_max_results(max);
            }
            process(&config, &scraper, output, only_new).await
        }
        Command::CleanCache { platform, days } => {
            let cache = DiscoveryCache::new(JsonFileRepository::new(&config.cache_dir));
            let removed = cache.clean_old_cache(platform.as_str(), days).await;
            info!("🧹 Removed {} stale {} entries", removed, platform);
            Ok(())
        }
    }
}

async fn process(
    config: &AppConfig,
    scraper: &dyn ScraperTrait,
    output: Option<PathBuf>,
    only_new: bool,
) -> Result<()> {
    let raws = scraper.collect().await?;

    let pipeline = Pipeline::new(JsonFileRepository::new(&config.cache_dir), config.fingerprint());
    let batch = pipeline
        .run(scraper.source_name(), &raws, PipelineOptions { only_new })
        .await;

    info!(
        "✅ {} listings ({} new, {} duplicates removed)",
        batch.total_results, batch.new_count, batch.duplicates_removed
    );
    print_summary(&batch);

    let json = serde_json::to_string_pretty(&batch)?;
    match output {
        Some(path) => {
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("💾 Saved results to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn print_summary(batch: &BatchOutput) {
    for (i, item) in batch.items.iter().enumerate() {
        let listing = &item.listing;
        eprintln!(
            "{}. [{:>3}] {} ({} €){}",
            i + 1,
            item.private_score,
            listing.title,
            listing.price,
            if item.is_new { " NEW" } else { "" }
        );
        eprintln!("   {}", listing.url);
    }
}
