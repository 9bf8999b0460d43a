//! Campaign Insights: campaign analytics from platform report sheets.
//!
//! Fetches platform reports, aggregates them and prints JSON dashboards.

mod commands;

use campaign_core::config::AppConfig;
use campaign_core::types::Platform;
use campaign_reporting::{GroupBy, MetricField};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "campaign-insights")]
#[command(about = "Campaign performance dashboards from platform report sheets")]
#[command(version)]
struct Cli {
    /// Report endpoint base URL (overrides config)
    #[arg(long, global = true, env = "CAMPAIGN_INSIGHTS__REPORTS__BASE_URL")]
    reports_url: Option<String>,

    /// Media-library base URL (overrides config)
    #[arg(long, global = true, env = "CAMPAIGN_INSIGHTS__MEDIA__BASE_URL")]
    media_url: Option<String>,

    /// HTTP timeout in milliseconds (overrides config)
    #[arg(long, global = true, env = "CAMPAIGN_INSIGHTS__HTTP__TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creative dashboard for one platform and date window
    Report(ReportArgs),
    /// Planned vs. actual monthly spend
    Pacing(PacingArgs),
}

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    #[arg(long, default_value = "meta")]
    pub platform: Platform,

    /// First day of the window (defaults to the configured window length
    /// before --end)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day of the window (defaults to today)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[arg(long, default_value = "creative")]
    pub group_by: GroupBy,

    /// Metric used to rank groups
    #[arg(long, default_value = "cost")]
    pub sort_by: MetricField,

    /// Number of groups to keep (overrides config)
    #[arg(long)]
    pub top: Option<usize>,

    /// Campaign name filter (case-insensitive substring)
    #[arg(long)]
    pub campaign: Option<String>,

    /// Creative title filter (case-insensitive substring)
    #[arg(long)]
    pub creative: Option<String>,

    /// Attach media-library previews to creatives
    #[arg(long, default_value_t = false)]
    pub with_media: bool,
}

#[derive(clap::Args, Debug)]
pub struct PacingArgs {
    #[arg(long, default_value = "meta")]
    pub platform: Platform,

    /// Reference date for elapsed-month calculations (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_insights=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(url) = cli.reports_url {
        config.reports.base_url = url;
    }
    if let Some(url) = cli.media_url {
        config.media.base_url = url;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.http.timeout_ms = timeout_ms;
    }

    info!(
        reports = %config.reports.base_url,
        media = %config.media.base_url,
        timeout_ms = config.http.timeout_ms,
        "Configuration loaded"
    );

    let output = match cli.command {
        Command::Report(args) => serde_json::to_string_pretty(&commands::report(&config, args).await?)?,
        Command::Pacing(args) => serde_json::to_string_pretty(&commands::pacing(&config, args).await?)?,
    };
    println!("{output}");

    Ok(())
}
