use crate::{PacingArgs, ReportArgs};
use campaign_cache::MediaIndexCache;
use campaign_core::config::AppConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::types::{
    KeywordRecord, MetricCounters, MetricRecord, Platform, RegionalRecord, ReportKind,
};
use campaign_integrations::matcher::CreativeMedia;
use campaign_integrations::{
    HttpMediaLibrary, HttpReportSource, MediaLibrary, MediaMatcher, ReportSource,
};
use campaign_reporting::comparison::PeriodWindow;
use campaign_reporting::pacing::PacingRow;
use campaign_reporting::{
    aggregate, top_n, AggregatedGroup, CampaignDashboard, DashboardOverview, RecordNormalizer,
    ReportFilter,
};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one independently fetched dashboard section. A failed section
/// carries its error and never aborts its siblings.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionResult<T> {
    Ok { data: T },
    Failed { error: String },
}

impl<T> SectionResult<T> {
    fn from_result(section: &str, result: CampaignResult<T>) -> Self {
        match result {
            Ok(data) => Self::Ok { data },
            Err(e) => {
                warn!(section, error = %e, "Section unavailable");
                Self::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportOutput {
    pub platform: Platform,
    pub window: PeriodWindow,
    pub overview: SectionResult<DashboardOverview>,
    pub regions: SectionResult<Vec<AggregatedGroup<MetricCounters>>>,
    pub keywords: SectionResult<Vec<AggregatedGroup<MetricCounters>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<SectionResult<Vec<CreativeMedia>>>,
}

#[derive(Debug, Serialize)]
pub struct PacingOutput {
    pub platform: Platform,
    pub as_of: NaiveDate,
    pub pacing: SectionResult<Vec<PacingRow>>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn resolve_window(config: &AppConfig, args: &ReportArgs) -> CampaignResult<PeriodWindow> {
    let end = args.end.unwrap_or_else(today);
    match args.start {
        Some(start) => PeriodWindow::new(start, end),
        None => PeriodWindow::last_n_days(end, config.dashboard.default_window_days),
    }
}

pub async fn report(config: &AppConfig, args: ReportArgs) -> anyhow::Result<ReportOutput> {
    let window = resolve_window(config, &args)?;
    let top = args.top.unwrap_or(config.dashboard.top_n);
    let platform = args.platform.clone();
    info!(platform = %platform, start = %window.start(), end = %window.end(), "Building report");

    let source = HttpReportSource::from_config(config)?;
    let normalizer = RecordNormalizer::default();

    let (creatives, regions, keywords) = tokio::join!(
        source.fetch_report(&platform, ReportKind::Creative),
        source.fetch_report(&platform, ReportKind::Regional),
        source.fetch_report(&platform, ReportKind::Keyword),
    );

    let creatives = creatives.map(|table| normalizer.creatives(&table, &platform));
    let filter = ReportFilter {
        campaign: args.campaign.clone(),
        creative_query: args.creative.clone(),
        ..ReportFilter::for_window(window)
    };
    let dashboard = CampaignDashboard::new(top)
        .with_group_by(args.group_by)
        .with_sort_by(args.sort_by);

    let media = if args.with_media {
        let matched = match &creatives {
            Ok(records) => {
                let titles = creative_titles(&filter.apply(records));
                match_media(config, &platform, titles).await
            }
            Err(e) => Err(CampaignError::Upstream(format!(
                "creative report unavailable: {e}"
            ))),
        };
        Some(SectionResult::from_result("media", matched))
    } else {
        None
    };

    let overview = creatives.map(|records| dashboard.build(&records, &filter));

    let regions = regions.map(|table| {
        let records = normalizer.regions(&table, &platform);
        let in_window: Vec<&RegionalRecord> =
            records.iter().filter(|r| window.contains(r.date)).collect();
        top_n(aggregate(&in_window, |r| r.region.clone()), args.sort_by, top)
    });

    let keywords = keywords.map(|table| {
        let records = normalizer.keywords(&table, &platform);
        let in_window: Vec<&KeywordRecord> =
            records.iter().filter(|r| window.contains(r.date)).collect();
        top_n(aggregate(&in_window, |r| r.keyword.clone()), args.sort_by, top)
    });

    Ok(ReportOutput {
        platform,
        window,
        overview: SectionResult::from_result("overview", overview),
        regions: SectionResult::from_result("regions", regions),
        keywords: SectionResult::from_result("keywords", keywords),
        media,
    })
}

/// Distinct creative titles in first-seen order.
fn creative_titles(records: &[&MetricRecord]) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    for record in records {
        if !titles.contains(&record.creative_title) {
            titles.push(record.creative_title.clone());
        }
    }
    titles
}

async fn match_media(
    config: &AppConfig,
    platform: &Platform,
    titles: Vec<String>,
) -> CampaignResult<Vec<CreativeMedia>> {
    let library = MediaLibrary::new(
        Arc::new(HttpMediaLibrary::from_config(config)?),
        config.media.clone(),
        Arc::new(MediaIndexCache::from_ttl_secs(
            "media",
            config.cache.media_ttl_secs,
        )),
    );
    let index = library.index_for(platform).await?;
    Ok(MediaMatcher::default().match_all(&titles, &index))
}

pub async fn pacing(config: &AppConfig, args: PacingArgs) -> anyhow::Result<PacingOutput> {
    let as_of = args.as_of.unwrap_or_else(today);
    info!(platform = %args.platform, %as_of, "Building pacing report");

    let source = HttpReportSource::from_config(config)?;
    let rows = source
        .fetch_report(&args.platform, ReportKind::MonthlyPacing)
        .await
        .map(|table| {
            let records = RecordNormalizer::default().pacing(&table, &args.platform);
            campaign_reporting::monthly_pacing(&records, as_of)
        });

    Ok(PacingOutput {
        platform: args.platform,
        as_of,
        pacing: SectionResult::from_result("pacing", rows),
    })
}
