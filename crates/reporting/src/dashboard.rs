//! Campaign performance dashboard: filtered totals, breakdowns, top groups,
//! period comparison and a daily series in one bundle.

use crate::aggregation::{
    aggregate, keys, sort_groups, top_n, AggregatedGroup, Dimensioned, Measured, MetricField,
    SortOrder,
};
use crate::comparison::{compare, MetricSnapshot, PeriodComparison, PeriodWindow};
use crate::trend::{assess_comparison, MetricTrend};
use campaign_core::types::{MetricCounters, MetricRecord, Platform};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Record selection. Empty/unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub platforms: Vec<Platform>,
    /// Case-insensitive substring of the campaign name.
    #[serde(default)]
    pub campaign: Option<String>,
    /// Case-insensitive substring of the creative title.
    #[serde(default)]
    pub creative_query: Option<String>,
    #[serde(default)]
    pub window: Option<PeriodWindow>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

impl ReportFilter {
    pub fn for_window(window: PeriodWindow) -> Self {
        Self {
            window: Some(window),
            ..Default::default()
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platforms.push(platform);
        self
    }

    /// Every criterion except the window.
    fn matches_dimensions(&self, record: &MetricRecord) -> bool {
        if !self.platforms.is_empty() && !self.platforms.contains(&record.platform) {
            return false;
        }
        if let Some(campaign) = &self.campaign {
            if !contains_ignore_case(&record.campaign_name, campaign) {
                return false;
            }
        }
        if let Some(query) = &self.creative_query {
            if !contains_ignore_case(&record.creative_title, query) {
                return false;
            }
        }
        true
    }

    pub fn matches(&self, record: &MetricRecord) -> bool {
        self.matches_dimensions(record)
            && self.window.map_or(true, |window| window.contains(record.date))
    }

    pub fn apply<'a>(&self, records: &'a [MetricRecord]) -> Vec<&'a MetricRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    Creative,
    Campaign,
    Platform,
    Month,
    Date,
}

impl GroupBy {
    pub fn key(self, record: &MetricRecord) -> String {
        match self {
            Self::Creative => keys::by_creative(record),
            Self::Campaign => keys::by_campaign(record),
            Self::Platform => keys::by_platform(record),
            Self::Month => keys::by_month(record),
            Self::Date => keys::by_date(record),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creative => "creative",
            Self::Campaign => "campaign",
            Self::Platform => "platform",
            Self::Month => "month",
            Self::Date => "date",
        }
    }
}

impl std::str::FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "creative" | "creatives" => Ok(Self::Creative),
            "campaign" | "campaigns" => Ok(Self::Campaign),
            "platform" | "platforms" => Ok(Self::Platform),
            "month" => Ok(Self::Month),
            "date" | "day" => Ok(Self::Date),
            other => Err(format!("unknown grouping '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One point per day of `window`; days without records are zero.
pub fn daily_series<R>(records: &[R], window: PeriodWindow, field: MetricField) -> Vec<DailyPoint>
where
    R: Measured<Totals = MetricCounters> + Dimensioned,
{
    let in_window: Vec<&R> = records
        .iter()
        .filter(|r| window.contains(r.date()))
        .collect();
    let by_day: HashMap<String, f64> = aggregate(&in_window, |r| keys::by_date(r))
        .into_iter()
        .map(|group| (group.key.clone(), field.value(&group.totals, &group.ratios)))
        .collect();

    window
        .days()
        .map(|date| DailyPoint {
            date,
            value: by_day
                .get(&date.format("%Y-%m-%d").to_string())
                .copied()
                .unwrap_or(0.0),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    pub window: Option<PeriodWindow>,
    pub group_by: GroupBy,
    pub sort_by: MetricField,
    pub totals: MetricSnapshot,
    pub platform_breakdown: Vec<AggregatedGroup<MetricCounters>>,
    pub top_groups: Vec<AggregatedGroup<MetricCounters>>,
    pub comparison: Option<PeriodComparison>,
    pub trends: Vec<MetricTrend>,
    pub daily: Vec<DailyPoint>,
}

/// Dashboard settings: how to group, rank and truncate.
#[derive(Debug, Clone)]
pub struct CampaignDashboard {
    pub top_n: usize,
    pub group_by: GroupBy,
    pub sort_by: MetricField,
}

impl CampaignDashboard {
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n,
            group_by: GroupBy::default(),
            sort_by: MetricField::Cost,
        }
    }

    pub fn with_group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_sort_by(mut self, sort_by: MetricField) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn build(&self, records: &[MetricRecord], filter: &ReportFilter) -> DashboardOverview {
        // The comparison needs the previous window, so the window criterion
        // is applied separately.
        let scoped: Vec<MetricRecord> = records
            .iter()
            .filter(|r| filter.matches_dimensions(r))
            .cloned()
            .collect();
        let current: Vec<&MetricRecord> = scoped
            .iter()
            .filter(|r| filter.window.map_or(true, |w| w.contains(r.date)))
            .collect();

        let mut platform_breakdown = aggregate(&current, |r| keys::by_platform(r));
        sort_groups(&mut platform_breakdown, MetricField::Cost, SortOrder::Descending);

        let group_by = self.group_by;
        let groups = aggregate(&current, |r| group_by.key(r));
        let top_groups = top_n(groups, self.sort_by, self.top_n);

        let comparison = filter.window.map(|window| compare(&scoped, window));
        let trends = comparison
            .as_ref()
            .map(assess_comparison)
            .unwrap_or_default();

        let series_window = filter.window.or_else(|| span_of(&current));
        let daily = series_window
            .map(|window| daily_series(&current, window, self.sort_by))
            .unwrap_or_default();

        tracing::debug!(
            records = current.len(),
            groups = top_groups.len(),
            group_by = group_by.as_str(),
            "dashboard overview built"
        );

        DashboardOverview {
            window: filter.window,
            group_by,
            sort_by: self.sort_by,
            totals: MetricSnapshot::from_records(&current),
            platform_breakdown,
            top_groups,
            comparison,
            trends,
            daily,
        }
    }
}

impl Default for CampaignDashboard {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Smallest window covering every record date.
fn span_of<R: Dimensioned>(records: &[R]) -> Option<PeriodWindow> {
    let start = records.iter().map(|r| r.date()).min()?;
    let end = records.iter().map(|r| r.date()).max()?;
    PeriodWindow::new(start, end).ok()
}

/// Overview ranked by cost.
pub fn build_overview(
    records: &[MetricRecord],
    filter: &ReportFilter,
    group_by: GroupBy,
    top_n: usize,
) -> DashboardOverview {
    CampaignDashboard::new(top_n)
        .with_group_by(group_by)
        .build(records, filter)
}
