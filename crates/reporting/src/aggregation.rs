//! Group-and-reaggregate engine.
//!
//! Additive counters are summed per bucket; ratios are recomputed from the
//! summed bases afterwards. Ratios are never summed or averaged.

use campaign_core::types::{
    KeywordRecord, MetricCounters, MetricRecord, PacingRecord, Platform, RatioMetrics,
    RegionalRecord,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

/// Additive totals that know how to derive their ratios.
pub trait Metrics: Clone + Default + Debug + Serialize {
    type Ratios: Clone + Default + Debug + Serialize;

    fn accumulate(&mut self, other: &Self);
    fn ratios(&self) -> Self::Ratios;
}

/// Anything that contributes totals to an aggregation.
pub trait Measured {
    type Totals: Metrics;

    fn totals(&self) -> Self::Totals;
}

/// Date and platform dimensions shared by every record kind.
pub trait Dimensioned {
    fn date(&self) -> NaiveDate;
    fn platform(&self) -> &Platform;
}

impl<R: Measured> Measured for &R {
    type Totals = R::Totals;

    fn totals(&self) -> Self::Totals {
        (**self).totals()
    }
}

impl<R: Dimensioned> Dimensioned for &R {
    fn date(&self) -> NaiveDate {
        (**self).date()
    }

    fn platform(&self) -> &Platform {
        (**self).platform()
    }
}

/// `numerator / denominator`, or `0` when the denominator is not positive.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Derive every ratio from summed counters.
pub fn derive_ratios(c: &MetricCounters) -> RatioMetrics {
    let impressions = c.impressions as f64;
    RatioMetrics {
        cpm: if c.cost > 0.0 && c.impressions > 0 {
            c.cost / (impressions / 1000.0)
        } else {
            0.0
        },
        cpc: safe_ratio(c.cost, c.clicks as f64),
        ctr: safe_ratio(c.clicks as f64, impressions) * 100.0,
        vtr: safe_ratio(c.video_completions as f64, impressions) * 100.0,
        frequency: safe_ratio(impressions, c.reach as f64),
        view_rate_25: safe_ratio(c.video_views_25 as f64, impressions) * 100.0,
        view_rate_50: safe_ratio(c.video_views_50 as f64, impressions) * 100.0,
        view_rate_75: safe_ratio(c.video_views_75 as f64, impressions) * 100.0,
    }
}

impl Metrics for MetricCounters {
    type Ratios = RatioMetrics;

    fn accumulate(&mut self, other: &Self) {
        *self += other;
    }

    fn ratios(&self) -> RatioMetrics {
        derive_ratios(self)
    }
}

impl Measured for MetricRecord {
    type Totals = MetricCounters;

    fn totals(&self) -> MetricCounters {
        self.counters
    }
}

impl Measured for RegionalRecord {
    type Totals = MetricCounters;

    fn totals(&self) -> MetricCounters {
        self.counters
    }
}

impl Measured for KeywordRecord {
    type Totals = MetricCounters;

    fn totals(&self) -> MetricCounters {
        self.counters
    }
}

impl Dimensioned for MetricRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn platform(&self) -> &Platform {
        &self.platform
    }
}

impl Dimensioned for RegionalRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn platform(&self) -> &Platform {
        &self.platform
    }
}

impl Dimensioned for KeywordRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn platform(&self) -> &Platform {
        &self.platform
    }
}

impl Dimensioned for PacingRecord {
    fn date(&self) -> NaiveDate {
        self.month
    }

    fn platform(&self) -> &Platform {
        &self.platform
    }
}

/// Accumulated totals and freshly derived ratios for one bucket.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "T: Serialize, T::Ratios: Serialize"))]
pub struct AggregatedGroup<T: Metrics> {
    pub key: String,
    pub record_count: usize,
    pub totals: T,
    pub ratios: T::Ratios,
}

impl<T: Metrics> AggregatedGroup<T> {
    pub fn new(key: impl Into<String>, record_count: usize, totals: T) -> Self {
        let ratios = totals.ratios();
        Self {
            key: key.into(),
            record_count,
            totals,
            ratios,
        }
    }

    /// Combine two groups, recomputing ratios from the merged bases. The key
    /// of `self` is kept.
    pub fn merge(&self, other: &Self) -> Self {
        let mut totals = self.totals.clone();
        totals.accumulate(&other.totals);
        Self::new(
            self.key.clone(),
            self.record_count + other.record_count,
            totals,
        )
    }
}

pub fn merge_groups<T: Metrics>(
    a: &AggregatedGroup<T>,
    b: &AggregatedGroup<T>,
) -> AggregatedGroup<T> {
    a.merge(b)
}

/// Partition `records` by `key_fn`, sum totals per bucket and derive ratios.
/// Groups come out in first-seen key order; an empty input yields no groups.
pub fn aggregate<R, K>(records: &[R], key_fn: K) -> Vec<AggregatedGroup<R::Totals>>
where
    R: Measured,
    K: Fn(&R) -> String,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, usize, R::Totals)> = Vec::new();

    for record in records {
        let key = key_fn(record);
        let totals = record.totals();
        match positions.get(&key) {
            Some(&position) => {
                let bucket = &mut buckets[position];
                bucket.1 += 1;
                bucket.2.accumulate(&totals);
            }
            None => {
                positions.insert(key.clone(), buckets.len());
                buckets.push((key, 1, totals));
            }
        }
    }

    buckets
        .into_iter()
        .map(|(key, count, totals)| AggregatedGroup::new(key, count, totals))
        .collect()
}

pub const ALL_RECORDS_KEY: &str = "all";

/// Whole-set aggregation; `None` when there are no records.
pub fn aggregate_all<R: Measured>(records: &[R]) -> Option<AggregatedGroup<R::Totals>> {
    let (first, rest) = records.split_first()?;
    let mut totals = first.totals();
    for record in rest {
        totals.accumulate(&record.totals());
    }
    Some(AggregatedGroup::new(ALL_RECORDS_KEY, records.len(), totals))
}

/// Grouping keys for creative rows and anything carrying dates/platforms.
pub mod keys {
    use super::Dimensioned;
    use campaign_core::types::MetricRecord;

    /// Creative title plus campaign name; the same title in two campaigns is
    /// two creatives.
    pub fn by_creative(record: &MetricRecord) -> String {
        format!("{} | {}", record.creative_title, record.campaign_name)
    }

    pub fn by_creative_title(record: &MetricRecord) -> String {
        record.creative_title.clone()
    }

    pub fn by_campaign(record: &MetricRecord) -> String {
        record.campaign_name.clone()
    }

    pub fn by_platform<R: Dimensioned>(record: &R) -> String {
        record.platform().label().to_string()
    }

    /// `YYYY-MM`.
    pub fn by_month<R: Dimensioned>(record: &R) -> String {
        record.date().format("%Y-%m").to_string()
    }

    /// `YYYY-MM-DD`.
    pub fn by_date<R: Dimensioned>(record: &R) -> String {
        record.date().format("%Y-%m-%d").to_string()
    }
}

/// Selectable creative metric, used for sorting, deltas and trend policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Impressions,
    Clicks,
    Reach,
    Cost,
    VideoViews,
    VideoViews25,
    VideoViews50,
    VideoViews75,
    VideoCompletions,
    Engagements,
    Cpm,
    Cpc,
    Ctr,
    Vtr,
    Frequency,
    ViewRate25,
    ViewRate50,
    ViewRate75,
}

impl MetricField {
    pub const ALL: [MetricField; 18] = [
        MetricField::Impressions,
        MetricField::Clicks,
        MetricField::Reach,
        MetricField::Cost,
        MetricField::VideoViews,
        MetricField::VideoViews25,
        MetricField::VideoViews50,
        MetricField::VideoViews75,
        MetricField::VideoCompletions,
        MetricField::Engagements,
        MetricField::Cpm,
        MetricField::Cpc,
        MetricField::Ctr,
        MetricField::Vtr,
        MetricField::Frequency,
        MetricField::ViewRate25,
        MetricField::ViewRate50,
        MetricField::ViewRate75,
    ];

    pub fn value(self, totals: &MetricCounters, ratios: &RatioMetrics) -> f64 {
        match self {
            Self::Impressions => totals.impressions as f64,
            Self::Clicks => totals.clicks as f64,
            Self::Reach => totals.reach as f64,
            Self::Cost => totals.cost,
            Self::VideoViews => totals.video_views as f64,
            Self::VideoViews25 => totals.video_views_25 as f64,
            Self::VideoViews50 => totals.video_views_50 as f64,
            Self::VideoViews75 => totals.video_views_75 as f64,
            Self::VideoCompletions => totals.video_completions as f64,
            Self::Engagements => totals.engagements as f64,
            Self::Cpm => ratios.cpm,
            Self::Cpc => ratios.cpc,
            Self::Ctr => ratios.ctr,
            Self::Vtr => ratios.vtr,
            Self::Frequency => ratios.frequency,
            Self::ViewRate25 => ratios.view_rate_25,
            Self::ViewRate50 => ratios.view_rate_50,
            Self::ViewRate75 => ratios.view_rate_75,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Impressions => "impressions",
            Self::Clicks => "clicks",
            Self::Reach => "reach",
            Self::Cost => "cost",
            Self::VideoViews => "video_views",
            Self::VideoViews25 => "video_views_25",
            Self::VideoViews50 => "video_views_50",
            Self::VideoViews75 => "video_views_75",
            Self::VideoCompletions => "video_completions",
            Self::Engagements => "engagements",
            Self::Cpm => "cpm",
            Self::Cpc => "cpc",
            Self::Ctr => "ctr",
            Self::Vtr => "vtr",
            Self::Frequency => "frequency",
            Self::ViewRate25 => "view_rate_25",
            Self::ViewRate50 => "view_rate_50",
            Self::ViewRate75 => "view_rate_75",
        }
    }
}

impl std::str::FromStr for MetricField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == wanted)
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Stable sort by an arbitrary group value; ties keep first-seen order.
pub fn sort_groups_by<T, F>(groups: &mut [AggregatedGroup<T>], value: F, order: SortOrder)
where
    T: Metrics,
    F: Fn(&AggregatedGroup<T>) -> f64,
{
    groups.sort_by(|a, b| {
        let ordering = value(a).total_cmp(&value(b));
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

pub fn sort_groups(
    groups: &mut [AggregatedGroup<MetricCounters>],
    field: MetricField,
    order: SortOrder,
) {
    sort_groups_by(groups, |g| field.value(&g.totals, &g.ratios), order);
}

/// Sort descending by `field` and keep the first `n` groups.
pub fn top_n(
    mut groups: Vec<AggregatedGroup<MetricCounters>>,
    field: MetricField,
    n: usize,
) -> Vec<AggregatedGroup<MetricCounters>> {
    sort_groups(&mut groups, field, SortOrder::Descending);
    groups.truncate(n);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(creative: &str, day: u32, impressions: u64, clicks: u64, cost: f64) -> MetricRecord {
        MetricRecord {
            date: NaiveDate::from_ymd_opt(2025, 9, day).unwrap(),
            platform: Platform::Meta,
            campaign_name: "Always On".into(),
            creative_title: creative.into(),
            counters: MetricCounters {
                impressions,
                clicks,
                cost,
                ..Default::default()
            },
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ratios_recomputed_from_sums() {
        let records = vec![
            record("A", 1, 1000, 10, 50.0),
            record("A", 2, 2000, 30, 70.0),
        ];
        let groups = aggregate(&records, keys::by_creative_title);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.record_count, 2);
        assert_eq!(group.totals.impressions, 3000);
        assert_eq!(group.totals.clicks, 40);
        assert!(close(group.totals.cost, 120.0));
        assert!(close(group.ratios.ctr, 40.0 / 3000.0 * 100.0));
        assert!(close(group.ratios.cpc, 3.0));
        assert!(close(group.ratios.cpm, 40.0));

        // Averaging the per-row CTRs (1.0 and 1.5) would give 1.25.
        assert!(!close(group.ratios.ctr, 1.25));
    }

    #[test]
    fn test_huge_parsed_counts_saturate() {
        let max = crate::parsers::parse_locale_integer("18.446.744.073.709.551.615");
        assert_eq!(max, u64::MAX);
        let records = vec![record("A", 1, max, 1, 1.0), record("A", 2, max, 1, 1.0)];
        let groups = aggregate(&records, keys::by_creative_title);
        assert_eq!(groups[0].totals.impressions, u64::MAX);
        assert_eq!(groups[0].totals.clicks, 2);
    }

    #[test]
    fn test_first_seen_order() {
        let records = vec![
            record("B", 1, 10, 0, 0.0),
            record("A", 1, 10, 0, 0.0),
            record("B", 2, 10, 0, 0.0),
        ];
        let keys: Vec<String> = aggregate(&records, keys::by_creative_title)
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(keys, vec!["B", "A"]);
    }

    #[test]
    fn test_empty_input_has_no_groups() {
        let records: Vec<MetricRecord> = Vec::new();
        assert!(aggregate(&records, keys::by_creative).is_empty());
        assert!(aggregate_all(&records).is_none());
    }

    #[test]
    fn test_zero_safety() {
        let ratios = derive_ratios(&MetricCounters {
            clicks: 5,
            cost: 10.0,
            video_completions: 3,
            ..Default::default()
        });
        assert_eq!(ratios.ctr, 0.0);
        assert_eq!(ratios.cpm, 0.0);
        assert_eq!(ratios.vtr, 0.0);
        assert_eq!(ratios.frequency, 0.0);
        assert!(close(ratios.cpc, 2.0));

        let empty = derive_ratios(&MetricCounters::default());
        assert_eq!(empty, RatioMetrics::default());
    }

    #[test]
    fn test_video_and_reach_ratios() {
        let ratios = derive_ratios(&MetricCounters {
            impressions: 1000,
            reach: 400,
            video_views_25: 500,
            video_completions: 250,
            ..Default::default()
        });
        assert!(close(ratios.vtr, 25.0));
        assert!(close(ratios.view_rate_25, 50.0));
        assert!(close(ratios.frequency, 2.5));
    }

    #[test]
    fn test_merge_is_additive() {
        let left = vec![record("A", 1, 1000, 10, 50.0), record("A", 2, 500, 1, 5.0)];
        let right = vec![record("A", 3, 2000, 30, 70.0)];
        let merged = aggregate_all(&left)
            .unwrap()
            .merge(&aggregate_all(&right).unwrap());
        let via_fn = merge_groups(
            &aggregate_all(&left).unwrap(),
            &aggregate_all(&right).unwrap(),
        );
        assert_eq!(via_fn.record_count, 3);

        let all: Vec<MetricRecord> = left.iter().chain(right.iter()).cloned().collect();
        let direct = aggregate_all(&all).unwrap();

        assert_eq!(merged.record_count, direct.record_count);
        assert_eq!(merged.totals.impressions, direct.totals.impressions);
        assert_eq!(merged.totals.clicks, direct.totals.clicks);
        assert!(close(merged.totals.cost, direct.totals.cost));
        assert!(close(merged.ratios.ctr, direct.ratios.ctr));
        assert!(close(merged.ratios.cpm, direct.ratios.cpm));
    }

    #[test]
    fn test_keys_for_dimensions() {
        let r = record("A", 7, 1, 0, 0.0);
        assert_eq!(keys::by_month(&r), "2025-09");
        assert_eq!(keys::by_date(&r), "2025-09-07");
        assert_eq!(keys::by_platform(&r), "Meta");
        assert_eq!(keys::by_creative(&r), "A | Always On");
    }

    #[test]
    fn test_aggregate_over_references() {
        let records = vec![record("A", 1, 100, 1, 1.0), record("B", 1, 300, 3, 3.0)];
        let refs: Vec<&MetricRecord> = records.iter().filter(|r| r.counters.impressions > 200).collect();
        let groups = aggregate(&refs, |r| keys::by_creative_title(r));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "B");
    }

    #[test]
    fn test_sort_and_top_n() {
        let records = vec![
            record("low", 1, 100, 1, 5.0),
            record("high", 1, 100, 1, 50.0),
            record("mid", 1, 100, 1, 20.0),
        ];
        let groups = aggregate(&records, keys::by_creative_title);
        let top = top_n(groups.clone(), MetricField::Cost, 2);
        let names: Vec<&str> = top.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(names, vec!["high", "mid"]);

        let mut ascending = groups;
        sort_groups(&mut ascending, MetricField::Cost, SortOrder::Ascending);
        assert_eq!(ascending[0].key, "low");
    }

    #[test]
    fn test_metric_field_from_str() {
        assert_eq!("CTR".parse::<MetricField>(), Ok(MetricField::Ctr));
        assert_eq!(
            "video_views_25".parse::<MetricField>(),
            Ok(MetricField::VideoViews25)
        );
        assert_eq!(
            " View_Rate_50 ".parse::<MetricField>(),
            Ok(MetricField::ViewRate50)
        );
        assert!("roas".parse::<MetricField>().is_err());
    }
}
