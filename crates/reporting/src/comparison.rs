//! Period-over-period comparison over equal-length, contiguous calendar
//! windows.

use crate::aggregation::{aggregate_all, AggregatedGroup, Dimensioned, Measured, MetricField};
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::types::{MetricCounters, RatioMetrics};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inclusive calendar-date range. `start <= end` always holds, including for
/// deserialized windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct PeriodWindow {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawWindow> for PeriodWindow {
    type Error = CampaignError;

    fn try_from(raw: RawWindow) -> CampaignResult<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl PeriodWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> CampaignResult<Self> {
        if end < start {
            return Err(CampaignError::Validation(format!(
                "window end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Build from explicit year/month/day components.
    pub fn from_ymd(
        start: (i32, u32, u32),
        end: (i32, u32, u32),
    ) -> CampaignResult<Self> {
        let make = |(y, m, d): (i32, u32, u32)| {
            NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| {
                CampaignError::Validation(format!("invalid calendar date {y:04}-{m:02}-{d:02}"))
            })
        };
        Self::new(make(start)?, make(end)?)
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The `days` days ending on `as_of`, inclusive.
    pub fn last_n_days(as_of: NaiveDate, days: u32) -> CampaignResult<Self> {
        if days == 0 {
            return Err(CampaignError::Validation(
                "window must span at least one day".to_string(),
            ));
        }
        Self::new(as_of - Duration::days(i64::from(days) - 1), as_of)
    }

    /// From the first of `as_of`'s month through `as_of`.
    pub fn month_to_date(as_of: NaiveDate) -> Self {
        Self {
            start: first_of_month(as_of),
            end: as_of,
        }
    }

    /// The full calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = first_of_month(date);
        let end = start + Duration::days(i64::from(days_in_month(date.year(), date.month())) - 1);
        Self { start, end }
    }

    /// Inclusive length in days.
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The window of identical length ending the day before this one starts.
    pub fn previous(&self) -> Self {
        let end = self.start - Duration::days(1);
        let start = end - Duration::days(self.duration_days() - 1);
        Self { start, end }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let count = usize::try_from(self.duration_days()).unwrap_or(0);
        self.start.iter_days().take(count)
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        _ => 28,
    }
}

/// Summed counters and derived ratios for one side of a comparison.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricSnapshot {
    pub record_count: usize,
    pub totals: MetricCounters,
    pub ratios: RatioMetrics,
}

impl MetricSnapshot {
    pub fn from_records<R>(records: &[R]) -> Self
    where
        R: Measured<Totals = MetricCounters>,
    {
        aggregate_all(records).map(Self::from).unwrap_or_default()
    }

    pub fn value(&self, field: MetricField) -> f64 {
        field.value(&self.totals, &self.ratios)
    }
}

impl From<AggregatedGroup<MetricCounters>> for MetricSnapshot {
    fn from(group: AggregatedGroup<MetricCounters>) -> Self {
        Self {
            record_count: group.record_count,
            totals: group.totals,
            ratios: group.ratios,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDelta {
    pub field: MetricField,
    pub current: f64,
    pub previous: f64,
    pub delta_pct: f64,
}

/// Current/previous snapshots plus signed percentage deltas per metric.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodComparison {
    pub current_window: PeriodWindow,
    pub previous_window: PeriodWindow,
    pub current: MetricSnapshot,
    pub previous: MetricSnapshot,
    pub deltas: Vec<MetricDelta>,
}

impl PeriodComparison {
    fn build(
        current_window: PeriodWindow,
        previous_window: PeriodWindow,
        current: MetricSnapshot,
        previous: MetricSnapshot,
    ) -> Self {
        let deltas = MetricField::ALL
            .into_iter()
            .map(|field| {
                let (now, before) = (current.value(field), previous.value(field));
                MetricDelta {
                    field,
                    current: now,
                    previous: before,
                    delta_pct: delta_pct(now, before),
                }
            })
            .collect();
        Self {
            current_window,
            previous_window,
            current,
            previous,
            deltas,
        }
    }

    pub fn delta(&self, field: MetricField) -> Option<&MetricDelta> {
        self.deltas.iter().find(|d| d.field == field)
    }

    pub fn delta_pct(&self, field: MetricField) -> f64 {
        self.delta(field).map(|d| d.delta_pct).unwrap_or(0.0)
    }
}

/// Signed percentage change. A zero baseline reports `100` for any growth
/// and `0` otherwise.
pub fn delta_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (current - previous) / previous * 100.0
    }
}

fn split_by_window<'a, R: Dimensioned>(
    records: &'a [R],
    current: &PeriodWindow,
    previous: &PeriodWindow,
) -> (Vec<&'a R>, Vec<&'a R>) {
    let mut in_current = Vec::new();
    let mut in_previous = Vec::new();
    for record in records {
        let date = record.date();
        if current.contains(date) {
            in_current.push(record);
        } else if previous.contains(date) {
            in_previous.push(record);
        }
    }
    (in_current, in_previous)
}

/// Compare `window` against the preceding window of equal length over the
/// whole record set.
pub fn compare<R>(records: &[R], window: PeriodWindow) -> PeriodComparison
where
    R: Measured<Totals = MetricCounters> + Dimensioned,
{
    let previous_window = window.previous();
    let (current, previous) = split_by_window(records, &window, &previous_window);
    PeriodComparison::build(
        window,
        previous_window,
        MetricSnapshot::from_records(&current),
        MetricSnapshot::from_records(&previous),
    )
}

/// Per-key comparison. Keys seen in the current window come first, in
/// first-seen order, followed by keys only present in the previous window.
pub fn compare_by<R, K>(
    records: &[R],
    window: PeriodWindow,
    key_fn: K,
) -> Vec<(String, PeriodComparison)>
where
    R: Measured<Totals = MetricCounters> + Dimensioned,
    K: Fn(&R) -> String,
{
    let previous_window = window.previous();
    let (current, previous) = split_by_window(records, &window, &previous_window);

    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, (Vec<&R>, Vec<&R>)> = HashMap::new();
    for (side, set) in [(0usize, current), (1usize, previous)] {
        for record in set {
            let key = key_fn(record);
            let bucket = buckets.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                (Vec::new(), Vec::new())
            });
            if side == 0 {
                bucket.0.push(record);
            } else {
                bucket.1.push(record);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let (current, previous) = buckets.remove(&key)?;
            let comparison = PeriodComparison::build(
                window,
                previous_window,
                MetricSnapshot::from_records(&current),
                MetricSnapshot::from_records(&previous),
            );
            Some((key, comparison))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::keys;
    use campaign_core::types::{MetricRecord, Platform};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(date: NaiveDate, creative: &str, impressions: u64, clicks: u64, cost: f64) -> MetricRecord {
        MetricRecord {
            date,
            platform: Platform::TikTok,
            campaign_name: "Launch".into(),
            creative_title: creative.into(),
            counters: MetricCounters {
                impressions,
                clicks,
                cost,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_previous_window_symmetry() {
        let window = PeriodWindow::from_ymd((2025, 9, 1), (2025, 9, 7)).unwrap();
        assert_eq!(window.duration_days(), 7);
        let previous = window.previous();
        assert_eq!(previous.start, ymd(2025, 8, 25));
        assert_eq!(previous.end, ymd(2025, 8, 31));
        assert_eq!(previous.duration_days(), 7);
    }

    #[test]
    fn test_previous_window_crosses_year_and_leap_day() {
        let window = PeriodWindow::from_ymd((2024, 3, 1), (2024, 3, 31)).unwrap();
        let previous = window.previous();
        assert_eq!(previous.end, ymd(2024, 2, 29));
        assert_eq!(previous.start, ymd(2024, 1, 30));

        let single = PeriodWindow::single_day(ymd(2025, 1, 1)).previous();
        assert_eq!(single, PeriodWindow::single_day(ymd(2024, 12, 31)));
    }

    #[test]
    fn test_invalid_windows() {
        assert!(PeriodWindow::new(ymd(2025, 9, 7), ymd(2025, 9, 1)).is_err());
        assert!(PeriodWindow::from_ymd((2025, 2, 30), (2025, 3, 1)).is_err());
        assert!(PeriodWindow::last_n_days(ymd(2025, 9, 7), 0).is_err());
    }

    #[test]
    fn test_deserialize_rejects_inverted_window() {
        let inverted =
            serde_json::from_str::<PeriodWindow>(r#"{"start":"2025-09-07","end":"2025-09-01"}"#);
        assert!(inverted.is_err());

        let window: PeriodWindow =
            serde_json::from_str(r#"{"start":"2025-09-01","end":"2025-09-07"}"#).unwrap();
        assert_eq!(window.start(), ymd(2025, 9, 1));
        assert_eq!(window.days().count(), 7);
        assert_eq!(serde_json::to_value(window).unwrap()["end"], "2025-09-07");
    }

    #[test]
    fn test_presets() {
        let last7 = PeriodWindow::last_n_days(ymd(2025, 9, 7), 7).unwrap();
        assert_eq!(last7.start, ymd(2025, 9, 1));

        let mtd = PeriodWindow::month_to_date(ymd(2025, 9, 15));
        assert_eq!(mtd.start, ymd(2025, 9, 1));
        assert_eq!(mtd.duration_days(), 15);

        let february = PeriodWindow::month_of(ymd(2024, 2, 10));
        assert_eq!(february.end, ymd(2024, 2, 29));
        assert_eq!(PeriodWindow::month_of(ymd(2025, 2, 10)).duration_days(), 28);
        assert_eq!(february.days().count(), 29);
    }

    #[test]
    fn test_delta_sign() {
        assert!((delta_pct(150.0, 100.0) - 50.0).abs() < 1e-9);
        assert!((delta_pct(50.0, 100.0) + 50.0).abs() < 1e-9);
        assert_eq!(delta_pct(10.0, 0.0), 100.0);
        assert_eq!(delta_pct(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_compare_windows() {
        let window = PeriodWindow::from_ymd((2025, 9, 1), (2025, 9, 7)).unwrap();
        let records = vec![
            record(ymd(2025, 9, 1), "A", 1000, 10, 50.0),
            record(ymd(2025, 9, 7), "A", 500, 5, 25.0),
            record(ymd(2025, 8, 25), "A", 1000, 20, 100.0),
            record(ymd(2025, 8, 24), "A", 9999, 99, 999.0),
            record(ymd(2025, 9, 8), "A", 9999, 99, 999.0),
        ];
        let comparison = compare(&records, window);
        assert_eq!(comparison.current.record_count, 2);
        assert_eq!(comparison.previous.record_count, 1);
        assert_eq!(comparison.current.totals.impressions, 1500);
        assert!((comparison.delta_pct(MetricField::Impressions) - 50.0).abs() < 1e-9);
        assert!((comparison.delta_pct(MetricField::Clicks) + 25.0).abs() < 1e-9);
        // CPM: 50 now vs 100 before.
        assert!((comparison.delta_pct(MetricField::Cpm) + 50.0).abs() < 1e-9);
        assert_eq!(comparison.deltas.len(), MetricField::ALL.len());
    }

    #[test]
    fn test_compare_quartile_view_rates() {
        let window = PeriodWindow::from_ymd((2025, 9, 8), (2025, 9, 14)).unwrap();
        let with_quartiles = |date: NaiveDate, views_50: u64, views_75: u64| MetricRecord {
            counters: MetricCounters {
                video_views_25: 400,
                video_views_50: views_50,
                video_views_75: views_75,
                ..record(date, "Teaser", 1000, 10, 10.0).counters
            },
            ..record(date, "Teaser", 1000, 10, 10.0)
        };
        let records = vec![
            with_quartiles(ymd(2025, 9, 10), 300, 100),
            with_quartiles(ymd(2025, 9, 3), 200, 200),
        ];
        let comparison = compare(&records, window);
        let view_rate_50 = comparison.delta(MetricField::ViewRate50).unwrap();
        assert!((view_rate_50.current - 30.0).abs() < 1e-9);
        assert!((view_rate_50.previous - 20.0).abs() < 1e-9);
        assert!((view_rate_50.delta_pct - 50.0).abs() < 1e-9);
        assert!((comparison.delta_pct(MetricField::ViewRate75) + 50.0).abs() < 1e-9);
        assert_eq!(comparison.delta_pct(MetricField::ViewRate25), 0.0);
    }

    #[test]
    fn test_compare_empty_previous() {
        let window = PeriodWindow::single_day(ymd(2025, 9, 1));
        let records = vec![record(ymd(2025, 9, 1), "A", 10, 1, 1.0)];
        let comparison = compare(&records, window);
        assert_eq!(comparison.previous.record_count, 0);
        assert_eq!(comparison.delta_pct(MetricField::Ctr), 100.0);
        assert_eq!(comparison.delta_pct(MetricField::Reach), 0.0);
    }

    #[test]
    fn test_compare_by_key_order() {
        let window = PeriodWindow::from_ymd((2025, 9, 1), (2025, 9, 7)).unwrap();
        let records = vec![
            record(ymd(2025, 8, 30), "Old only", 100, 1, 1.0),
            record(ymd(2025, 9, 2), "B", 100, 1, 1.0),
            record(ymd(2025, 9, 3), "A", 100, 1, 1.0),
            record(ymd(2025, 8, 26), "A", 50, 1, 1.0),
        ];
        let per_creative = compare_by(&records, window, keys::by_creative_title);
        let names: Vec<&str> = per_creative.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "Old only"]);

        let (_, a) = &per_creative[1];
        assert!((a.delta_pct(MetricField::Impressions) - 100.0).abs() < 1e-9);
        let (_, old) = &per_creative[2];
        assert_eq!(old.current.record_count, 0);
        assert!((old.delta_pct(MetricField::Impressions) + 100.0).abs() < 1e-9);
    }
}
