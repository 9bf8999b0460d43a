//! Monthly budget pacing: planned vs. actual spend and delivery.

use crate::aggregation::{aggregate, keys, safe_ratio, Measured, Metrics};
use crate::comparison::{days_in_month, PeriodWindow};
use campaign_core::types::{PacingRecord, Platform};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Additive planned/actual amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PacingTotals {
    pub planned_cost: f64,
    pub actual_cost: f64,
    pub planned_impressions: u64,
    pub actual_impressions: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PacingRatios {
    /// `actual_cost / planned_cost * 100` (0 when nothing is planned).
    pub pacing: f64,
    pub impression_pacing: f64,
    /// Never negative.
    pub remaining_budget: f64,
}

impl Metrics for PacingTotals {
    type Ratios = PacingRatios;

    fn accumulate(&mut self, other: &Self) {
        self.planned_cost += other.planned_cost;
        self.actual_cost += other.actual_cost;
        self.planned_impressions = self
            .planned_impressions
            .saturating_add(other.planned_impressions);
        self.actual_impressions = self.actual_impressions.saturating_add(other.actual_impressions);
    }

    fn ratios(&self) -> PacingRatios {
        PacingRatios {
            pacing: safe_ratio(self.actual_cost, self.planned_cost) * 100.0,
            impression_pacing: safe_ratio(
                self.actual_impressions as f64,
                self.planned_impressions as f64,
            ) * 100.0,
            remaining_budget: (self.planned_cost - self.actual_cost).max(0.0),
        }
    }
}

impl Measured for PacingRecord {
    type Totals = PacingTotals;

    fn totals(&self) -> PacingTotals {
        PacingTotals {
            planned_cost: self.planned_cost,
            actual_cost: self.actual_cost,
            planned_impressions: self.planned_impressions,
            actual_impressions: self.actual_impressions,
        }
    }
}

/// Describes whether a campaign is spending at the expected rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacingStatus {
    OnTrack,
    Underspending,
    Overspending,
    Exhausted,
    NotStarted,
}

#[allow(clippy::derivable_impls)]
impl Default for PacingStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// Fraction of `month` elapsed on `as_of`, counting `as_of` itself.
pub fn elapsed_fraction(month: NaiveDate, as_of: NaiveDate) -> f64 {
    let window = PeriodWindow::month_of(month);
    if as_of < window.start() {
        return 0.0;
    }
    if as_of > window.end() {
        return 1.0;
    }
    let elapsed = (as_of - window.start()).num_days() + 1;
    elapsed as f64 / f64::from(days_in_month(month.year(), month.month()))
}

/// Compare spend progress against calendar progress through the month.
pub fn pacing_status(totals: &PacingTotals, month: NaiveDate, as_of: NaiveDate) -> PacingStatus {
    let elapsed = elapsed_fraction(month, as_of);
    if elapsed <= 0.0 {
        return PacingStatus::NotStarted;
    }
    if totals.planned_cost <= 0.0 {
        // Unplanned spend can only be over plan.
        return if totals.actual_cost > 0.0 {
            PacingStatus::Overspending
        } else {
            PacingStatus::NotStarted
        };
    }
    if totals.actual_cost >= totals.planned_cost {
        return PacingStatus::Exhausted;
    }

    let spend_fraction = totals.actual_cost / totals.planned_cost;
    if spend_fraction > elapsed * 1.1 {
        PacingStatus::Overspending
    } else if spend_fraction < elapsed * 0.8 {
        PacingStatus::Underspending
    } else {
        PacingStatus::OnTrack
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PacingRow {
    pub month: NaiveDate,
    pub platform: Platform,
    pub campaign_count: usize,
    pub totals: PacingTotals,
    pub ratios: PacingRatios,
    pub status: PacingStatus,
}

/// One row per month and platform, ordered by month then first appearance.
pub fn monthly_pacing(records: &[PacingRecord], as_of: NaiveDate) -> Vec<PacingRow> {
    let mut months: Vec<NaiveDate> = records.iter().map(|r| r.month).collect();
    months.sort();
    months.dedup();

    let mut rows = Vec::new();
    for month in months {
        let in_month: Vec<&PacingRecord> = records.iter().filter(|r| r.month == month).collect();
        let groups = aggregate(&in_month, |r| keys::by_platform(r));
        for group in groups {
            let Some(platform) = in_month
                .iter()
                .find(|r| r.platform.label() == group.key)
                .map(|r| r.platform.clone())
            else {
                continue;
            };
            rows.push(PacingRow {
                month,
                status: pacing_status(&group.totals, month, as_of),
                platform,
                campaign_count: group.record_count,
                totals: group.totals,
                ratios: group.ratios,
            });
        }
    }
    tracing::debug!(rows = rows.len(), %as_of, "monthly pacing computed");
    rows
}
