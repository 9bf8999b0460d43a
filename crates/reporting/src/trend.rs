//! Favorable/unfavorable interpretation of period deltas.
//!
//! The comparator only reports signed percentages; whether a rise is good
//! news depends on the metric and is decided here.

use crate::aggregation::MetricField;
use crate::comparison::PeriodComparison;
use serde::{Deserialize, Serialize};

/// Deltas smaller than this (in percentage points) are reported as flat.
pub const FLAT_THRESHOLD_PCT: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Favorable,
    Unfavorable,
    Flat,
}

/// Which way each metric should move.
pub fn policy(field: MetricField) -> Direction {
    match field {
        MetricField::Cpm | MetricField::Cpc => Direction::LowerIsBetter,
        MetricField::Cost | MetricField::Frequency => Direction::Neutral,
        MetricField::Impressions
        | MetricField::Clicks
        | MetricField::Reach
        | MetricField::VideoViews
        | MetricField::VideoViews25
        | MetricField::VideoViews50
        | MetricField::VideoViews75
        | MetricField::VideoCompletions
        | MetricField::Engagements
        | MetricField::Ctr
        | MetricField::Vtr
        | MetricField::ViewRate25
        | MetricField::ViewRate50
        | MetricField::ViewRate75 => Direction::HigherIsBetter,
    }
}

pub fn assess(field: MetricField, delta_pct: f64) -> Trend {
    if !delta_pct.is_finite() || delta_pct.abs() < FLAT_THRESHOLD_PCT {
        return Trend::Flat;
    }
    match (policy(field), delta_pct > 0.0) {
        (Direction::Neutral, _) => Trend::Flat,
        (Direction::HigherIsBetter, true) | (Direction::LowerIsBetter, false) => Trend::Favorable,
        (Direction::HigherIsBetter, false) | (Direction::LowerIsBetter, true) => {
            Trend::Unfavorable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricTrend {
    pub field: MetricField,
    pub delta_pct: f64,
    pub trend: Trend,
}

/// Trend for every delta in a comparison, in the comparison's metric order.
pub fn assess_comparison(comparison: &PeriodComparison) -> Vec<MetricTrend> {
    comparison
        .deltas
        .iter()
        .map(|delta| MetricTrend {
            field: delta.field,
            delta_pct: delta.delta_pct,
            trend: assess(delta.field, delta.delta_pct),
        })
        .collect()
}
