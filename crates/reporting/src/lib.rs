//! Campaign analytics: locale-aware cell parsing, record normalization,
//! re-aggregation, period comparison, pacing and dashboards.

pub mod aggregation;
pub mod comparison;
pub mod dashboard;
pub mod normalizer;
pub mod pacing;
pub mod parsers;
pub mod trend;

pub use aggregation::{aggregate, aggregate_all, top_n, AggregatedGroup, MetricField, SortOrder};
pub use comparison::{compare, compare_by, delta_pct, PeriodComparison, PeriodWindow};
pub use dashboard::{build_overview, CampaignDashboard, DashboardOverview, GroupBy, ReportFilter};
pub use normalizer::{NormalizedReport, RecordNormalizer};
pub use pacing::{monthly_pacing, PacingRow, PacingStatus};
pub use trend::{assess, Direction, Trend};
