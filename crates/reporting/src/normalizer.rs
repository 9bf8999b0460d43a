//! Maps spreadsheet rows into typed records, one normalizer per report kind.
//!
//! Columns are resolved by header name through a [`ColumnMap`] of aliases,
//! once per table. Missing columns read as empty cells. Rows without a usable
//! date, or without primary volume, are not events and are skipped.

use crate::parsers::{
    parse_locale_currency, parse_locale_integer, parse_report_month, parse_sheet_date,
};
use campaign_core::sheet::SheetTable;
use campaign_core::types::{
    KeywordRecord, MetricCounters, MetricRecord, PacingRecord, Platform, RegionalRecord,
    ReportKind,
};
use serde::Serialize;
use tracing::debug;

/// Header aliases per target field. Comparison is case-insensitive.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub date: Vec<String>,
    pub month: Vec<String>,
    pub platform: Vec<String>,
    pub campaign: Vec<String>,
    pub creative: Vec<String>,
    pub region: Vec<String>,
    pub keyword: Vec<String>,
    pub impressions: Vec<String>,
    pub clicks: Vec<String>,
    pub reach: Vec<String>,
    pub cost: Vec<String>,
    pub video_views: Vec<String>,
    pub video_views_25: Vec<String>,
    pub video_views_50: Vec<String>,
    pub video_views_75: Vec<String>,
    pub video_completions: Vec<String>,
    pub engagements: Vec<String>,
    pub conversions: Vec<String>,
    pub planned_cost: Vec<String>,
    pub actual_cost: Vec<String>,
    pub planned_impressions: Vec<String>,
    pub actual_impressions: Vec<String>,
}

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            date: aliases(&["Date", "Day", "Data", "Dia", "Reporting starts", "Stat time"]),
            month: aliases(&["Month", "Mês", "Mes", "Período", "Periodo"]),
            platform: aliases(&["Platform", "Plataforma", "Veículo", "Veiculo", "Channel"]),
            campaign: aliases(&[
                "Campaign name",
                "Campaign",
                "Campanha",
                "Nome da campanha",
            ]),
            creative: aliases(&[
                "Ad name",
                "Creative",
                "Creative title",
                "Criativo",
                "Nome do anúncio",
                "Anúncio",
                "Pin name",
                "Video title",
                "Ad",
            ]),
            region: aliases(&["Region", "Região", "Regiao", "Estado", "State", "Location"]),
            keyword: aliases(&["Keyword", "Search keyword", "Palavra-chave", "Termo"]),
            impressions: aliases(&["Impressions", "Impressões", "Impressoes", "Impr."]),
            clicks: aliases(&[
                "Clicks",
                "Link clicks",
                "Clicks (all)",
                "Cliques",
                "Cliques no link",
            ]),
            reach: aliases(&["Reach", "Alcance", "Unique reach"]),
            cost: aliases(&[
                "Amount spent",
                "Amount spent (BRL)",
                "Cost",
                "Spend",
                "Investimento",
                "Valor usado",
                "Valor investido",
                "Custo",
            ]),
            video_views: aliases(&[
                "Video views",
                "Views",
                "Video plays",
                "Visualizações",
                "Visualizações de vídeo",
            ]),
            video_views_25: aliases(&[
                "Video played to 25%",
                "Video plays at 25%",
                "Video views at 25%",
                "Vídeo 25%",
            ]),
            video_views_50: aliases(&[
                "Video played to 50%",
                "Video plays at 50%",
                "Video views at 50%",
                "Vídeo 50%",
            ]),
            video_views_75: aliases(&[
                "Video played to 75%",
                "Video plays at 75%",
                "Video views at 75%",
                "Vídeo 75%",
            ]),
            video_completions: aliases(&[
                "Video played to 100%",
                "Video plays at 100%",
                "Video views at 100%",
                "Video completions",
                "Completed views",
                "ThruPlays",
                "Vídeo 100%",
            ]),
            engagements: aliases(&["Engagements", "Post engagement", "Engajamento", "Interações"]),
            conversions: aliases(&["Conversions", "Conversões", "Conversoes"]),
            planned_cost: aliases(&[
                "Planned cost",
                "Planned",
                "Budget",
                "Orçamento",
                "Investimento previsto",
                "Previsto",
            ]),
            actual_cost: aliases(&[
                "Actual cost",
                "Actual",
                "Spent",
                "Investimento realizado",
                "Realizado",
            ]),
            planned_impressions: aliases(&["Planned impressions", "Impressões previstas"]),
            actual_impressions: aliases(&["Actual impressions", "Impressões realizadas"]),
        }
    }
}

/// Counter column positions, resolved once per table.
struct CounterColumns {
    impressions: Option<usize>,
    clicks: Option<usize>,
    reach: Option<usize>,
    cost: Option<usize>,
    video_views: Option<usize>,
    video_views_25: Option<usize>,
    video_views_50: Option<usize>,
    video_views_75: Option<usize>,
    video_completions: Option<usize>,
    engagements: Option<usize>,
}

impl CounterColumns {
    fn resolve(table: &SheetTable, columns: &ColumnMap) -> Self {
        Self {
            impressions: table.resolve(&columns.impressions),
            clicks: table.resolve(&columns.clicks),
            reach: table.resolve(&columns.reach),
            cost: table.resolve(&columns.cost),
            video_views: table.resolve(&columns.video_views),
            video_views_25: table.resolve(&columns.video_views_25),
            video_views_50: table.resolve(&columns.video_views_50),
            video_views_75: table.resolve(&columns.video_views_75),
            video_completions: table.resolve(&columns.video_completions),
            engagements: table.resolve(&columns.engagements),
        }
    }

    fn read(&self, row: &[String]) -> MetricCounters {
        let int = |index| parse_locale_integer(SheetTable::cell_at(row, index));
        MetricCounters {
            impressions: int(self.impressions),
            clicks: int(self.clicks),
            reach: int(self.reach),
            cost: parse_locale_currency(SheetTable::cell_at(row, self.cost)),
            video_views: int(self.video_views),
            video_views_25: int(self.video_views_25),
            video_views_50: int(self.video_views_50),
            video_views_75: int(self.video_views_75),
            video_completions: int(self.video_completions),
            engagements: int(self.engagements),
        }
    }
}

/// Records produced for one report kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum NormalizedReport {
    Creatives(Vec<MetricRecord>),
    Regions(Vec<RegionalRecord>),
    Keywords(Vec<KeywordRecord>),
    Pacing(Vec<PacingRecord>),
}

impl NormalizedReport {
    pub fn len(&self) -> usize {
        match self {
            Self::Creatives(records) => records.len(),
            Self::Regions(records) => records.len(),
            Self::Keywords(records) => records.len(),
            Self::Pacing(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    columns: ColumnMap,
}

impl RecordNormalizer {
    pub fn new(columns: ColumnMap) -> Self {
        Self { columns }
    }

    pub fn normalize(
        &self,
        table: &SheetTable,
        platform: &Platform,
        kind: ReportKind,
    ) -> NormalizedReport {
        match kind {
            ReportKind::Creative => NormalizedReport::Creatives(self.creatives(table, platform)),
            ReportKind::Regional => NormalizedReport::Regions(self.regions(table, platform)),
            ReportKind::Keyword => NormalizedReport::Keywords(self.keywords(table, platform)),
            ReportKind::MonthlyPacing => NormalizedReport::Pacing(self.pacing(table, platform)),
        }
    }

    /// Creative performance rows. `platform` applies unless the sheet carries
    /// its own platform column.
    pub fn creatives(&self, table: &SheetTable, platform: &Platform) -> Vec<MetricRecord> {
        let date = table.resolve(&self.columns.date);
        let platform_col = table.resolve(&self.columns.platform);
        let campaign = table.resolve(&self.columns.campaign);
        let creative = table.resolve(&self.columns.creative);
        let counters = CounterColumns::resolve(table, &self.columns);

        let records: Vec<MetricRecord> = table
            .rows()
            .iter()
            .filter_map(|row| {
                let date = parse_sheet_date(SheetTable::cell_at(row, date))?;
                let counters = counters.read(row);
                if counters.impressions == 0 {
                    return None;
                }
                Some(MetricRecord {
                    date,
                    platform: row_platform(row, platform_col, platform),
                    campaign_name: SheetTable::cell_at(row, campaign).to_string(),
                    creative_title: SheetTable::cell_at(row, creative).to_string(),
                    counters,
                })
            })
            .collect();

        log_skipped("creative", platform, table.len(), records.len());
        records
    }

    pub fn regions(&self, table: &SheetTable, platform: &Platform) -> Vec<RegionalRecord> {
        let date = table.resolve(&self.columns.date);
        let platform_col = table.resolve(&self.columns.platform);
        let region = table.resolve(&self.columns.region);
        let counters = CounterColumns::resolve(table, &self.columns);

        let records: Vec<RegionalRecord> = table
            .rows()
            .iter()
            .filter_map(|row| {
                let date = parse_sheet_date(SheetTable::cell_at(row, date))?;
                let counters = counters.read(row);
                if counters.impressions == 0 {
                    return None;
                }
                Some(RegionalRecord {
                    date,
                    platform: row_platform(row, platform_col, platform),
                    region: SheetTable::cell_at(row, region).to_string(),
                    counters,
                })
            })
            .collect();

        log_skipped("regional", platform, table.len(), records.len());
        records
    }

    pub fn keywords(&self, table: &SheetTable, platform: &Platform) -> Vec<KeywordRecord> {
        let date = table.resolve(&self.columns.date);
        let platform_col = table.resolve(&self.columns.platform);
        let campaign = table.resolve(&self.columns.campaign);
        let keyword = table.resolve(&self.columns.keyword);
        let conversions = table.resolve(&self.columns.conversions);
        let counters = CounterColumns::resolve(table, &self.columns);

        let records: Vec<KeywordRecord> = table
            .rows()
            .iter()
            .filter_map(|row| {
                let date = parse_sheet_date(SheetTable::cell_at(row, date))?;
                let counters = counters.read(row);
                if counters.impressions == 0 {
                    return None;
                }
                Some(KeywordRecord {
                    date,
                    platform: row_platform(row, platform_col, platform),
                    campaign_name: SheetTable::cell_at(row, campaign).to_string(),
                    keyword: SheetTable::cell_at(row, keyword).to_string(),
                    counters,
                    conversions: parse_locale_integer(SheetTable::cell_at(row, conversions)),
                })
            })
            .collect();

        log_skipped("keyword", platform, table.len(), records.len());
        records
    }

    /// Monthly pacing rows. A row with neither planned nor actual spend is
    /// not an event.
    pub fn pacing(&self, table: &SheetTable, platform: &Platform) -> Vec<PacingRecord> {
        let month = table.resolve(&self.columns.month);
        let date = table.resolve(&self.columns.date);
        let platform_col = table.resolve(&self.columns.platform);
        let campaign = table.resolve(&self.columns.campaign);
        let planned_cost = table.resolve(&self.columns.planned_cost);
        let actual_cost = table.resolve(&self.columns.actual_cost);
        let planned_impressions = table.resolve(&self.columns.planned_impressions);
        let actual_impressions = table.resolve(&self.columns.actual_impressions);

        let records: Vec<PacingRecord> = table
            .rows()
            .iter()
            .filter_map(|row| {
                let month = parse_report_month(SheetTable::cell_at(row, month))
                    .or_else(|| parse_report_month(SheetTable::cell_at(row, date)))?;
                let planned = parse_locale_currency(SheetTable::cell_at(row, planned_cost));
                let actual = parse_locale_currency(SheetTable::cell_at(row, actual_cost));
                if planned == 0.0 && actual == 0.0 {
                    return None;
                }
                Some(PacingRecord {
                    month,
                    platform: row_platform(row, platform_col, platform),
                    campaign_name: SheetTable::cell_at(row, campaign).to_string(),
                    planned_cost: planned,
                    actual_cost: actual,
                    planned_impressions: parse_locale_integer(SheetTable::cell_at(
                        row,
                        planned_impressions,
                    )),
                    actual_impressions: parse_locale_integer(SheetTable::cell_at(
                        row,
                        actual_impressions,
                    )),
                })
            })
            .collect();

        log_skipped("monthly_pacing", platform, table.len(), records.len());
        records
    }
}

fn row_platform(row: &[String], column: Option<usize>, fallback: &Platform) -> Platform {
    match SheetTable::cell_at(row, column) {
        "" => fallback.clone(),
        label => Platform::from_label(label),
    }
}

fn log_skipped(report: &str, platform: &Platform, rows: usize, kept: usize) {
    debug!(
        report,
        platform = %platform,
        rows,
        kept,
        skipped = rows - kept,
        "Normalized report rows"
    );
}

pub fn normalize_creatives(table: &SheetTable, platform: &Platform) -> Vec<MetricRecord> {
    RecordNormalizer::default().creatives(table, platform)
}

pub fn normalize_regions(table: &SheetTable, platform: &Platform) -> Vec<RegionalRecord> {
    RecordNormalizer::default().regions(table, platform)
}

pub fn normalize_keywords(table: &SheetTable, platform: &Platform) -> Vec<KeywordRecord> {
    RecordNormalizer::default().keywords(table, platform)
}

pub fn normalize_pacing(table: &SheetTable, platform: &Platform) -> Vec<PacingRecord> {
    RecordNormalizer::default().pacing(table, platform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(rows: &[&[&str]]) -> SheetTable {
        SheetTable::from_values(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_creatives_by_header_name() {
        let sheet = table(&[
            &["Amount spent", "Impressions", "Ad name", "Campaign name", "Date", "Clicks"],
            &["R$ 50,00", "1.000", "Banner A", "Always On", "01/09/2025", "10"],
        ]);
        let records = normalize_creatives(&sheet, &Platform::Meta);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert_eq!(record.platform, Platform::Meta);
        assert_eq!(record.creative_title, "Banner A");
        assert_eq!(record.campaign_name, "Always On");
        assert_eq!(record.counters.impressions, 1000);
        assert_eq!(record.counters.clicks, 10);
        assert!((record.counters.cost - 50.0).abs() < 1e-9);
        assert_eq!(record.counters.reach, 0);
    }

    #[test]
    fn test_skips_non_events() {
        let sheet = table(&[
            &["Data", "Criativo", "Impressões", "Investimento"],
            &["", "Sem data", "500", "R$ 1,00"],
            &["02/09/2025", "Sem volume", "0", "R$ 1,00"],
            &["02/09/2025", "Vazio", "", ""],
            &["02/09/2025", "Ok", "700", "R$ 3,50"],
            &["Total", "", "1.200", "R$ 5,50"],
        ]);
        let records = normalize_creatives(&sheet, &Platform::TikTok);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].creative_title, "Ok");
        assert_eq!(records[0].counters.impressions, 700);
    }

    #[test]
    fn test_platform_column_overrides_default() {
        let sheet = table(&[
            &["Date", "Platform", "Impressions"],
            &["2025-09-01", "Instagram", "10"],
            &["2025-09-01", "", "10"],
        ]);
        let records = normalize_creatives(&sheet, &Platform::Pinterest);
        assert_eq!(records[0].platform, Platform::Meta);
        assert_eq!(records[1].platform, Platform::Pinterest);
    }

    #[test]
    fn test_video_counters() {
        let sheet = table(&[
            &[
                "Date",
                "Impressions",
                "Video views",
                "Video played to 25%",
                "Video played to 50%",
                "Video played to 75%",
                "Video played to 100%",
            ],
            &["2025-09-01", "1.000", "800", "600", "400", "300", "200"],
        ]);
        let counters = normalize_creatives(&sheet, &Platform::YouTube)[0].counters;
        assert_eq!(counters.video_views, 800);
        assert_eq!(counters.video_views_25, 600);
        assert_eq!(counters.video_views_50, 400);
        assert_eq!(counters.video_views_75, 300);
        assert_eq!(counters.video_completions, 200);
    }

    #[test]
    fn test_regions_and_keywords() {
        let regions = table(&[
            &["Date", "Região", "Impressões", "Cliques"],
            &["01/09/2025", "São Paulo", "2.000", "20"],
        ]);
        let records = normalize_regions(&regions, &Platform::Meta);
        assert_eq!(records[0].region, "São Paulo");
        assert_eq!(records[0].counters.clicks, 20);

        let keywords = table(&[
            &["Day", "Keyword", "Campaign", "Impr.", "Clicks", "Cost", "Conversions"],
            &["2025-09-03", "seguro celular", "Search BR", "300", "12", "R$ 24,00", "2"],
        ]);
        let records = normalize_keywords(&keywords, &Platform::GoogleSearch);
        assert_eq!(records[0].keyword, "seguro celular");
        assert_eq!(records[0].conversions, 2);
        assert!((records[0].counters.cost - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_pacing_rows() {
        let sheet = table(&[
            &["Mês", "Campanha", "Investimento previsto", "Investimento realizado"],
            &["Setembro/2025", "Always On", "R$ 10.000,00", "R$ 4.500,00"],
            &["Outubro/2025", "Always On", "", ""],
            &["", "Sem mês", "R$ 1,00", "R$ 1,00"],
        ]);
        let records = normalize_pacing(&sheet, &Platform::LinkedIn);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].month, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert!((records[0].planned_cost - 10_000.0).abs() < 1e-9);
        assert!((records[0].actual_cost - 4_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_dispatch_and_empty_table() {
        let normalizer = RecordNormalizer::default();
        let empty = SheetTable::default();
        let report = normalizer.normalize(&empty, &Platform::Meta, ReportKind::Keyword);
        assert!(matches!(report, NormalizedReport::Keywords(ref r) if r.is_empty()));
        assert!(report.is_empty());
    }
}
