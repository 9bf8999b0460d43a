use campaign_core::sheet::{ReportPayload, SheetTable};
use campaign_core::types::{Platform, ReportKind};
use campaign_reporting::aggregation::keys;
use campaign_reporting::{
    aggregate, build_overview, compare, GroupBy, MetricField, NormalizedReport, PeriodWindow,
    RecordNormalizer, ReportFilter,
};

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn creative_sheet() -> SheetTable {
    SheetTable::from_values(vec![
        row(&["Date", "Campaign name", "Ad name", "Impressions", "Clicks", "Amount spent"]),
        row(&["01/09/2025", "Seguro Celular", "A", "1.000", "10", "R$ 50,00"]),
        row(&["02/09/2025", "Seguro Celular", "A", "2.000", "30", "R$ 70,00"]),
        row(&["03/09/2025", "Seguro Celular", "B", "500", "1", "R$ 5,00"]),
        row(&["Total", "", "", "3.500", "41", "R$ 125,00"]),
        row(&["28/08/2025", "Seguro Celular", "A", "1.500", "10", "R$ 60,00"]),
    ])
}

#[test]
fn test_sheet_to_creative_groups() {
    let records = RecordNormalizer::default().creatives(&creative_sheet(), &Platform::Meta);
    assert_eq!(records.len(), 4);

    let window = PeriodWindow::from_ymd((2025, 9, 1), (2025, 9, 7)).unwrap();
    let in_window: Vec<_> = records.iter().filter(|r| window.contains(r.date)).collect();
    let groups = aggregate(&in_window, |r| keys::by_creative_title(r));

    let a = groups.iter().find(|g| g.key == "A").unwrap();
    assert_eq!(a.totals.impressions, 3000);
    assert_eq!(a.totals.clicks, 40);
    assert!((a.totals.cost - 120.0).abs() < 1e-9);
    assert!((a.ratios.ctr - 1.333).abs() < 1e-3);
    assert!((a.ratios.cpc - 3.0).abs() < 1e-9);
}

#[test]
fn test_payload_through_comparison() {
    let payload: ReportPayload = serde_json::from_str(
        r#"{
            "success": true,
            "data": {"values": [
                ["Data", "Campanha", "Criativo", "Impressões", "Cliques", "Investimento"],
                ["01/09/2025", "Seguro Auto", "Video 15s", "2.000", "20", "R$ 100,00"],
                ["27/08/2025", "Seguro Auto", "Video 15s", "1.000", "20", "R$ 100,00"]
            ]}
        }"#,
    )
    .unwrap();
    let table = payload.into_table().unwrap();
    let report = RecordNormalizer::default().normalize(&table, &Platform::TikTok, ReportKind::Creative);
    let NormalizedReport::Creatives(records) = report else {
        panic!("expected creative records");
    };

    let window = PeriodWindow::from_ymd((2025, 9, 1), (2025, 9, 7)).unwrap();
    let comparison = compare(&records, window);
    assert!((comparison.delta_pct(MetricField::Impressions) - 100.0).abs() < 1e-9);
    assert!((comparison.delta_pct(MetricField::Clicks)).abs() < 1e-9);
    assert!((comparison.delta_pct(MetricField::Cpm) + 50.0).abs() < 1e-9);
}

#[test]
fn test_failed_payload_is_an_error() {
    let payload: ReportPayload =
        serde_json::from_str(r#"{"success": false, "error": "sheet not shared"}"#).unwrap();
    assert!(payload.into_table().is_err());
}

#[test]
fn test_overview_serializes() {
    let records = RecordNormalizer::default().creatives(&creative_sheet(), &Platform::Meta);
    let window = PeriodWindow::from_ymd((2025, 9, 1), (2025, 9, 7)).unwrap();
    let overview = build_overview(&records, &ReportFilter::for_window(window), GroupBy::Creative, 1);
    assert_eq!(overview.top_groups[0].key, "A | Seguro Celular");

    let json = serde_json::to_value(&overview).unwrap();
    assert_eq!(json["group_by"], "creative");
    assert_eq!(json["top_groups"][0]["totals"]["impressions"], 3000);
}
