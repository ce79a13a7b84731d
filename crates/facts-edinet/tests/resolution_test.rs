//! End-to-end resolution of EDINET instance documents.

use chrono::NaiveDate;
use facts_core::{
    ConsolidationType, Diagnostic, FactError, FactValue, FilingInput, FilingProcessor, Metric,
    PeriodRange, ReportType,
};
use facts_edinet::EdinetProcessor;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn duration(id: &str, start: &str, end: &str) -> String {
    format!(
        r#"<xbrli:context id="{id}"><xbrli:entity><xbrli:identifier scheme="http://disclosure.edinet-fsa.go.jp">E00001-000</xbrli:identifier></xbrli:entity><xbrli:period><xbrli:startDate>{start}</xbrli:startDate><xbrli:endDate>{end}</xbrli:endDate></xbrli:period></xbrli:context>"#
    )
}

fn instant(id: &str, at: &str) -> String {
    format!(
        r#"<xbrli:context id="{id}"><xbrli:entity><xbrli:identifier scheme="http://disclosure.edinet-fsa.go.jp">E00001-000</xbrli:identifier></xbrli:entity><xbrli:period><xbrli:instant>{at}</xbrli:instant></xbrli:period></xbrli:context>"#
    )
}

fn fact(tag: &str, context_ref: &str, value: &str) -> String {
    format!(r#"<{tag} contextRef="{context_ref}" unitRef="JPY" decimals="-6">{value}</{tag}>"#)
}

fn instance(body: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
    xmlns:link="http://www.xbrl.org/2003/linkbase"
    xmlns:xlink="http://www.w3.org/1999/xlink"
    xmlns:jppfs_cor="http://disclosure.edinet-fsa.go.jp/taxonomy/jppfs/2024-11-01/jppfs_cor"
    xmlns:jpcrp_cor="http://disclosure.edinet-fsa.go.jp/taxonomy/jpcrp/2024-11-01/jpcrp_cor"
    xmlns:jpigp_cor="http://disclosure.edinet-fsa.go.jp/taxonomy/jpigp/2024-11-01/jpigp_cor"
    xmlns:jpdei_cor="http://disclosure.edinet-fsa.go.jp/taxonomy/jpdei/2013-08-31/jpdei_cor">
  <link:schemaRef xlink:type="simple" xlink:href="jpcrp030000-asr-001_E00001-000_2025-03-31_01_2025-06-25.xsd"/>
  {}
</xbrli:xbrl>"#,
        body.join("\n  ")
    )
}

fn standard_contexts() -> Vec<String> {
    vec![
        duration("CurrentYearDuration", "2024-04-01", "2025-03-31"),
        duration("Prior1YearDuration", "2023-04-01", "2024-03-31"),
        instant("CurrentYearInstant", "2025-03-31"),
        instant("Prior1YearInstant", "2024-03-31"),
        duration(
            "CurrentYearDuration_NonConsolidatedMember",
            "2024-04-01",
            "2025-03-31",
        ),
        instant("CurrentYearInstant_NonConsolidatedMember", "2025-03-31"),
        duration(
            "CurrentYearDuration_jpcrp030000-asr_E00001-000AutomotiveReportableSegmentMember",
            "2024-04-01",
            "2025-03-31",
        ),
        instant("FilingDateInstant", "2025-06-25"),
    ]
}

fn with_contexts(facts: &[String]) -> String {
    let mut body = standard_contexts();
    body.extend_from_slice(facts);
    instance(&body)
}

fn resolve(text: &str) -> facts_core::ProcessedFiling {
    EdinetProcessor::new()
        .resolve("S100TEST", text, ReportType::Annual)
        .unwrap()
}

/// A realistic Japanese GAAP annual report.
fn annual_report() -> String {
    with_contexts(&[
        fact("jpdei_cor:SecurityCodeDEI", "FilingDateInstant", "72030"),
        fact(
            "jpcrp_cor:CompanyNameCoverPage",
            "FilingDateInstant",
            "テスト自動車株式会社",
        ),
        fact("jpdei_cor:AccountingStandardsDEI", "FilingDateInstant", "Japan GAAP"),
        fact(
            "jpdei_cor:WhetherConsolidatedFinancialStatementsArePreparedDEI",
            "FilingDateInstant",
            "true",
        ),
        fact("jpdei_cor:CurrentFiscalYearEndDateDEI", "FilingDateInstant", "2025-03-31"),
        fact(
            "jpcrp_cor:NetSalesSummaryOfBusinessResults",
            "CurrentYearDuration",
            "48000000000",
        ),
        fact(
            "jpcrp_cor:NetSalesSummaryOfBusinessResults",
            "Prior1YearDuration",
            "45000000000",
        ),
        fact(
            "jpcrp_cor:NetSalesSummaryOfBusinessResults",
            "CurrentYearDuration_NonConsolidatedMember",
            "20000000000",
        ),
        fact("jppfs_cor:NetSales", "CurrentYearDuration", "47999000000"),
        fact(
            "jppfs_cor:NetSales",
            "CurrentYearDuration_jpcrp030000-asr_E00001-000AutomotiveReportableSegmentMember",
            "30000000000",
        ),
        fact("jppfs_cor:OperatingIncome", "CurrentYearDuration", "5000000000"),
        fact(
            "jpcrp_cor:OrdinaryIncomeLossSummaryOfBusinessResults",
            "CurrentYearDuration",
            "5200000000",
        ),
        fact(
            "jpcrp_cor:ProfitLossAttributableToOwnersOfParentSummaryOfBusinessResults",
            "CurrentYearDuration",
            "3500000000",
        ),
        fact(
            "jpcrp_cor:TotalAssetsSummaryOfBusinessResults",
            "CurrentYearInstant",
            "90000000000",
        ),
        fact(
            "jpcrp_cor:TotalAssetsSummaryOfBusinessResults",
            "Prior1YearInstant",
            "85000000000",
        ),
        fact("jppfs_cor:ShareholdersEquity", "CurrentYearInstant", "40000000000"),
        fact("jppfs_cor:NetAssets", "CurrentYearInstant", "42000000000"),
        fact("jppfs_cor:CashAndDeposits", "CurrentYearInstant", "8000000000"),
        fact("jppfs_cor:ShortTermBorrowings", "CurrentYearInstant", "1000000000"),
        fact("jppfs_cor:LeaseObligationsCL", "CurrentYearInstant", "10000000"),
        fact("jppfs_cor:LeaseObligationsNCL", "CurrentYearInstant", "30000000"),
        fact(
            "jppfs_cor:NetCashProvidedByUsedInOperatingActivities",
            "CurrentYearDuration",
            "6000000000",
        ),
        fact(
            "jppfs_cor:DepreciationAndAmortizationOpeCF",
            "CurrentYearDuration",
            "2100000000",
        ),
        fact(
            "jpcrp_cor:DividendPaidPerShareSummaryOfBusinessResults",
            "CurrentYearDuration_NonConsolidatedMember",
            "42.5",
        ),
    ])
}

#[test]
fn test_annual_report() {
    let processed = resolve(&annual_report());
    let record = &processed.record;

    assert_eq!(record.doc_id, "S100TEST");
    assert_eq!(record.security_code.as_deref(), Some("7203"));
    assert_eq!(record.company_name.as_deref(), Some("テスト自動車株式会社"));
    assert_eq!(record.accounting_standard.as_deref(), Some("Japan GAAP"));
    assert!(record.is_consolidated);
    assert_eq!(record.consolidation_type, ConsolidationType::Consolidated);
    assert_eq!(record.fiscal_year_end.as_deref(), Some("2025-03-31"));
    assert_eq!(record.report_type, ReportType::Annual);

    let current = record.current_year.as_ref().unwrap();
    assert_eq!(
        current.period,
        Some(PeriodRange {
            start: date(2024, 4, 1),
            end: date(2025, 3, 31)
        })
    );
    assert_eq!(current.get(Metric::NetSales), Some(FactValue::Integer(48_000_000_000)));
    assert_eq!(current.get(Metric::OperatingIncome), Some(FactValue::Integer(5_000_000_000)));
    assert_eq!(current.get(Metric::OrdinaryIncome), Some(FactValue::Integer(5_200_000_000)));
    assert_eq!(
        current.get(Metric::NetIncomeAttributableToParent),
        Some(FactValue::Integer(3_500_000_000))
    );
    assert_eq!(current.get(Metric::TotalAssets), Some(FactValue::Integer(90_000_000_000)));
    assert_eq!(current.get(Metric::Equity), Some(FactValue::Integer(40_000_000_000)));
    assert_eq!(
        current.get(Metric::CashAndEquivalents),
        Some(FactValue::Integer(8_000_000_000))
    );
    assert_eq!(
        current.get(Metric::ShortTermLeaseObligations),
        Some(FactValue::Integer(10_000_000))
    );
    assert_eq!(
        current.get(Metric::LongTermLeaseObligations),
        Some(FactValue::Integer(30_000_000))
    );
    // "LeaseObligations" is contained in both split concepts.
    assert_eq!(current.get(Metric::LeaseObligations), Some(FactValue::Integer(10_000_000)));
    assert_eq!(current.get(Metric::Depreciation), Some(FactValue::Integer(2_100_000_000)));
    assert_eq!(current.get(Metric::DividendsPerShare), Some(FactValue::Decimal(42.5)));
    assert_eq!(current.get(Metric::BondsPayable), None);
    assert_eq!(current.metrics.len(), Metric::ALL.len());

    let prior = record.prior_year.as_ref().unwrap();
    assert_eq!(prior.get(Metric::NetSales), Some(FactValue::Integer(45_000_000_000)));
    assert_eq!(prior.get(Metric::TotalAssets), Some(FactValue::Integer(85_000_000_000)));
    assert_eq!(prior.get(Metric::Equity), None);
}

#[test]
fn test_no_all_null_block_is_emitted() {
    let processed = resolve(&annual_report());
    for block in [&processed.record.current_year, &processed.record.prior_year]
        .into_iter()
        .flatten()
    {
        assert!(block.disclosed_count() > 0);
    }

    // Nothing disclosed for the prior year.
    let processed = resolve(&with_contexts(&[fact(
        "jppfs_cor:NetSales",
        "CurrentYearDuration",
        "100",
    )]));
    assert!(processed.record.current_year.is_some());
    assert!(processed.record.prior_year.is_none());
}

#[test]
fn test_equity_chain_prefers_highest_priority() {
    let processed = resolve(&with_contexts(&[
        fact("jppfs_cor:NetAssets", "CurrentYearInstant", "400"),
        fact("jpigp_cor:EquityIFRS", "CurrentYearInstant", "350"),
        fact(
            "jpigp_cor:EquityAttributableToOwnersOfParentIFRS",
            "CurrentYearInstant",
            "300",
        ),
    ]));
    let current = processed.record.current_year.unwrap();
    assert_eq!(current.get(Metric::Equity), Some(FactValue::Integer(300)));
}

#[test]
fn test_ifrs_owners_equity_resolves_equity() {
    let processed = resolve(&with_contexts(&[fact(
        "jpcrp_cor:EquityAttributableToOwnersOfParentIFRSSummaryOfBusinessResults",
        "CurrentYearInstant",
        "123456",
    )]));
    let current = processed.record.current_year.unwrap();
    assert_eq!(current.get(Metric::Equity), Some(FactValue::Integer(123_456)));
}

#[test]
fn test_segment_facts_excluded_everywhere() {
    let processed = resolve(&with_contexts(&[
        fact(
            "jppfs_cor:NetSales",
            "CurrentYearDuration_jpcrp030000-asr_E00001-000AutomotiveReportableSegmentMember",
            "999",
        ),
        fact("jppfs_cor:TotalAssets", "CurrentYearInstant", "10"),
    ]));
    let current = processed.record.current_year.unwrap();
    assert_eq!(current.get(Metric::NetSales), None);
    assert_eq!(current.get(Metric::TotalAssets), Some(FactValue::Integer(10)));
}

#[test]
fn test_total_assets_attaches_to_current_year() {
    let text = instance(&[
        duration("CurrentYearDuration", "2024-04-01", "2025-03-31"),
        duration("Prior1YearDuration", "2023-04-01", "2024-03-31"),
        instant("CurrentYearInstant", "2025-03-31"),
        fact("jppfs_cor:TotalAssets", "CurrentYearInstant", "5000"),
    ]);
    let processed = resolve(&text);
    let current = processed.record.current_year.unwrap();
    assert_eq!(current.get(Metric::TotalAssets), Some(FactValue::Integer(5000)));
    assert_eq!(current.period.map(|p| p.end), Some(date(2025, 3, 31)));
    assert!(processed.record.prior_year.is_none());
}

#[test]
fn test_consolidated_value_wins() {
    let processed = resolve(&with_contexts(&[
        fact(
            "jppfs_cor:TotalAssets",
            "CurrentYearInstant_NonConsolidatedMember",
            "300",
        ),
        fact("jppfs_cor:TotalAssets", "CurrentYearInstant", "700"),
    ]));
    let current = processed.record.current_year.unwrap();
    assert_eq!(current.get(Metric::TotalAssets), Some(FactValue::Integer(700)));
}

#[test]
fn test_zero_duration_contexts() {
    let text = instance(&[
        instant("CurrentYearInstant", "2025-03-31"),
        fact("jppfs_cor:TotalAssets", "CurrentYearInstant", "5000"),
        fact("jpdei_cor:SecurityCodeDEI", "CurrentYearInstant", "13010"),
    ]);
    let processed = resolve(&text);

    assert!(processed.record.current_year.is_none());
    assert!(processed.record.prior_year.is_none());
    assert!(processed.is_empty());
    assert_eq!(processed.record.security_code.as_deref(), Some("1301"));
    assert!(processed.diagnostics.contains(&Diagnostic::NoDurationContexts));
}

#[test]
fn test_prior_period_absent_without_exact_year() {
    let text = instance(&[
        duration("CurrentYearDuration", "2024-04-01", "2025-03-31"),
        duration("Prior2YearDuration", "2022-04-01", "2023-03-31"),
        fact("jppfs_cor:NetSales", "CurrentYearDuration", "10"),
        fact("jppfs_cor:NetSales", "Prior2YearDuration", "8"),
    ]);
    let processed = resolve(&text);
    assert!(processed.record.prior_year.is_none());
    assert!(processed.diagnostics.contains(&Diagnostic::PriorPeriodAbsent {
        current: date(2025, 3, 31)
    }));
}

#[test]
fn test_resolution_is_idempotent() {
    let text = annual_report();
    let first = serde_json::to_string(&resolve(&text).record).unwrap();
    let second = serde_json::to_string(&resolve(&text).record).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unparsable_values_become_null() {
    let processed = resolve(&with_contexts(&[
        fact("jppfs_cor:NetSales", "CurrentYearDuration", "△100"),
        fact("jppfs_cor:TotalAssets", "CurrentYearInstant", "10"),
    ]));
    let current = processed.record.current_year.unwrap();
    assert_eq!(current.get(Metric::NetSales), None);
    assert!(
        processed
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::UnparsableValue { value, .. } if value == "△100"))
    );
}

#[test]
fn test_structural_failures_are_fatal() {
    let processor = EdinetProcessor::new();

    let input = FilingInput::new("S100BAD", "not xml at all <");
    let err = processor.process(&input).unwrap_err();
    assert!(matches!(err, FactError::Xml { ref doc_id, .. } if doc_id == "S100BAD"));

    let input = FilingInput::new("S100BAD", "<root/>");
    let err = processor.process(&input).unwrap_err();
    assert!(matches!(err, FactError::StructurallyAbsent { .. }));
    assert!(err.is_fatal_for_filing());
}

#[test]
fn test_serialized_record_shape() {
    let processed = resolve(&annual_report());
    let json = serde_json::to_value(&processed.record).unwrap();

    assert_eq!(json["security_code"], "7203");
    assert_eq!(json["consolidation_type"], "consolidated");
    assert_eq!(json["report_type"], "annual");
    assert_eq!(json["current_year"]["metrics"]["total_assets"], 90_000_000_000_i64);
    assert_eq!(json["current_year"]["metrics"]["dividends_per_share"], 42.5);
    assert!(json["current_year"]["metrics"]["bonds_payable"].is_null());
    assert_eq!(json["current_year"]["period"]["start"], "2024-04-01");
    assert_eq!(json["current_year"]["period"]["end"], "2025-03-31");
}
