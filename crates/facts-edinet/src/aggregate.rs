//! Assembly of normalized buckets into the canonical record.

use facts_core::{
    CanonicalRecord, ConsolidationType, Diagnostic, FactValue, Metric, Metrics, PeriodRole,
    YearBlock, YearBucket, normalize_security_code,
};

use crate::normalizer::NormalizedFiling;

/// Resolves a metric through its alternate chain, taking the first present value.
#[must_use]
pub fn resolve_metric(bucket: &YearBucket, metric: Metric) -> Option<FactValue> {
    metric
        .sources()
        .iter()
        .find_map(|&key| bucket.value(key))
}

/// Builds a year block, or `None` if every metric is null.
#[must_use]
pub fn year_block(bucket: &YearBucket) -> Option<YearBlock> {
    let metrics: Metrics = Metric::ALL
        .into_iter()
        .map(|metric| (metric, resolve_metric(bucket, metric)))
        .collect();

    if metrics.values().all(Option::is_none) {
        return None;
    }
    Some(YearBlock {
        metrics,
        period: bucket.period,
    })
}

/// Assembles the canonical record for one filing.
///
/// Returns the record and every diagnostic collected on the way, including
/// one per omitted year block.
#[must_use]
pub fn aggregate(filing: NormalizedFiling) -> (CanonicalRecord, Vec<Diagnostic>) {
    let NormalizedFiling {
        metadata,
        current,
        prior,
        mut diagnostics,
        ..
    } = filing;

    let mut block = |bucket: &YearBucket, role: PeriodRole| {
        let block = year_block(bucket);
        if block.is_none() {
            diagnostics.push(Diagnostic::YearBlockOmitted { role });
        }
        block
    };
    let current_year = block(&current, PeriodRole::Current);
    let prior_year = block(&prior, PeriodRole::Prior);

    let record = CanonicalRecord {
        doc_id: metadata.doc_id,
        security_code: metadata.security_code.as_deref().map(normalize_security_code),
        company_name: metadata.company_name,
        accounting_standard: metadata.accounting_standard,
        is_consolidated: metadata.is_consolidated,
        consolidation_type: ConsolidationType::from_flag(metadata.is_consolidated),
        fiscal_year_end: metadata.fiscal_year_end,
        report_type: metadata.report_type,
        current_year,
        prior_year,
    };
    (record, diagnostics)
}
