//! Fact normalization into per-year statement buckets and entity metadata.
//!
//! For each of the current and prior year, every statement table is walked
//! keyword by keyword. A keyword's candidates are the facts that contain it,
//! sit in the right period with the right period kind, and are not segment
//! breakdowns. Once a key holds a value, later keywords for it are ignored; a
//! keyword whose chosen fact does not parse leaves the key open for the next.

use facts_core::{
    ContextMap, Diagnostic, EntityMetadata, KeyValues, PeriodAnchors, PeriodKind, PeriodRole,
    RawFact, ReportType, Statement, YearBucket,
};

use crate::consolidation::resolve_consolidation;
use crate::matcher::{
    classify, has_member_dimension, match_tag, parse_consolidation_flag, parse_value,
};
use crate::tags::{DEI_TAGS, DeiField, table_for};

const STATEMENTS: [Statement; 4] = [
    Statement::Pl,
    Statement::Bs,
    Statement::Cf,
    Statement::Dividend,
];

/// Normalized view of one filing, ready for aggregation.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedFiling {
    /// Entity metadata.
    pub metadata: EntityMetadata,
    /// Current and prior period ends.
    pub anchors: PeriodAnchors,
    /// Current year statements.
    pub current: YearBucket,
    /// Prior year statements.
    pub prior: YearBucket,
    /// Unparsable values and missing metadata.
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds year buckets and entity metadata from extracted facts.
#[derive(Debug, Clone, Copy)]
pub struct FactNormalizer<'a> {
    facts: &'a [RawFact],
    contexts: &'a ContextMap,
    anchors: PeriodAnchors,
}

impl<'a> FactNormalizer<'a> {
    /// Creates a normalizer over the facts and contexts of one filing.
    #[must_use]
    pub const fn new(facts: &'a [RawFact], contexts: &'a ContextMap, anchors: PeriodAnchors) -> Self {
        Self {
            facts,
            contexts,
            anchors,
        }
    }

    /// Normalizes the filing.
    #[must_use]
    pub fn normalize(&self, doc_id: &str, report_type: ReportType) -> NormalizedFiling {
        let mut diagnostics = Vec::new();
        let metadata = self.entity_metadata(doc_id, report_type, &mut diagnostics);
        let current = self.year_bucket(PeriodRole::Current, &mut diagnostics);
        let prior = self.year_bucket(PeriodRole::Prior, &mut diagnostics);

        NormalizedFiling {
            metadata,
            anchors: self.anchors,
            current,
            prior,
            diagnostics,
        }
    }

    /// Builds the bucket for one year.
    pub fn year_bucket(&self, role: PeriodRole, diagnostics: &mut Vec<Diagnostic>) -> YearBucket {
        let mut bucket = YearBucket {
            period: self
                .anchors
                .for_role(role)
                .and_then(|end| self.contexts.duration_ending_on(end)),
            ..YearBucket::default()
        };
        for statement in STATEMENTS {
            *bucket.statement_mut(statement) = self.resolve_statement(statement, role, diagnostics);
        }
        bucket
    }

    /// Resolves every key of a statement table for one year.
    pub fn resolve_statement(
        &self,
        statement: Statement,
        role: PeriodRole,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> KeyValues {
        let table = table_for(statement);
        let kind = match statement {
            Statement::Bs => PeriodKind::Instant,
            Statement::Pl | Statement::Cf | Statement::Dividend => PeriodKind::Duration,
        };

        let eligible: Vec<&RawFact> = self
            .facts
            .iter()
            .filter(|fact| match_tag(fact.local_name(), table).is_some())
            .filter(|fact| !has_member_dimension(&fact.context_ref))
            .filter(|fact| {
                let classification = classify(fact, self.contexts, &self.anchors);
                classification.role == role && classification.kind == Some(kind)
            })
            .collect();

        let mut values = KeyValues::new();
        for &(keyword, key) in table {
            if matches!(values.get(&key), Some(Some(_))) {
                continue;
            }

            let candidates = eligible
                .iter()
                .copied()
                .filter(|fact| fact.local_name().contains(keyword));
            let Some(chosen) = resolve_consolidation(candidates) else {
                values.entry(key).or_insert(None);
                continue;
            };

            let parsed = parse_value(&chosen.value, key.value_kind());
            if parsed.is_none() && !chosen.value.is_empty() {
                diagnostics.push(Diagnostic::UnparsableValue {
                    key,
                    context_ref: chosen.context_ref.clone(),
                    value: chosen.value.clone(),
                });
            }
            values.insert(key, parsed);
        }
        values
    }

    /// Picks entity metadata. Not period filtered; consolidated contexts win.
    pub fn entity_metadata(
        &self,
        doc_id: &str,
        report_type: ReportType,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> EntityMetadata {
        let mut metadata = EntityMetadata::new(doc_id, report_type);
        let mut period_end = None;
        let mut fiscal_year_end = None;

        for &(keyword, field) in DEI_TAGS {
            let candidates = self
                .facts
                .iter()
                .filter(|fact| fact.local_name().contains(keyword));
            let Some(chosen) = resolve_consolidation(candidates) else {
                continue;
            };
            let text = Some(chosen.value.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            match field {
                DeiField::SecurityCode => metadata.security_code = text,
                DeiField::CompanyName => metadata.company_name = text,
                DeiField::AccountingStandard => metadata.accounting_standard = text,
                DeiField::ConsolidationFlag => {
                    metadata.is_consolidated = parse_consolidation_flag(&chosen.value);
                }
                DeiField::PeriodEndDate => period_end = text,
                DeiField::FiscalYearEndDate => fiscal_year_end = text,
            }
        }

        metadata.fiscal_year_end = fiscal_year_end.or(period_end);
        if metadata.security_code.is_none() {
            diagnostics.push(Diagnostic::SecurityCodeMissing);
        }
        metadata
    }
}
