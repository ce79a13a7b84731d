//! Period classification, tag matching, and value parsing.

use facts_core::{
    ContextMap, FactValue, PeriodAnchors, PeriodKind, PeriodRole, RawFact, ValueKind,
};

use crate::tags::TagTable;

/// Context qualifier marking parent-only figures.
const NON_CONSOLIDATED: &str = "NonConsolidated";
/// The one member qualifier that is not a breakdown.
const NON_CONSOLIDATED_MEMBER: &str = "NonConsolidatedMember";

/// Period classification of a fact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    /// Current, prior, or neither.
    pub role: PeriodRole,
    /// Kind of the fact's context; `None` if the context is unknown.
    pub kind: Option<PeriodKind>,
}

/// Classifies a fact against the period anchors by exact date equality.
///
/// Durations compare their end date, instants their single date. A fact whose
/// context is not in the map classifies as [`PeriodRole::Neither`].
#[must_use]
pub fn classify(fact: &RawFact, contexts: &ContextMap, anchors: &PeriodAnchors) -> Classification {
    let Some(period) = contexts.get(&fact.context_ref) else {
        return Classification::default();
    };

    let date = Some(period.anchor_date());
    let role = if date == anchors.current {
        PeriodRole::Current
    } else if date == anchors.prior {
        PeriodRole::Prior
    } else {
        PeriodRole::Neither
    };

    Classification {
        role,
        kind: Some(period.kind()),
    }
}

/// Returns the target of the first row whose keyword the local name contains.
#[must_use]
pub fn match_tag<T: Copy>(local_name: &str, table: TagTable<T>) -> Option<T> {
    table
        .iter()
        .find(|(keyword, _)| local_name.contains(keyword))
        .map(|&(_, target)| target)
}

/// Returns true if the context identifier carries a member qualifier other
/// than the non-consolidated marker, i.e. the fact is a breakdown.
///
/// EDINET context identifiers append qualifiers with underscores, as in
/// `CurrentYearDuration_AutomotiveReportableSegmentMember`.
#[must_use]
pub fn has_member_dimension(context_ref: &str) -> bool {
    if !context_ref.contains("Member") {
        return false;
    }
    if context_ref.ends_with("_NonConsolidatedMember") {
        return false;
    }
    context_ref
        .split('_')
        .skip(1)
        .any(|part| part.contains("Member") && part != NON_CONSOLIDATED_MEMBER)
}

/// Returns true unless the context identifier carries the non-consolidated marker.
#[must_use]
pub fn is_consolidated_context(context_ref: &str) -> bool {
    !context_ref.contains(NON_CONSOLIDATED)
}

/// Parses a fact value. Empty or non-numeric text yields `None`.
///
/// The `decimals` attribute is a precision hint and is never applied.
#[must_use]
pub fn parse_value(raw: &str, kind: ValueKind) -> Option<FactValue> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    match kind {
        ValueKind::Integer => text.parse::<i64>().ok().map(FactValue::Integer),
        ValueKind::Decimal => text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(FactValue::Decimal),
    }
}

/// Parses the disclosed consolidation flag.
#[must_use]
pub fn parse_consolidation_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "有"
    )
}
