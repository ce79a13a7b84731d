//! Consolidated versus non-consolidated candidate resolution.

use facts_core::RawFact;

use crate::matcher::is_consolidated_context;

/// Selects one fact from candidates given in document order.
///
/// The first consolidated candidate wins; failing that, the first
/// non-consolidated candidate; failing that, nothing. Dividend facts go
/// through the same fallback since they are often disclosed on a parent-only
/// basis.
pub fn resolve_consolidation<'a, I>(candidates: I) -> Option<&'a RawFact>
where
    I: IntoIterator<Item = &'a RawFact>,
{
    let mut non_consolidated = None;
    for fact in candidates {
        if is_consolidated_context(&fact.context_ref) {
            return Some(fact);
        }
        if non_consolidated.is_none() {
            non_consolidated = Some(fact);
        }
    }
    non_consolidated
}
