//! Context resolution.
//!
//! Builds the map from context identifier to period and infers which period
//! end is "current" and which is "prior". Only duration end dates take part in
//! the inference; instants never do.

use chrono::{Datelike, NaiveDate};
use facts_core::{ContextEntry, ContextMap, Diagnostic, Period, PeriodAnchors};
use roxmltree::{Document, Node};

use crate::document::XBRLI_NS;

/// Contexts of one filing and the period anchors derived from them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextResolution {
    /// Well-formed contexts, in document order.
    pub contexts: ContextMap,
    /// Current and prior period ends.
    pub anchors: PeriodAnchors,
    /// Dropped contexts and anchor inference notes.
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolves every context declaration in the document.
///
/// Malformed declarations are dropped with a diagnostic; they never fail the
/// document.
#[must_use]
pub fn resolve_contexts(document: &Document<'_>) -> ContextResolution {
    let mut diagnostics = Vec::new();
    let mut contexts = ContextMap::new();

    let declarations = document
        .root_element()
        .descendants()
        .filter(|node| node.has_tag_name((XBRLI_NS, "context")));

    for declaration in declarations {
        match parse_context(&declaration) {
            Ok(entry) => contexts.insert(entry),
            Err(diagnostic) => diagnostics.push(diagnostic),
        }
    }

    let anchors = derive_anchors(&contexts);
    match anchors {
        PeriodAnchors { current: None, .. } => diagnostics.push(Diagnostic::NoDurationContexts),
        PeriodAnchors {
            current: Some(current),
            prior: None,
        } => diagnostics.push(Diagnostic::PriorPeriodAbsent { current }),
        _ => {}
    }

    ContextResolution {
        contexts,
        anchors,
        diagnostics,
    }
}

/// Derives the current and prior period ends from the duration contexts.
///
/// The current end is the latest duration end. The prior end is the latest
/// duration end falling in the calendar year before it; if there is none the
/// prior period is absent rather than approximated.
#[must_use]
pub fn derive_anchors(contexts: &ContextMap) -> PeriodAnchors {
    let Some(current) = contexts.duration_ends().max() else {
        return PeriodAnchors::default();
    };
    let prior = contexts
        .duration_ends()
        .filter(|end| end.year() == current.year() - 1)
        .max();

    PeriodAnchors {
        current: Some(current),
        prior,
    }
}

fn parse_context(node: &Node<'_, '_>) -> Result<ContextEntry, Diagnostic> {
    let id = node.attribute("id").map(str::trim).unwrap_or_default();
    let malformed = |reason: String| Diagnostic::MalformedContext {
        context_id: id.to_string(),
        reason,
    };

    if id.is_empty() {
        return Err(malformed("missing id".to_string()));
    }

    let period = node
        .descendants()
        .find(|n| n.has_tag_name((XBRLI_NS, "period")))
        .ok_or_else(|| malformed("missing period".to_string()))?;

    let instant = child_text(&period, "instant");
    let start = child_text(&period, "startDate");
    let end = child_text(&period, "endDate");

    let period = match (instant, start, end) {
        (Some(date), _, _) => Period::Instant {
            date: parse_date(date).map_err(&malformed)?,
        },
        (None, Some(start), Some(end)) => Period::Duration {
            start: parse_date(start).map_err(&malformed)?,
            end: parse_date(end).map_err(&malformed)?,
        },
        _ => return Err(malformed("neither instant nor start/end pair".to_string())),
    };

    Ok(ContextEntry {
        id: id.to_string(),
        period,
    })
}

/// Returns the trimmed, non-empty text of a period child element.
fn child_text<'a>(period: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    period
        .children()
        .find(|n| n.has_tag_name((XBRLI_NS, name)))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| format!("unparsable date '{text}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instance(contexts: &str) -> String {
        format!(
            r#"<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance">{contexts}</xbrli:xbrl>"#
        )
    }

    fn duration(id: &str, start: &str, end: &str) -> String {
        format!(
            r#"<xbrli:context id="{id}"><xbrli:period><xbrli:startDate>{start}</xbrli:startDate><xbrli:endDate>{end}</xbrli:endDate></xbrli:period></xbrli:context>"#
        )
    }

    fn instant(id: &str, at: &str) -> String {
        format!(
            r#"<xbrli:context id="{id}"><xbrli:period><xbrli:instant>{at}</xbrli:instant></xbrli:period></xbrli:context>"#
        )
    }

    fn resolve(contexts: &str) -> ContextResolution {
        let text = instance(contexts);
        let document = parse_document("S100TEST", &text).unwrap();
        resolve_contexts(&document)
    }

    #[test]
    fn test_current_and_prior() {
        let resolution = resolve(&format!(
            "{}{}{}{}",
            duration("CurrentYearDuration", "2024-04-01", "2025-03-31"),
            duration("Prior1YearDuration", "2023-04-01", "2024-03-31"),
            instant("CurrentYearInstant", "2025-03-31"),
            instant("FilingDateInstant", "2025-06-25"),
        ));

        assert_eq!(resolution.contexts.len(), 4);
        assert_eq!(resolution.anchors.current, Some(date(2025, 3, 31)));
        assert_eq!(resolution.anchors.prior, Some(date(2024, 3, 31)));
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn test_instants_do_not_anchor() {
        let resolution = resolve(&format!(
            "{}{}",
            duration("CurrentYearDuration", "2024-04-01", "2025-03-31"),
            instant("FilingDateInstant", "2026-06-25"),
        ));
        assert_eq!(resolution.anchors.current, Some(date(2025, 3, 31)));
    }

    #[test]
    fn test_prior_absent_not_approximated() {
        let resolution = resolve(&format!(
            "{}{}",
            duration("CurrentYearDuration", "2024-04-01", "2025-03-31"),
            duration("Prior2YearDuration", "2022-04-01", "2023-03-31"),
        ));

        assert_eq!(resolution.anchors.current, Some(date(2025, 3, 31)));
        assert_eq!(resolution.anchors.prior, None);
        assert_eq!(
            resolution.diagnostics,
            vec![Diagnostic::PriorPeriodAbsent {
                current: date(2025, 3, 31)
            }]
        );
    }

    #[test]
    fn test_prior_takes_latest_end_in_previous_year() {
        let resolution = resolve(&format!(
            "{}{}{}",
            duration("CurrentYearDuration", "2024-04-01", "2025-03-31"),
            duration("Prior1QuarterDuration", "2024-01-01", "2024-03-31"),
            duration("Prior1HalfDuration", "2023-07-01", "2023-12-31"),
        ));
        assert_eq!(resolution.anchors.prior, Some(date(2024, 3, 31)));
    }

    #[test]
    fn test_zero_durations() {
        let resolution = resolve(&instant("CurrentYearInstant", "2025-03-31"));
        assert_eq!(resolution.anchors, PeriodAnchors::default());
        assert_eq!(resolution.diagnostics, vec![Diagnostic::NoDurationContexts]);
    }

    #[test]
    fn test_malformed_contexts_dropped() {
        let resolution = resolve(&format!(
            "{}{}{}{}",
            duration("CurrentYearDuration", "2024-04-01", "2025-03-31"),
            duration("EmptyEnd", "2024-04-01", ""),
            instant("BadDate", "2025-13-45"),
            r#"<xbrli:context id="NoPeriod"/>"#,
        ));

        assert_eq!(resolution.contexts.len(), 1);
        assert!(resolution.contexts.get("EmptyEnd").is_none());
        assert!(resolution.contexts.get("BadDate").is_none());

        let dropped: Vec<_> = resolution
            .diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::MalformedContext { context_id, .. } => Some(context_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(dropped, vec!["EmptyEnd", "BadDate", "NoPeriod"]);
    }
}
