//! Core data types for filing facts and their reporting periods.
//!
//! This module defines the fundamental data structures:
//!
//! - [`RawFact`] - A disclosed value as extracted from the document
//! - [`Period`] - Duration or instant reporting period of a context
//! - [`ContextMap`] - Context identifiers mapped to periods, in document order
//! - [`PeriodAnchors`] - The inferred current and prior period end dates
//! - [`PeriodRole`] - Classification of a fact against the anchors

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single fact as it appears in the filing.
///
/// Produced once by the extractor and read-only thereafter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFact {
    /// Qualified concept name, `prefix:LocalName`.
    pub tag: String,
    /// Identifier of the context this fact is reported against.
    pub context_ref: String,
    /// Unit identifier, absent for non-numeric facts.
    pub unit_ref: Option<String>,
    /// Precision hint. Never used as a scaling factor.
    pub decimals: Option<String>,
    /// Trimmed text content.
    pub value: String,
}

impl RawFact {
    /// Creates a fact without unit or precision information.
    #[must_use]
    pub fn new(
        tag: impl Into<String>,
        context_ref: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            context_ref: context_ref.into(),
            unit_ref: None,
            decimals: None,
            value: value.into(),
        }
    }

    /// Sets the unit reference.
    #[must_use]
    pub fn with_unit(mut self, unit_ref: impl Into<String>) -> Self {
        self.unit_ref = Some(unit_ref.into());
        self
    }

    /// Sets the decimals precision hint.
    #[must_use]
    pub fn with_decimals(mut self, decimals: impl Into<String>) -> Self {
        self.decimals = Some(decimals.into());
        self
    }

    /// Returns the tag with its namespace prefix stripped.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.tag
            .rsplit_once(':')
            .map_or(self.tag.as_str(), |(_, local)| local)
    }
}

/// Kind of reporting period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    /// A start/end date range.
    Duration,
    /// A single point-in-time date.
    Instant,
}

/// Reporting period of a context. A context is exactly one variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Period {
    /// Flow period.
    Duration {
        /// First day of the period.
        start: NaiveDate,
        /// Last day of the period.
        end: NaiveDate,
    },
    /// Point in time.
    Instant {
        /// The balance date.
        date: NaiveDate,
    },
}

impl Period {
    /// Returns the period kind.
    #[must_use]
    pub const fn kind(&self) -> PeriodKind {
        match self {
            Self::Duration { .. } => PeriodKind::Duration,
            Self::Instant { .. } => PeriodKind::Instant,
        }
    }

    /// Returns the date this period is compared against the anchors with:
    /// the end date of a duration, or the date of an instant.
    #[must_use]
    pub const fn anchor_date(&self) -> NaiveDate {
        match *self {
            Self::Duration { end, .. } => end,
            Self::Instant { date } => date,
        }
    }

    /// Returns the start/end range of a duration.
    #[must_use]
    pub const fn as_range(&self) -> Option<PeriodRange> {
        match *self {
            Self::Duration { start, end } => Some(PeriodRange { start, end }),
            Self::Instant { .. } => None,
        }
    }
}

/// Start and end of a year block's flow period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodRange {
    /// First day of the period.
    pub start: NaiveDate,
    /// Last day of the period.
    pub end: NaiveDate,
}

/// A context declaration reduced to its identifier and period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Context identifier, referenced by facts via `contextRef`.
    pub id: String,
    /// Reporting period.
    pub period: Period,
}

/// Context identifiers mapped to their periods.
///
/// Iteration follows document order. A repeated identifier replaces the
/// earlier entry in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextMap {
    entries: Vec<ContextEntry>,
    index: HashMap<String, usize>,
}

impl ContextMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a context, replacing any entry with the same identifier.
    pub fn insert(&mut self, entry: ContextEntry) {
        match self.index.get(&entry.id) {
            Some(&position) => self.entries[position] = entry,
            None => {
                self.index.insert(entry.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Returns the period of the given context.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Period> {
        self.index.get(id).map(|&position| &self.entries[position].period)
    }

    /// Returns the number of contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no contexts were resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the contexts in document order.
    pub fn iter(&self) -> impl Iterator<Item = &ContextEntry> {
        self.entries.iter()
    }

    /// Returns the end dates of all duration contexts, in document order.
    pub fn duration_ends(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.iter().filter_map(|entry| match entry.period {
            Period::Duration { end, .. } => Some(end),
            Period::Instant { .. } => None,
        })
    }

    /// Returns the first duration in document order that ends on `end`.
    #[must_use]
    pub fn duration_ending_on(&self, end: NaiveDate) -> Option<PeriodRange> {
        self.entries
            .iter()
            .filter_map(|entry| entry.period.as_range())
            .find(|range| range.end == end)
    }
}

impl FromIterator<ContextEntry> for ContextMap {
    fn from_iter<I: IntoIterator<Item = ContextEntry>>(iter: I) -> Self {
        let mut map = Self::new();
        for entry in iter {
            map.insert(entry);
        }
        map
    }
}

/// The current and prior period end dates inferred for a filing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodAnchors {
    /// Latest duration end date.
    pub current: Option<NaiveDate>,
    /// Duration end date one calendar year before `current`.
    pub prior: Option<NaiveDate>,
}

impl PeriodAnchors {
    /// Returns the anchor date for a role.
    #[must_use]
    pub const fn for_role(&self, role: PeriodRole) -> Option<NaiveDate> {
        match role {
            PeriodRole::Current => self.current,
            PeriodRole::Prior => self.prior,
            PeriodRole::Neither => None,
        }
    }
}

/// Classification of a fact's context against the period anchors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodRole {
    /// Neither the current nor the prior period.
    #[default]
    Neither,
    /// The current period.
    Current,
    /// The prior period.
    Prior,
}

impl fmt::Display for PeriodRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neither => write!(f, "neither"),
            Self::Current => write!(f, "current_year"),
            Self::Prior => write!(f, "prior_year"),
        }
    }
}
