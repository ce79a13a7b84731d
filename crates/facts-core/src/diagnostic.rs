//! Diagnostics returned alongside resolution results.
//!
//! Recoverable conditions (a malformed context, an unparsable value, a missing
//! security code) do not abort resolution. They are collected as [`Diagnostic`]
//! values so the caller decides whether and how to report them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::keys::CanonicalKey;
use crate::types::PeriodRole;

/// How much attention a diagnostic deserves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Expected absence; useful when debugging a filing.
    Info,
    /// Something the filer disclosed could not be used.
    Warning,
}

/// A recoverable condition observed while resolving a filing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A context was dropped from the context map.
    MalformedContext {
        /// Context identifier, empty if the declaration had none.
        context_id: String,
        /// Why it was dropped.
        reason: String,
    },
    /// No duration contexts exist, so neither period can be anchored.
    NoDurationContexts,
    /// No duration ends exactly one calendar year before the current period.
    PriorPeriodAbsent {
        /// The current period end.
        current: NaiveDate,
    },
    /// A matched fact's value did not parse; the key stays null.
    UnparsableValue {
        /// Key the fact matched.
        key: CanonicalKey,
        /// Context the fact was reported against.
        context_ref: String,
        /// The raw value.
        value: String,
    },
    /// No security code was disclosed.
    SecurityCodeMissing,
    /// Every metric of a year was null, so its block was omitted.
    YearBlockOmitted {
        /// The omitted year.
        role: PeriodRole,
    },
}

impl Diagnostic {
    /// Returns the severity of this diagnostic.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::MalformedContext { .. }
            | Self::UnparsableValue { .. }
            | Self::SecurityCodeMissing => Severity::Warning,
            Self::NoDurationContexts
            | Self::PriorPeriodAbsent { .. }
            | Self::YearBlockOmitted { .. } => Severity::Info,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedContext { context_id, reason } => {
                write!(f, "context '{context_id}' dropped: {reason}")
            }
            Self::NoDurationContexts => write!(f, "no duration contexts"),
            Self::PriorPeriodAbsent { current } => {
                write!(f, "no prior period end one year before {current}")
            }
            Self::UnparsableValue {
                key,
                context_ref,
                value,
            } => write!(f, "{key} in {context_ref}: unparsable value '{value}'"),
            Self::SecurityCodeMissing => write!(f, "security code not found"),
            Self::YearBlockOmitted { role } => write!(f, "{role} omitted: no facts disclosed"),
        }
    }
}
