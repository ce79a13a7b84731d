//! Canonical keys and output metrics.
//!
//! [`CanonicalKey`] names what a disclosed concept means, independent of the
//! accounting-standard-specific tag that carried it. [`Metric`] is the closed
//! set of values a canonical record publishes; several canonical keys may feed
//! one metric through an alternate-concept chain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statement group a canonical key is resolved in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    /// Profit and loss; flow concepts reported against durations.
    Pl,
    /// Balance sheet; point-in-time concepts reported against instants.
    Bs,
    /// Cash flow; flow concepts reported against durations.
    Cf,
    /// Dividends per share; reported against durations.
    Dividend,
}

/// How a matched value is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Whole-unit accounting amounts and share counts.
    Integer,
    /// Per-share and ratio-like values.
    Decimal,
}

/// Semantic name assigned to a matched concept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalKey {
    /// Revenue.
    NetSales,
    /// Operating income.
    OperatingIncome,
    /// Ordinary income (local GAAP).
    OrdinaryIncome,
    /// Profit attributable to owners of parent.
    ProfitLoss,

    /// Total assets.
    TotalAssets,
    /// Local GAAP shareholders' equity.
    ShareholdersEquity,
    /// IFRS equity attributable to owners of parent.
    EquityAttributableToOwners,
    /// Generic total equity.
    Equity,
    /// Net assets.
    NetAssets,
    /// Issued share count.
    TotalNumberOfIssuedShares,
    /// Cash and cash equivalents.
    CashAndEquivalents,
    /// Cash and deposits.
    CashAndDeposits,
    /// Short-term borrowings.
    ShortTermBorrowings,
    /// Current portion of long-term borrowings.
    CurrentPortionOfLongTermBorrowings,
    /// Commercial papers.
    CommercialPapers,
    /// Current portion of bonds.
    CurrentPortionOfBonds,
    /// Bonds payable.
    BondsPayable,
    /// Long-term borrowings.
    LongTermBorrowings,
    /// Current lease obligations.
    ShortTermLeaseObligations,
    /// Non-current lease obligations.
    LongTermLeaseObligations,
    /// Lease obligations without a term split.
    LeaseObligations,

    /// Cash flow from operating activities.
    OperatingCashFlow,
    /// Cash flow from investing activities.
    NetCashUsedInInvestingActivities,
    /// Cash flow from financing activities.
    NetCashProvidedByFinancingActivities,
    /// Depreciation and amortization.
    Depreciation,

    /// Dividend paid per share.
    DividendsPerShare,
}

impl CanonicalKey {
    /// Returns the statement group this key is resolved in.
    #[must_use]
    pub const fn statement(&self) -> Statement {
        match self {
            Self::NetSales | Self::OperatingIncome | Self::OrdinaryIncome | Self::ProfitLoss => {
                Statement::Pl
            }
            Self::OperatingCashFlow
            | Self::NetCashUsedInInvestingActivities
            | Self::NetCashProvidedByFinancingActivities
            | Self::Depreciation => Statement::Cf,
            Self::DividendsPerShare => Statement::Dividend,
            _ => Statement::Bs,
        }
    }

    /// Returns how values for this key are parsed.
    #[must_use]
    pub const fn value_kind(&self) -> ValueKind {
        match self {
            Self::DividendsPerShare => ValueKind::Decimal,
            _ => ValueKind::Integer,
        }
    }

    /// Returns the snake_case name used in serialized output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NetSales => "net_sales",
            Self::OperatingIncome => "operating_income",
            Self::OrdinaryIncome => "ordinary_income",
            Self::ProfitLoss => "profit_loss",
            Self::TotalAssets => "total_assets",
            Self::ShareholdersEquity => "shareholders_equity",
            Self::EquityAttributableToOwners => "equity_attributable_to_owners",
            Self::Equity => "equity",
            Self::NetAssets => "net_assets",
            Self::TotalNumberOfIssuedShares => "total_number_of_issued_shares",
            Self::CashAndEquivalents => "cash_and_equivalents",
            Self::CashAndDeposits => "cash_and_deposits",
            Self::ShortTermBorrowings => "short_term_borrowings",
            Self::CurrentPortionOfLongTermBorrowings => "current_portion_of_long_term_borrowings",
            Self::CommercialPapers => "commercial_papers",
            Self::CurrentPortionOfBonds => "current_portion_of_bonds",
            Self::BondsPayable => "bonds_payable",
            Self::LongTermBorrowings => "long_term_borrowings",
            Self::ShortTermLeaseObligations => "short_term_lease_obligations",
            Self::LongTermLeaseObligations => "long_term_lease_obligations",
            Self::LeaseObligations => "lease_obligations",
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::NetCashUsedInInvestingActivities => "net_cash_used_in_investing_activities",
            Self::NetCashProvidedByFinancingActivities => {
                "net_cash_provided_by_financing_activities"
            }
            Self::Depreciation => "depreciation",
            Self::DividendsPerShare => "dividends_per_share",
        }
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value published in a year block's `metrics`.
///
/// Declaration order is the serialized key order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Total assets.
    TotalAssets,
    /// Equity, resolved through the equity alternate chain.
    Equity,
    /// Revenue.
    NetSales,
    /// Operating income.
    OperatingIncome,
    /// Ordinary income.
    OrdinaryIncome,
    /// Profit attributable to owners of parent.
    NetIncomeAttributableToParent,
    /// Issued share count.
    TotalNumberOfIssuedShares,
    /// Cash, resolved through the cash alternate chain.
    CashAndEquivalents,
    /// Cash flow from operating activities.
    OperatingCashFlow,
    /// Depreciation and amortization.
    Depreciation,
    /// Dividend paid per share.
    DividendsPerShare,
    /// Short-term borrowings.
    ShortTermBorrowings,
    /// Current portion of long-term borrowings.
    CurrentPortionOfLongTermBorrowings,
    /// Commercial papers.
    CommercialPapers,
    /// Current portion of bonds.
    CurrentPortionOfBonds,
    /// Current lease obligations.
    ShortTermLeaseObligations,
    /// Bonds payable.
    BondsPayable,
    /// Long-term borrowings.
    LongTermBorrowings,
    /// Non-current lease obligations.
    LongTermLeaseObligations,
    /// Lease obligations without a term split.
    LeaseObligations,
}

impl Metric {
    /// Every metric, in output order.
    pub const ALL: [Self; 20] = [
        Self::TotalAssets,
        Self::Equity,
        Self::NetSales,
        Self::OperatingIncome,
        Self::OrdinaryIncome,
        Self::NetIncomeAttributableToParent,
        Self::TotalNumberOfIssuedShares,
        Self::CashAndEquivalents,
        Self::OperatingCashFlow,
        Self::Depreciation,
        Self::DividendsPerShare,
        Self::ShortTermBorrowings,
        Self::CurrentPortionOfLongTermBorrowings,
        Self::CommercialPapers,
        Self::CurrentPortionOfBonds,
        Self::ShortTermLeaseObligations,
        Self::BondsPayable,
        Self::LongTermBorrowings,
        Self::LongTermLeaseObligations,
        Self::LeaseObligations,
    ];

    /// Canonical keys this metric is resolved from, highest priority first.
    #[must_use]
    pub const fn sources(&self) -> &'static [CanonicalKey] {
        match self {
            Self::TotalAssets => &[CanonicalKey::TotalAssets],
            Self::Equity => &[
                CanonicalKey::ShareholdersEquity,
                CanonicalKey::EquityAttributableToOwners,
                CanonicalKey::Equity,
                CanonicalKey::NetAssets,
            ],
            Self::NetSales => &[CanonicalKey::NetSales],
            Self::OperatingIncome => &[CanonicalKey::OperatingIncome],
            Self::OrdinaryIncome => &[CanonicalKey::OrdinaryIncome],
            Self::NetIncomeAttributableToParent => &[CanonicalKey::ProfitLoss],
            Self::TotalNumberOfIssuedShares => &[CanonicalKey::TotalNumberOfIssuedShares],
            Self::CashAndEquivalents => &[
                CanonicalKey::CashAndEquivalents,
                CanonicalKey::CashAndDeposits,
            ],
            Self::OperatingCashFlow => &[CanonicalKey::OperatingCashFlow],
            Self::Depreciation => &[CanonicalKey::Depreciation],
            Self::DividendsPerShare => &[CanonicalKey::DividendsPerShare],
            Self::ShortTermBorrowings => &[CanonicalKey::ShortTermBorrowings],
            Self::CurrentPortionOfLongTermBorrowings => {
                &[CanonicalKey::CurrentPortionOfLongTermBorrowings]
            }
            Self::CommercialPapers => &[CanonicalKey::CommercialPapers],
            Self::CurrentPortionOfBonds => &[CanonicalKey::CurrentPortionOfBonds],
            Self::ShortTermLeaseObligations => &[CanonicalKey::ShortTermLeaseObligations],
            Self::BondsPayable => &[CanonicalKey::BondsPayable],
            Self::LongTermBorrowings => &[CanonicalKey::LongTermBorrowings],
            Self::LongTermLeaseObligations => &[CanonicalKey::LongTermLeaseObligations],
            Self::LeaseObligations => &[CanonicalKey::LeaseObligations],
        }
    }

    /// Returns the snake_case name used in serialized output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TotalAssets => "total_assets",
            Self::Equity => "equity",
            Self::NetSales => "net_sales",
            Self::OperatingIncome => "operating_income",
            Self::OrdinaryIncome => "ordinary_income",
            Self::NetIncomeAttributableToParent => "net_income_attributable_to_parent",
            Self::TotalNumberOfIssuedShares => "total_number_of_issued_shares",
            Self::CashAndEquivalents => "cash_and_equivalents",
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::Depreciation => "depreciation",
            Self::DividendsPerShare => "dividends_per_share",
            Self::ShortTermBorrowings => "short_term_borrowings",
            Self::CurrentPortionOfLongTermBorrowings => "current_portion_of_long_term_borrowings",
            Self::CommercialPapers => "commercial_papers",
            Self::CurrentPortionOfBonds => "current_portion_of_bonds",
            Self::ShortTermLeaseObligations => "short_term_lease_obligations",
            Self::BondsPayable => "bonds_payable",
            Self::LongTermBorrowings => "long_term_borrowings",
            Self::LongTermLeaseObligations => "long_term_lease_obligations",
            Self::LeaseObligations => "lease_obligations",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
