//! Ordered keyword tables mapping tag local names to canonical keys.
//!
//! A tag matches a row when its local name contains the row's keyword. Row
//! order is priority: for a given key the first row that yields a fact wins,
//! so summary-of-business-results and standard-specific concepts are listed
//! before the generic statement concepts they duplicate. Reordering rows
//! changes which disclosed concept is selected.

use facts_core::{CanonicalKey, Statement};

/// An ordered `(keyword, target)` table.
pub type TagTable<T> = &'static [(&'static str, T)];

/// Profit and loss concepts, reported against durations.
pub const PL_TAGS: TagTable<CanonicalKey> = &[
    ("NetSalesSummaryOfBusinessResults", CanonicalKey::NetSales),
    ("RevenueIFRSSummaryOfBusinessResults", CanonicalKey::NetSales),
    ("NetSales", CanonicalKey::NetSales),
    ("OperatingRevenue1SummaryOfBusinessResults", CanonicalKey::NetSales),
    ("OperatingRevenue2SummaryOfBusinessResults", CanonicalKey::NetSales),
    ("OperatingIncome", CanonicalKey::OperatingIncome),
    ("OperatingProfitLoss", CanonicalKey::OperatingIncome),
    ("OrdinaryIncomeSummaryOfBusinessResults", CanonicalKey::OrdinaryIncome),
    ("OrdinaryIncomeLossSummaryOfBusinessResults", CanonicalKey::OrdinaryIncome),
    ("OrdinaryIncome", CanonicalKey::OrdinaryIncome),
    (
        "ProfitLossAttributableToOwnersOfParentSummaryOfBusinessResults",
        CanonicalKey::ProfitLoss,
    ),
    (
        "ProfitLossAttributableToOwnersOfParentIFRSSummaryOfBusinessResults",
        CanonicalKey::ProfitLoss,
    ),
    ("ProfitLossAttributableToOwnersOfParent", CanonicalKey::ProfitLoss),
];

/// Balance sheet concepts, reported against instants.
pub const BS_TAGS: TagTable<CanonicalKey> = &[
    ("TotalAssetsSummaryOfBusinessResults", CanonicalKey::TotalAssets),
    ("TotalAssetsIFRSSummaryOfBusinessResults", CanonicalKey::TotalAssets),
    ("TotalAssets", CanonicalKey::TotalAssets),
    ("ShareholdersEquity", CanonicalKey::ShareholdersEquity),
    (
        "EquityAttributableToOwnersOfParentIFRSSummaryOfBusinessResults",
        CanonicalKey::EquityAttributableToOwners,
    ),
    (
        "EquityAttributableToOwnersOfParent",
        CanonicalKey::EquityAttributableToOwners,
    ),
    ("EquityIFRS", CanonicalKey::Equity),
    ("NetAssetsSummaryOfBusinessResults", CanonicalKey::NetAssets),
    ("NetAssets", CanonicalKey::NetAssets),
    (
        "TotalNumberOfIssuedSharesSummaryOfBusinessResults",
        CanonicalKey::TotalNumberOfIssuedShares,
    ),
    (
        "IssuedSharesTotalNumberOfSharesEtc",
        CanonicalKey::TotalNumberOfIssuedShares,
    ),
    (
        "NumberOfIssuedSharesAsOfFilingDateTotalNumberOfSharesEtc",
        CanonicalKey::TotalNumberOfIssuedShares,
    ),
    (
        "CashAndCashEquivalentsSummaryOfBusinessResults",
        CanonicalKey::CashAndEquivalents,
    ),
    (
        "CashAndCashEquivalentsIFRSSummaryOfBusinessResults",
        CanonicalKey::CashAndEquivalents,
    ),
    ("CashAndCashEquivalents", CanonicalKey::CashAndEquivalents),
    ("CashAndDeposits", CanonicalKey::CashAndDeposits),
    // Interest-bearing debt
    ("ShortTermBorrowings", CanonicalKey::ShortTermBorrowings),
    (
        "CurrentPortionOfLongTermBorrowings",
        CanonicalKey::CurrentPortionOfLongTermBorrowings,
    ),
    ("CommercialPapers", CanonicalKey::CommercialPapers),
    ("CurrentPortionOfBonds", CanonicalKey::CurrentPortionOfBonds),
    ("BondsPayable", CanonicalKey::BondsPayable),
    ("LongTermBorrowings", CanonicalKey::LongTermBorrowings),
    ("LeaseObligationsCL", CanonicalKey::ShortTermLeaseObligations),
    ("ShortTermLeaseObligations", CanonicalKey::ShortTermLeaseObligations),
    ("LeaseObligationsNCL", CanonicalKey::LongTermLeaseObligations),
    ("LongTermLeaseObligations", CanonicalKey::LongTermLeaseObligations),
    ("LeaseObligations", CanonicalKey::LeaseObligations),
    // IFRS debt concepts
    ("CurrentBorrowings", CanonicalKey::ShortTermBorrowings),
    ("NoncurrentBorrowings", CanonicalKey::LongTermBorrowings),
    ("CurrentLeaseLiabilities", CanonicalKey::ShortTermLeaseObligations),
    ("NoncurrentLeaseLiabilities", CanonicalKey::LongTermLeaseObligations),
];

/// Cash flow concepts, reported against durations.
pub const CF_TAGS: TagTable<CanonicalKey> = &[
    (
        "NetCashProvidedByUsedInOperatingActivitiesSummaryOfBusinessResults",
        CanonicalKey::OperatingCashFlow,
    ),
    (
        "CashFlowsFromUsedInOperatingActivitiesIFRSSummaryOfBusinessResults",
        CanonicalKey::OperatingCashFlow,
    ),
    (
        "NetCashProvidedByUsedInOperatingActivities",
        CanonicalKey::OperatingCashFlow,
    ),
    (
        "CashFlowsFromUsedInOperatingActivities",
        CanonicalKey::OperatingCashFlow,
    ),
    (
        "NetCashProvidedByUsedInInvestingActivities",
        CanonicalKey::NetCashUsedInInvestingActivities,
    ),
    (
        "NetCashProvidedByUsedInFinancingActivities",
        CanonicalKey::NetCashProvidedByFinancingActivities,
    ),
    ("DepreciationAndAmortizationOpeCF", CanonicalKey::Depreciation),
    ("DepreciationAndAmortisationExpense", CanonicalKey::Depreciation),
    ("DepreciationSGA", CanonicalKey::Depreciation),
];

/// Dividend concepts, reported against durations.
pub const DIVIDEND_TAGS: TagTable<CanonicalKey> = &[(
    "DividendPaidPerShareSummaryOfBusinessResults",
    CanonicalKey::DividendsPerShare,
)];

/// Entity metadata a filing discloses about itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeiField {
    /// Securities code.
    SecurityCode,
    /// Filer name.
    CompanyName,
    /// Accounting standard.
    AccountingStandard,
    /// Whether consolidated statements are prepared.
    ConsolidationFlag,
    /// End of the reporting period.
    PeriodEndDate,
    /// End of the fiscal year; overrides [`DeiField::PeriodEndDate`].
    FiscalYearEndDate,
}

/// Entity metadata concepts. Not period filtered.
pub const DEI_TAGS: TagTable<DeiField> = &[
    ("SecurityCodeDEI", DeiField::SecurityCode),
    ("CompanyName", DeiField::CompanyName),
    ("AccountingStandardsDEI", DeiField::AccountingStandard),
    (
        "WhetherConsolidatedFinancialStatementsArePrepared",
        DeiField::ConsolidationFlag,
    ),
    ("CurrentPeriodEndDateDEI", DeiField::PeriodEndDate),
    ("CurrentFiscalYearEndDateDEI", DeiField::FiscalYearEndDate),
];

/// Returns the keyword table for a statement group.
#[must_use]
pub const fn table_for(statement: Statement) -> TagTable<CanonicalKey> {
    match statement {
        Statement::Pl => PL_TAGS,
        Statement::Bs => BS_TAGS,
        Statement::Cf => CF_TAGS,
        Statement::Dividend => DIVIDEND_TAGS,
    }
}
