//! Statement types, reporting units and the canonical line-item taxonomy.
//!
//! # Sign convention
//!
//! Every [`CanonicalKey`] carries one [`SignRule`], applied identically to every
//! fiscal year so that year-over-year comparison is valid:
//!
//! - [`SignRule::AsReported`]: revenues, profits, totals, balances and net cash
//!   flows keep the sign the filer printed (a net loss stays negative).
//! - [`SignRule::Negative`]: costs, expenses and cash outflows are stored as
//!   negative contributions (`-|v|`), whether the filer printed them as
//!   positive amounts (typical on income statements) or in parentheses
//!   (typical on cash flow statements).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The financial statement a table or line item belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatementType {
    /// Income statement (statement of operations).
    Income,
    /// Balance sheet (statement of financial position).
    Balance,
    /// Cash flow statement.
    CashFlow,
}

/// Title fragments that never denote a primary statement.
const REJECTED_TITLE_FRAGMENTS: &[&str] = &[
    "parenthetical",
    "details",
    "detail ",
    "tables",
    "policies",
    "narrative",
    "stockholders' equity",
    "stockholders equity",
    "shareholders' equity",
    "shareholders equity",
    "changes in equity",
];

const INCOME_TITLES: &[&str] = &[
    "statements of operations",
    "statement of operations",
    "income statements",
    "income statement",
    "statements of income",
    "statement of income",
    "statements of earnings",
    "statement of earnings",
    "statements of comprehensive income",
    "statement of comprehensive income",
    "statements of comprehensive loss",
    "statement of comprehensive loss",
    "statements of comprehensive income (loss)",
    "statements of operations and comprehensive",
    "comprehensive income statements",
    "results of operations",
];

const BALANCE_TITLES: &[&str] = &[
    "balance sheets",
    "balance sheet",
    "statements of financial position",
    "statement of financial position",
    "statements of financial condition",
    "statement of financial condition",
];

const CASH_FLOW_TITLES: &[&str] = &[
    "statements of cash flows",
    "statement of cash flows",
    "cash flows statements",
    "cash flow statements",
    "cash flows statement",
    "statements of cash flow",
];

impl StatementType {
    /// All statement types in display order.
    pub const ALL: [Self; 3] = [Self::Income, Self::Balance, Self::CashFlow];

    /// Classifies a heading or report title as a primary statement.
    ///
    /// Matching is case-insensitive and tolerant of surrounding text such as
    /// "CONSOLIDATED" or "- USD ($) $ in Millions". Parenthetical, detail and
    /// equity statements are rejected.
    ///
    /// # Example
    /// ```
    /// use fundamentals_core::StatementType;
    ///
    /// assert_eq!(
    ///     StatementType::classify_title("CONSOLIDATED STATEMENTS OF OPERATIONS"),
    ///     Some(StatementType::Income)
    /// );
    /// assert_eq!(
    ///     StatementType::classify_title("Consolidated Balance Sheets (Parenthetical)"),
    ///     None
    /// );
    /// ```
    #[must_use]
    pub fn classify_title(title: &str) -> Option<Self> {
        let lower = title
            .to_lowercase()
            .replace(['\u{2019}', '\u{2018}'], "'")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        if REJECTED_TITLE_FRAGMENTS.iter().any(|f| lower.contains(f)) {
            return None;
        }

        // Cash flow before income: "statements of cash flows" never names an
        // income statement, but "income" appears in some cash flow titles.
        if CASH_FLOW_TITLES.iter().any(|t| lower.contains(t)) {
            return Some(Self::CashFlow);
        }
        if BALANCE_TITLES.iter().any(|t| lower.contains(t)) {
            return Some(Self::Balance);
        }
        if INCOME_TITLES.iter().any(|t| lower.contains(t)) {
            return Some(Self::Income);
        }
        None
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Income => "income statement",
            Self::Balance => "balance sheet",
            Self::CashFlow => "cash flow statement",
        };
        write!(f, "{s}")
    }
}

/// Reporting unit declared by a filing ("in thousands", "in millions").
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Whole units.
    #[default]
    Ones,
    /// Values are in thousands.
    Thousands,
    /// Values are in millions.
    Millions,
}

impl Unit {
    /// Returns the factor that converts a reported value to whole units.
    #[must_use]
    pub const fn multiplier(&self) -> f64 {
        match self {
            Self::Ones => 1.0,
            Self::Thousands => 1_000.0,
            Self::Millions => 1_000_000.0,
        }
    }
}

/// How a canonical line item's sign is normalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignRule {
    /// Keep the sign as reported.
    AsReported,
    /// Store as a negative contribution, `-|v|`.
    Negative,
}

impl SignRule {
    /// Applies the rule to a value.
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Self::AsReported => value,
            Self::Negative => -value.abs(),
        }
    }
}

/// Canonical line items.
///
/// Declaration order is the display order of rows in a
/// [`FinancialTable`](crate::table::FinancialTable): income statement, then
/// balance sheet, then cash flow statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalKey {
    // Income statement
    /// Total revenue / net sales.
    Revenue,
    /// Cost of revenue / cost of goods sold.
    CostOfRevenue,
    /// Gross profit / gross margin.
    GrossProfit,
    /// Research and development expense.
    ResearchAndDevelopment,
    /// Selling, general and administrative expense.
    SellingGeneralAdministrative,
    /// Total operating expenses.
    OperatingExpenses,
    /// Operating income (loss).
    OperatingIncome,
    /// Interest expense.
    InterestExpense,
    /// Income (loss) before income taxes.
    IncomeBeforeTax,
    /// Provision for income taxes.
    IncomeTaxExpense,
    /// Net income (loss).
    NetIncome,
    /// Basic earnings per share.
    EpsBasic,
    /// Diluted earnings per share.
    EpsDiluted,
    /// Weighted average basic shares.
    SharesBasic,
    /// Weighted average diluted shares.
    SharesDiluted,

    // Balance sheet
    /// Cash and cash equivalents.
    CashAndEquivalents,
    /// Short-term / marketable securities.
    ShortTermInvestments,
    /// Accounts receivable, net.
    AccountsReceivable,
    /// Inventories.
    Inventory,
    /// Total current assets.
    CurrentAssets,
    /// Property, plant and equipment, net.
    PropertyPlantEquipment,
    /// Goodwill.
    Goodwill,
    /// Total assets.
    TotalAssets,
    /// Accounts payable.
    AccountsPayable,
    /// Total current liabilities.
    CurrentLiabilities,
    /// Long-term debt, non-current.
    LongTermDebt,
    /// Total liabilities.
    TotalLiabilities,
    /// Total stockholders' equity.
    StockholdersEquity,
    /// Total liabilities and stockholders' equity.
    LiabilitiesAndEquity,

    // Cash flow statement
    /// Depreciation and amortization.
    DepreciationAmortization,
    /// Share-based compensation expense.
    StockBasedCompensation,
    /// Net cash from operating activities.
    OperatingCashFlow,
    /// Purchases of property and equipment.
    CapitalExpenditures,
    /// Net cash from investing activities.
    InvestingCashFlow,
    /// Dividends paid.
    DividendsPaid,
    /// Repurchases of common stock.
    ShareRepurchases,
    /// Net cash from financing activities.
    FinancingCashFlow,
}

impl CanonicalKey {
    /// All keys in display order.
    pub const ALL: [Self; 37] = [
        Self::Revenue,
        Self::CostOfRevenue,
        Self::GrossProfit,
        Self::ResearchAndDevelopment,
        Self::SellingGeneralAdministrative,
        Self::OperatingExpenses,
        Self::OperatingIncome,
        Self::InterestExpense,
        Self::IncomeBeforeTax,
        Self::IncomeTaxExpense,
        Self::NetIncome,
        Self::EpsBasic,
        Self::EpsDiluted,
        Self::SharesBasic,
        Self::SharesDiluted,
        Self::CashAndEquivalents,
        Self::ShortTermInvestments,
        Self::AccountsReceivable,
        Self::Inventory,
        Self::CurrentAssets,
        Self::PropertyPlantEquipment,
        Self::Goodwill,
        Self::TotalAssets,
        Self::AccountsPayable,
        Self::CurrentLiabilities,
        Self::LongTermDebt,
        Self::TotalLiabilities,
        Self::StockholdersEquity,
        Self::LiabilitiesAndEquity,
        Self::DepreciationAmortization,
        Self::StockBasedCompensation,
        Self::OperatingCashFlow,
        Self::CapitalExpenditures,
        Self::InvestingCashFlow,
        Self::DividendsPaid,
        Self::ShareRepurchases,
        Self::FinancingCashFlow,
    ];

    /// Returns the statement this key belongs to.
    #[must_use]
    pub const fn statement(&self) -> StatementType {
        match self {
            Self::Revenue
            | Self::CostOfRevenue
            | Self::GrossProfit
            | Self::ResearchAndDevelopment
            | Self::SellingGeneralAdministrative
            | Self::OperatingExpenses
            | Self::OperatingIncome
            | Self::InterestExpense
            | Self::IncomeBeforeTax
            | Self::IncomeTaxExpense
            | Self::NetIncome
            | Self::EpsBasic
            | Self::EpsDiluted
            | Self::SharesBasic
            | Self::SharesDiluted => StatementType::Income,
            Self::CashAndEquivalents
            | Self::ShortTermInvestments
            | Self::AccountsReceivable
            | Self::Inventory
            | Self::CurrentAssets
            | Self::PropertyPlantEquipment
            | Self::Goodwill
            | Self::TotalAssets
            | Self::AccountsPayable
            | Self::CurrentLiabilities
            | Self::LongTermDebt
            | Self::TotalLiabilities
            | Self::StockholdersEquity
            | Self::LiabilitiesAndEquity => StatementType::Balance,
            Self::DepreciationAmortization
            | Self::StockBasedCompensation
            | Self::OperatingCashFlow
            | Self::CapitalExpenditures
            | Self::InvestingCashFlow
            | Self::DividendsPaid
            | Self::ShareRepurchases
            | Self::FinancingCashFlow => StatementType::CashFlow,
        }
    }

    /// Returns the sign rule of this key.
    #[must_use]
    pub const fn sign_rule(&self) -> SignRule {
        match self {
            Self::CostOfRevenue
            | Self::ResearchAndDevelopment
            | Self::SellingGeneralAdministrative
            | Self::OperatingExpenses
            | Self::InterestExpense
            | Self::IncomeTaxExpense
            | Self::CapitalExpenditures
            | Self::DividendsPaid
            | Self::ShareRepurchases => SignRule::Negative,
            _ => SignRule::AsReported,
        }
    }

    /// Returns true for per-share amounts, which are never unit-scaled.
    #[must_use]
    pub const fn is_per_share(&self) -> bool {
        matches!(self, Self::EpsBasic | Self::EpsDiluted)
    }

    /// Returns true for share counts.
    #[must_use]
    pub const fn is_share_count(&self) -> bool {
        matches!(self, Self::SharesBasic | Self::SharesDiluted)
    }

    /// Human-readable row label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Revenue => "Revenue",
            Self::CostOfRevenue => "Cost of Revenue",
            Self::GrossProfit => "Gross Profit",
            Self::ResearchAndDevelopment => "Research and Development",
            Self::SellingGeneralAdministrative => "Selling, General and Administrative",
            Self::OperatingExpenses => "Operating Expenses",
            Self::OperatingIncome => "Operating Income",
            Self::InterestExpense => "Interest Expense",
            Self::IncomeBeforeTax => "Income Before Tax",
            Self::IncomeTaxExpense => "Income Tax Expense",
            Self::NetIncome => "Net Income",
            Self::EpsBasic => "EPS (Basic)",
            Self::EpsDiluted => "EPS (Diluted)",
            Self::SharesBasic => "Shares (Basic)",
            Self::SharesDiluted => "Shares (Diluted)",
            Self::CashAndEquivalents => "Cash and Equivalents",
            Self::ShortTermInvestments => "Short-term Investments",
            Self::AccountsReceivable => "Accounts Receivable",
            Self::Inventory => "Inventory",
            Self::CurrentAssets => "Current Assets",
            Self::PropertyPlantEquipment => "Property, Plant and Equipment",
            Self::Goodwill => "Goodwill",
            Self::TotalAssets => "Total Assets",
            Self::AccountsPayable => "Accounts Payable",
            Self::CurrentLiabilities => "Current Liabilities",
            Self::LongTermDebt => "Long-term Debt",
            Self::TotalLiabilities => "Total Liabilities",
            Self::StockholdersEquity => "Stockholders' Equity",
            Self::LiabilitiesAndEquity => "Liabilities and Equity",
            Self::DepreciationAmortization => "Depreciation and Amortization",
            Self::StockBasedCompensation => "Stock-based Compensation",
            Self::OperatingCashFlow => "Operating Cash Flow",
            Self::CapitalExpenditures => "Capital Expenditures",
            Self::InvestingCashFlow => "Investing Cash Flow",
            Self::DividendsPaid => "Dividends Paid",
            Self::ShareRepurchases => "Share Repurchases",
            Self::FinancingCashFlow => "Financing Cash Flow",
        }
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
