//! Synonym table mapping filer labels to canonical line items.
//!
//! Entries are written as they appear in filings and normalized with
//! [`normalize_label`](crate::normalize_label) when the table is first used,
//! so both sides of every comparison go through the same normalization.

use fundamentals_core::CanonicalKey;

/// Known labels per canonical key.
pub const SYNONYMS: &[(CanonicalKey, &[&str])] = &[
    // Income statement
    (
        CanonicalKey::Revenue,
        &[
            "Revenue",
            "Revenues",
            "Net revenue",
            "Net revenues",
            "Net sales",
            "Sales",
            "Net sales and revenue",
            "Revenues, net",
            "Operating revenues",
            "Net operating revenues",
            "Sales to customers",
            "Revenue from contracts with customers",
            "Total revenues and other income",
        ],
    ),
    (
        CanonicalKey::CostOfRevenue,
        &[
            "Cost of revenue",
            "Cost of revenues",
            "Cost of sales",
            "Cost of goods sold",
            "Cost of products sold",
            "Cost of net revenues",
            "Cost of goods and services sold",
            "Cost of sales, excluding depreciation and amortization",
        ],
    ),
    (
        CanonicalKey::GrossProfit,
        &["Gross profit", "Gross margin", "Gross profit (loss)"],
    ),
    (
        CanonicalKey::ResearchAndDevelopment,
        &[
            "Research and development",
            "Research and development expense",
            "Research and development expenses",
            "Research, development and engineering",
            "Technology and development",
            "Research and development costs",
        ],
    ),
    (
        CanonicalKey::SellingGeneralAdministrative,
        &[
            "Selling, general and administrative",
            "Selling, general and administrative expense",
            "Selling, general and administrative expenses",
            "SG&A",
            "Marketing, general and administrative",
            "Selling and administrative expenses",
        ],
    ),
    (
        CanonicalKey::OperatingExpenses,
        &[
            "Operating expenses",
            "Total operating expenses",
            "Costs and expenses",
            "Total costs and expenses",
            "Operating costs and expenses",
        ],
    ),
    (
        CanonicalKey::OperatingIncome,
        &[
            "Operating income",
            "Operating income (loss)",
            "Income from operations",
            "Income (loss) from operations",
            "Loss from operations",
            "Operating profit",
            "Operating loss",
        ],
    ),
    (
        CanonicalKey::InterestExpense,
        &[
            "Interest expense",
            "Interest expense, net",
            "Interest and debt expense",
            "Interest expense, net of amounts capitalized",
        ],
    ),
    (
        CanonicalKey::IncomeBeforeTax,
        &[
            "Income before provision for income taxes",
            "Income before income taxes",
            "Income (loss) before income taxes",
            "Loss before income taxes",
            "Earnings before income taxes",
            "Income before taxes",
            "Pretax income",
            "Income from continuing operations before income taxes",
            "Income (loss) before provision for (benefit from) income taxes",
        ],
    ),
    (
        CanonicalKey::IncomeTaxExpense,
        &[
            "Provision for income taxes",
            "Income tax expense",
            "Income taxes",
            "Provision for (benefit from) income taxes",
            "Income tax provision",
            "Income tax expense (benefit)",
            "(Benefit) provision for income taxes",
            "Benefit from income taxes",
        ],
    ),
    (
        CanonicalKey::NetIncome,
        &[
            "Net income",
            "Net income (loss)",
            "Net loss",
            "Net earnings",
            "Net earnings (loss)",
            "Net (loss) income",
            "Net income attributable to the company",
        ],
    ),
    (
        CanonicalKey::EpsBasic,
        &[
            "Basic",
            "Basic (in dollars per share)",
            "Basic earnings per share",
            "Earnings per share - Basic",
            "Basic net income per share",
            "Net income per share - Basic",
            "Net income (loss) per share - Basic",
            "Basic earnings per common share",
            "Basic net loss per share",
        ],
    ),
    (
        CanonicalKey::EpsDiluted,
        &[
            "Diluted",
            "Diluted (in dollars per share)",
            "Diluted earnings per share",
            "Earnings per share - Diluted",
            "Diluted net income per share",
            "Net income per share - Diluted",
            "Net income (loss) per share - Diluted",
            "Diluted earnings per common share",
            "Diluted net loss per share",
        ],
    ),
    (
        CanonicalKey::SharesBasic,
        &[
            "Basic",
            "Basic (in shares)",
            "Weighted average shares outstanding - Basic",
            "Weighted-average basic shares",
            "Basic weighted average shares",
            "Shares used in computing earnings per share - Basic",
            "Weighted average number of shares - Basic",
            "Weighted-average shares used to compute basic earnings per share",
        ],
    ),
    (
        CanonicalKey::SharesDiluted,
        &[
            "Diluted",
            "Diluted (in shares)",
            "Weighted average shares outstanding - Diluted",
            "Weighted-average diluted shares",
            "Diluted weighted average shares",
            "Shares used in computing earnings per share - Diluted",
            "Weighted average number of shares - Diluted",
            "Weighted-average shares used to compute diluted earnings per share",
        ],
    ),
    // Balance sheet
    (
        CanonicalKey::CashAndEquivalents,
        &[
            "Cash and cash equivalents",
            "Cash and equivalents",
            "Cash",
            "Cash and cash equivalents, at carrying value",
        ],
    ),
    (
        CanonicalKey::ShortTermInvestments,
        &[
            "Short-term investments",
            "Marketable securities",
            "Current marketable securities",
            "Short-term marketable securities",
            "Marketable securities, current",
        ],
    ),
    (
        CanonicalKey::AccountsReceivable,
        &[
            "Accounts receivable",
            "Accounts receivable, net",
            "Accounts receivable, less allowances",
            "Trade accounts receivable",
            "Trade receivables",
            "Receivables",
            "Receivables, net",
        ],
    ),
    (
        CanonicalKey::Inventory,
        &["Inventories", "Inventory", "Merchandise inventories", "Inventories, net"],
    ),
    (
        CanonicalKey::CurrentAssets,
        &["Total current assets", "Current assets"],
    ),
    (
        CanonicalKey::PropertyPlantEquipment,
        &[
            "Property, plant and equipment, net",
            "Property and equipment, net",
            "Property, plant and equipment",
            "Property and equipment",
            "Net property and equipment",
            "Property, equipment and software, net",
        ],
    ),
    (CanonicalKey::Goodwill, &["Goodwill"]),
    (CanonicalKey::TotalAssets, &["Total assets", "Assets"]),
    (
        CanonicalKey::AccountsPayable,
        &["Accounts payable", "Trade accounts payable", "Accounts payable, trade"],
    ),
    (
        CanonicalKey::CurrentLiabilities,
        &["Total current liabilities", "Current liabilities"],
    ),
    (
        CanonicalKey::LongTermDebt,
        &[
            "Long-term debt",
            "Long-term debt, net",
            "Non-current term debt",
            "Long-term borrowings",
        ],
    ),
    (
        CanonicalKey::TotalLiabilities,
        &["Total liabilities", "Liabilities"],
    ),
    (
        CanonicalKey::StockholdersEquity,
        &[
            "Total stockholders' equity",
            "Total shareholders' equity",
            "Stockholders' equity",
            "Shareholders' equity",
            "Total equity",
            "Total stockholders' equity (deficit)",
            "Total shareholders' equity (deficit)",
            "Total stockholders' deficit",
        ],
    ),
    (
        CanonicalKey::LiabilitiesAndEquity,
        &[
            "Total liabilities and stockholders' equity",
            "Total liabilities and shareholders' equity",
            "Total liabilities and equity",
            "Total liabilities and stockholders' equity (deficit)",
            "Total liabilities and stockholders' deficit",
        ],
    ),
    // Cash flow statement
    (
        CanonicalKey::DepreciationAmortization,
        &[
            "Depreciation and amortization",
            "Depreciation, amortization and other",
            "Depreciation and amortization expense",
            "Depreciation, depletion and amortization",
            "Depreciation",
        ],
    ),
    (
        CanonicalKey::StockBasedCompensation,
        &[
            "Share-based compensation expense",
            "Share-based compensation",
            "Stock-based compensation",
            "Stock-based compensation expense",
            "Stock compensation expense",
            "Employee stock-based compensation",
        ],
    ),
    (
        CanonicalKey::OperatingCashFlow,
        &[
            "Net cash provided by operating activities",
            "Cash generated by operating activities",
            "Net cash provided by (used in) operating activities",
            "Net cash from operating activities",
            "Net cash used in operating activities",
            "Net cash (used in) provided by operating activities",
        ],
    ),
    (
        CanonicalKey::CapitalExpenditures,
        &[
            "Purchases of property and equipment",
            "Purchases of property, plant and equipment",
            "Payments for acquisition of property, plant and equipment",
            "Capital expenditures",
            "Additions to property and equipment",
            "Expenditures for property and equipment",
            "Purchases of property and equipment, net",
        ],
    ),
    (
        CanonicalKey::InvestingCashFlow,
        &[
            "Net cash used in investing activities",
            "Cash generated by/(used in) investing activities",
            "Net cash provided by (used in) investing activities",
            "Net cash (used in) provided by investing activities",
            "Net cash from investing activities",
            "Net cash provided by investing activities",
        ],
    ),
    (
        CanonicalKey::DividendsPaid,
        &[
            "Dividends paid",
            "Payments for dividends and dividend equivalents",
            "Cash dividends paid",
            "Payment of dividends",
            "Dividends paid to stockholders",
        ],
    ),
    (
        CanonicalKey::ShareRepurchases,
        &[
            "Repurchases of common stock",
            "Repurchase of common stock",
            "Purchases of treasury stock",
            "Common stock repurchased",
            "Payments for repurchase of common stock",
            "Share repurchases",
        ],
    ),
    (
        CanonicalKey::FinancingCashFlow,
        &[
            "Net cash used in financing activities",
            "Cash used in financing activities",
            "Net cash provided by (used in) financing activities",
            "Net cash (used in) provided by financing activities",
            "Net cash from financing activities",
            "Net cash provided by financing activities",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_key_has_synonyms() {
        let keys: HashSet<CanonicalKey> = SYNONYMS.iter().map(|(k, _)| *k).collect();
        for key in CanonicalKey::ALL {
            assert!(keys.contains(&key), "{key:?} has no synonyms");
        }
        assert_eq!(SYNONYMS.len(), CanonicalKey::ALL.len());
    }
}
