//! Static field table for the three worksheets.

use crate::{FieldDef, FieldGroup};

const fn field(id: &'static str, label: &'static str, hint: &'static str) -> FieldDef {
    FieldDef {
        id,
        label,
        hint: Some(hint),
        help_text: None,
    }
}

const fn field_with_help(
    id: &'static str,
    label: &'static str,
    hint: &'static str,
    help_text: &'static str,
) -> FieldDef {
    FieldDef {
        id,
        label,
        hint: Some(hint),
        help_text: Some(help_text),
    }
}

pub(crate) const ASSET_FIELDS: &[FieldDef] = &[
    field("cash_on_hand", "Cash on hand", "Physical currency"),
    field("checking", "Checking accounts", "All checking account balances"),
    field("savings", "Savings accounts", "All savings account balances"),
    field_with_help(
        "gold",
        "Gold (value in currency)",
        "All gold jewelry, bullion, coins by pure weight",
        "Count only the pure gold content of jewelry, coins and bars. Multiply the total pure weight by today's gold price per gram.",
    ),
    field(
        "silver",
        "Silver (value in currency)",
        "All silver jewelry, bullion, coins, silverware",
    ),
    field_with_help(
        "active_investments",
        "Active investments",
        "Stocks traded < 1 year at full market value",
        "Stocks, ETFs or funds bought and sold within the past year. Enter their full market value today.",
    ),
    field_with_help(
        "passive_investments",
        "Passive investments (CRI)",
        "Long-term stocks using the CRI method (about 30% of market value)",
        "Long-term holdings you do not actively trade. Under the CRI method only about 30% of market value counts: a fund worth 10,000 is entered as 3,000.",
    ),
    field_with_help(
        "dividends",
        "Dividend earnings",
        "Total dividend income received",
        "Cash paid to you by companies whose stock you own. Your brokerage statement lists the total for the year.",
    ),
    field_with_help(
        "capital_gains",
        "Capital gains on sales",
        "Gains from assets sold this year",
        "Profit from selling an asset above its purchase price: shares bought for 1,000 and sold for 1,500 give a gain of 500.",
    ),
    field_with_help(
        "retirement_401k",
        "401(k) / pension",
        "Net value if paying now; 0 if deferring until withdrawal",
        "Either include the balance net of early-withdrawal penalties and taxes, or enter 0 and pay when the money is withdrawn.",
    ),
    field_with_help(
        "retirement_ira",
        "IRA / Roth IRA",
        "Net value if paying now; 0 if deferring",
        "Same choice as a 401(k): pay now on the net value, or defer until withdrawal.",
    ),
    field_with_help(
        "education_accounts",
        "Education accounts (529, ESA)",
        "Only if not used for education expenses",
        "Include 529 plans and Coverdell ESAs only when the funds will not pay for education. Enter 0 while they fund current schooling.",
    ),
    field_with_help(
        "hsa",
        "Health Savings Account (HSA)",
        "Full aggregate balance, rolls over yearly",
        "HSA balances roll over every year and belong to you permanently. Include the full balance.",
    ),
    field_with_help(
        "real_estate_market",
        "Real estate (on market)",
        "Current market value of properties actively for sale",
        "Only properties you are actively selling. Your home and rentals you intend to keep are excluded.",
    ),
    field_with_help(
        "rental_income",
        "Rental income",
        "Net rental income from investment properties",
        "Rent collected minus property expenses such as repairs, management fees and maintenance.",
    ),
    field("cryptocurrency", "Cryptocurrency", "Total value in local currency"),
    field_with_help(
        "nfts_digital",
        "NFTs & digital assets",
        "Based on underlying asset rules",
        "Digital assets held for trade count at current market value. Items for personal use may be exempt.",
    ),
    field_with_help(
        "business_inventory",
        "Business inventory",
        "Unsold inventory not under contract",
        "Stock not yet sold or committed under contract. Equipment, tools and raw materials used to run the business are excluded.",
    ),
    field_with_help(
        "accounts_receivable",
        "Accounts receivable",
        "Money owed to you (collectible)",
        "Amounts customers owe you that you reasonably expect to collect. Written-off debts are excluded.",
    ),
    field_with_help(
        "good_debt",
        "Good debt owed to you",
        "Loans to others you can reasonably collect",
        "Money lent to someone able and expected to repay it.",
    ),
    field(
        "other_assets",
        "Other liable assets",
        "Collectibles for sale, livestock for sale, etc.",
    ),
];

pub(crate) const IMPERMISSIBLE_FIELDS: &[FieldDef] = &[
    field_with_help(
        "equity_haram",
        "Equity haram earnings",
        "(Prohibited income / Shares outstanding) x Your shares",
        "Your share of a company's prohibited income such as interest or alcohol revenue: prohibited income divided by shares outstanding, times the shares you hold.",
    ),
    field_with_help(
        "dividend_haram",
        "Dividend haram earnings",
        "(Prohibited income / Total income) x Dividend received",
        "The prohibited portion of dividends received. If 5% of a company's revenue is prohibited and you received 200 in dividends, enter 10.",
    ),
    field_with_help(
        "bond_interest",
        "Bond / interest earnings",
        "Interest earned from fixed-income instruments",
        "Interest from bonds, CDs, money market funds or savings accounts. Interest income must be removed from your wealth.",
    ),
];

pub(crate) const EXPENSE_FIELDS: &[FieldDef] = &[
    field("rent_mortgage", "Rent / mortgage (1 month)", "One month's housing payment"),
    field("medical", "Medical expenses", "Current period medical costs"),
    field("groceries", "Groceries & household", "One month's food and supplies"),
    field("utilities", "Utilities & telecom", "One month's utilities"),
    field("transport", "Transportation & fuel", "One month's transport costs"),
    field(
        "insurance",
        "Insurance payments",
        "Home, auto, medical: period-due amount",
    ),
    field_with_help(
        "property_tax",
        "Property taxes (period-due)",
        "Only the currently-due portion",
        "Only the portion currently due. An annual bill of 6,000 paid quarterly is entered as 1,500.",
    ),
    field_with_help(
        "delinquent_tax",
        "Delinquent taxes & fines",
        "Overdue taxes, fines, penalties",
        "Overdue taxes, unpaid tickets, court fines or government penalties you currently owe.",
    ),
    field_with_help(
        "debts_owed",
        "Debts owed (immediately due)",
        "Only debts with current payment obligations",
        "Only payments due now, such as this month's card minimum or a loan installment. Not the full mortgage or loan balance.",
    ),
    field("other_expenses", "Other deductible expenses", "Miscellaneous living costs"),
];

/// Standard group table in worksheet order.
pub(crate) fn standard_groups() -> Vec<(FieldGroup, Vec<FieldDef>)> {
    vec![
        (FieldGroup::Assets, ASSET_FIELDS.to_vec()),
        (FieldGroup::ImpermissibleEarnings, IMPERMISSIBLE_FIELDS.to_vec()),
        (FieldGroup::Expenses, EXPENSE_FIELDS.to_vec()),
    ]
}
