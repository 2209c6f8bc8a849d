//! Rule-based categorisation of ledger transactions.
//!
//! `source` and `purpose` are uncontrolled free text, so the rules are plain
//! case-insensitive string tests rather than a typed taxonomy.

use super::transaction::{Transaction, TransactionType};

/// Report category of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Disposal,
    Income(IncomeKind),
    GiftDonationLost,
    Expense,
}

/// Income sub-bucket, derived from the deposit source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeKind {
    Mining,
    Reward,
    Other,
}

impl IncomeKind {
    pub fn display(&self) -> &'static str {
        match self {
            IncomeKind::Mining => "Mining",
            IncomeKind::Reward => "Reward",
            IncomeKind::Other => "Other",
        }
    }
}

const GIFT_PURPOSES: [&str; 3] = ["gift", "donation", "lost"];
const EXPENSE_PURPOSE: &str = "expenses";
const LONG_TERM: &str = "LONG";

/// Sell or Withdrawal that the lot-matching engine has already priced
pub fn is_disposal(tx: &Transaction) -> bool {
    matches!(
        tx.tx_type,
        TransactionType::Sell | TransactionType::Withdrawal
    ) && tx.realized_gain_usd.is_some()
}

/// Deposit with a non-empty source, bucketed by keyword
pub fn income_kind(tx: &Transaction) -> Option<IncomeKind> {
    if tx.tx_type != TransactionType::Deposit {
        return None;
    }
    let source = tx.source.as_deref().filter(|s| !s.is_empty())?.to_lowercase();
    if source.contains("mining") {
        Some(IncomeKind::Mining)
    } else if source.contains("reward") || source.contains("interest") {
        Some(IncomeKind::Reward)
    } else {
        Some(IncomeKind::Other)
    }
}

pub fn is_gift_donation_lost(tx: &Transaction) -> bool {
    withdrawal_purpose(tx).is_some_and(|p| GIFT_PURPOSES.contains(&p.as_str()))
}

pub fn is_expense(tx: &Transaction) -> bool {
    withdrawal_purpose(tx).is_some_and(|p| p == EXPENSE_PURPOSE)
}

fn withdrawal_purpose(tx: &Transaction) -> Option<String> {
    if tx.tx_type != TransactionType::Withdrawal {
        return None;
    }
    tx.purpose.as_deref().map(str::to_lowercase)
}

/// Place a transaction in at most one category.
///
/// Deposits can only be income. For withdrawals the stated purpose wins over
/// the disposal rule, so a priced "lost" withdrawal is reported as lost and
/// never also as a sale.
pub fn classify(tx: &Transaction) -> Option<Category> {
    if let Some(kind) = income_kind(tx) {
        return Some(Category::Income(kind));
    }
    if is_gift_donation_lost(tx) {
        return Some(Category::GiftDonationLost);
    }
    if is_expense(tx) {
        return Some(Category::Expense);
    }
    if is_disposal(tx) {
        return Some(Category::Disposal);
    }
    None
}

/// Only an explicit "LONG" is long-term; anything else, including no value, is short-term
pub fn is_long_term(holding_period: Option<&str>) -> bool {
    holding_period == Some(LONG_TERM)
}
