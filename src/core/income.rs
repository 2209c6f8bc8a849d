use super::classify::{classify, Category, IncomeKind};
use super::money::or_zero;
use super::transaction::Transaction;
use rust_decimal::Decimal;
use serde::Serialize;

/// Income totals by source bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IncomeSummary {
    #[serde(rename = "Mining", with = "rust_decimal::serde::float")]
    pub mining: Decimal,
    #[serde(rename = "Reward", with = "rust_decimal::serde::float")]
    pub reward: Decimal,
    #[serde(rename = "Other", with = "rust_decimal::serde::float")]
    pub other: Decimal,
    #[serde(rename = "Total", with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Sum the USD value of income deposits.
///
/// The deposit's `cost_basis_usd` is its value at receipt.
pub fn summarize_income(txns: &[Transaction]) -> IncomeSummary {
    let mut summary = IncomeSummary::default();

    for tx in txns {
        let Some(Category::Income(kind)) = classify(tx) else {
            continue;
        };
        let value = or_zero(tx.cost_basis_usd);
        match kind {
            IncomeKind::Mining => summary.mining += value,
            IncomeKind::Reward => summary.reward += value,
            IncomeKind::Other => summary.other += value,
        }
        summary.total += value;
    }

    summary
}
