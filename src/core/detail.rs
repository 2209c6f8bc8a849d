//! Per-record detail rows for the audit appendices.
//!
//! Each projector maps one input record to one row. Quantities carry 8
//! decimal places and USD amounts 2. Missing numbers become zero; missing
//! dates become `null` and unparseable ones the "unknown" marker.

use super::classify::{classify, Category};
use super::gains::BTC;
use super::lot::LotDisposal;
use super::money::{btc, in_currency, or_zero, usd};
use super::transaction::{LedgerEntry, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;

/// Disposals are matched against several lots, so no single acquisition date applies
pub const MULTIPLE_LOTS: &str = "(multiple lots)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapitalGainRow {
    pub tx_id: i64,
    pub date_sold: Option<String>,
    pub date_acquired: String,
    pub asset: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub proceeds: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gain_loss: Decimal,
    pub holding_period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeRow {
    pub tx_id: i64,
    pub date: Option<String>,
    pub asset: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub value_usd: Decimal,
    pub source: String,
    /// "Reward" or "Other". Coarser than the income summary buckets.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GiftRow {
    pub tx_id: i64,
    pub date: Option<String>,
    pub asset: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub value_usd: Decimal,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRow {
    pub tx_id: i64,
    pub date: Option<String>,
    pub asset: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub value_usd: Decimal,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Every field of a transaction, for the raw appendix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub from_account_id: Option<i64>,
    pub to_account_id: Option<i64>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub fee_amount: Decimal,
    pub fee_currency: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost_basis_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub proceeds_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub realized_gain_usd: Decimal,
    pub holding_period: Option<String>,
    pub source: Option<String>,
    pub purpose: Option<String>,
    pub is_locked: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotDisposalRow {
    pub id: i64,
    pub transaction_id: i64,
    pub lot_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub disposed_btc: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub disposal_basis_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub proceeds_usd_for_that_portion: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub realized_gain_usd: Decimal,
    pub holding_period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntryRow {
    pub id: i64,
    pub transaction_id: i64,
    pub account_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: Option<String>,
    pub entry_type: Option<String>,
    pub transaction_timestamp: Option<String>,
    pub account_name: Option<String>,
}

pub fn capital_gain_rows(txns: &[Transaction]) -> Vec<CapitalGainRow> {
    txns.iter()
        .filter(|tx| classify(tx) == Some(Category::Disposal))
        .map(|tx| CapitalGainRow {
            tx_id: tx.id,
            date_sold: tx.timestamp.render(),
            date_acquired: MULTIPLE_LOTS.to_string(),
            asset: BTC.to_string(),
            amount: btc(or_zero(tx.amount)),
            cost: usd(or_zero(tx.cost_basis_usd)),
            proceeds: usd(or_zero(tx.proceeds_usd)),
            gain_loss: usd(or_zero(tx.realized_gain_usd)),
            holding_period: tx.holding_period.clone(),
        })
        .collect()
}

/// Income row type: only rewards are called out, mining and interest are "Other"
fn income_row_type(source: &str) -> &'static str {
    if source.to_lowercase().contains("reward") {
        "Reward"
    } else {
        "Other"
    }
}

pub fn income_rows(txns: &[Transaction]) -> Vec<IncomeRow> {
    txns.iter()
        .filter(|tx| matches!(classify(tx), Some(Category::Income(_))))
        .map(|tx| {
            let source = tx.source.clone().unwrap_or_default();
            IncomeRow {
                tx_id: tx.id,
                date: tx.timestamp.render(),
                asset: BTC.to_string(),
                amount: btc(or_zero(tx.amount)),
                value_usd: usd(or_zero(tx.cost_basis_usd)),
                kind: income_row_type(&source).to_string(),
                source,
            }
        })
        .collect()
}

pub fn gift_rows(txns: &[Transaction]) -> Vec<GiftRow> {
    txns.iter()
        .filter(|tx| classify(tx) == Some(Category::GiftDonationLost))
        .map(|tx| GiftRow {
            tx_id: tx.id,
            date: tx.timestamp.render(),
            asset: BTC.to_string(),
            amount: btc(or_zero(tx.amount)),
            value_usd: usd(or_zero(tx.proceeds_usd)),
            purpose: tx.purpose.clone().unwrap_or_default(),
        })
        .collect()
}

pub fn expense_rows(txns: &[Transaction]) -> Vec<ExpenseRow> {
    txns.iter()
        .filter(|tx| classify(tx) == Some(Category::Expense))
        .map(|tx| ExpenseRow {
            tx_id: tx.id,
            date: tx.timestamp.render(),
            asset: BTC.to_string(),
            amount: btc(or_zero(tx.amount)),
            value_usd: usd(or_zero(tx.proceeds_usd)),
            kind: "Expense".to_string(),
        })
        .collect()
}

/// Distinct non-empty sources, sorted
pub fn data_sources(txns: &[Transaction]) -> Vec<String> {
    txns.iter()
        .filter_map(|tx| tx.source.as_deref())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl From<&Transaction> for TransactionRow {
    fn from(tx: &Transaction) -> Self {
        TransactionRow {
            id: tx.id,
            timestamp: tx.timestamp.render(),
            tx_type: tx.tx_type.to_string(),
            from_account_id: tx.from_account_id,
            to_account_id: tx.to_account_id,
            amount: btc(or_zero(tx.amount)),
            fee_amount: in_currency(or_zero(tx.fee_amount), tx.fee_currency.as_deref()),
            fee_currency: tx.fee_currency.clone(),
            cost_basis_usd: usd(or_zero(tx.cost_basis_usd)),
            proceeds_usd: usd(or_zero(tx.proceeds_usd)),
            realized_gain_usd: usd(or_zero(tx.realized_gain_usd)),
            holding_period: tx.holding_period.clone(),
            source: tx.source.clone(),
            purpose: tx.purpose.clone(),
            is_locked: tx.is_locked,
            created_at: tx.created_at.render(),
            updated_at: tx.updated_at.render(),
        }
    }
}

impl From<&LotDisposal> for LotDisposalRow {
    fn from(d: &LotDisposal) -> Self {
        LotDisposalRow {
            id: d.id,
            transaction_id: d.transaction_id,
            lot_id: d.lot_id,
            disposed_btc: btc(or_zero(d.disposed_btc)),
            disposal_basis_usd: usd(or_zero(d.disposal_basis_usd)),
            proceeds_usd_for_that_portion: usd(or_zero(d.proceeds_usd_for_that_portion)),
            realized_gain_usd: usd(or_zero(d.realized_gain_usd)),
            holding_period: d.holding_period.clone(),
        }
    }
}

impl From<&LedgerEntry> for LedgerEntryRow {
    fn from(e: &LedgerEntry) -> Self {
        LedgerEntryRow {
            id: e.id,
            transaction_id: e.transaction_id,
            account_id: e.account_id,
            amount: in_currency(or_zero(e.amount), e.currency.as_deref()),
            currency: e.currency.clone(),
            entry_type: e.entry_type.clone(),
            transaction_timestamp: e.transaction_timestamp.render(),
            account_name: e.account_name.clone(),
        }
    }
}

pub fn transaction_rows(txns: &[Transaction]) -> Vec<TransactionRow> {
    txns.iter().map(TransactionRow::from).collect()
}

pub fn lot_disposal_rows(disposals: &[LotDisposal]) -> Vec<LotDisposalRow> {
    disposals.iter().map(LotDisposalRow::from).collect()
}

pub fn ledger_entry_rows(entries: &[LedgerEntry]) -> Vec<LedgerEntryRow> {
    entries.iter().map(LedgerEntryRow::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::fixtures::{deposit, sell, tx, withdrawal};
    use crate::core::transaction::{RecordTime, UNKNOWN_DATE};
    use rust_decimal_macros::dec;

    #[test]
    fn capital_gain_row_fields() {
        let mut t = sell(9, dec!(50000), dec!(30000), dec!(20000), Some("LONG"));
        t.amount = Some(dec!(1.23456789123));
        let rows = capital_gain_rows(&[t]);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.tx_id, 9);
        assert_eq!(row.date_sold.as_deref(), Some("2024-06-01T12:00:00+00:00"));
        assert_eq!(row.date_acquired, MULTIPLE_LOTS);
        assert_eq!(row.amount, dec!(1.23456789));
        assert_eq!(row.gain_loss, dec!(20000.00));
        assert_eq!(row.holding_period.as_deref(), Some("LONG"));
    }

    #[test]
    fn zero_gain_disposal_listed() {
        let rows = capital_gain_rows(&[sell(1, dec!(10), dec!(10), dec!(0), None)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].gain_loss, Decimal::ZERO);
    }

    #[test]
    fn income_row_fields() {
        let mut d = deposit(3, "Pool mining", dec!(99.999));
        d.amount = Some(dec!(0.001));
        let rows = income_rows(&[d, sell(4, dec!(1), dec!(1), dec!(0), None)]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value_usd, dec!(99.99));
        assert_eq!(rows[0].source, "Pool mining");
    }

    #[test]
    fn income_row_type_only_singles_out_rewards() {
        let txns = vec![
            deposit(1, "Mining Pool Payout", dec!(100)),
            deposit(2, "Staking Reward", dec!(5)),
            deposit(3, "Savings interest", dec!(2)),
            deposit(4, "Airdrop", dec!(1)),
        ];
        let kinds: Vec<_> = income_rows(&txns).into_iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec!["Other", "Reward", "Other", "Other"]);

        // the summary still buckets mining and interest separately
        let summary = crate::core::income::summarize_income(&txns);
        assert_eq!(summary.mining, dec!(100));
        assert_eq!(summary.reward, dec!(7));
        assert_eq!(summary.other, dec!(1));
    }

    #[test]
    fn gifts_and_expenses_use_proceeds() {
        let txns = vec![
            withdrawal(1, "Donation", dec!(120.50)),
            withdrawal(2, "Expenses", dec!(42)),
            withdrawal(3, "Spent", dec!(7)),
        ];
        let gifts = gift_rows(&txns);
        let expenses = expense_rows(&txns);

        assert_eq!(gifts.len(), 1);
        assert_eq!(gifts[0].purpose, "Donation");
        assert_eq!(gifts[0].value_usd, dec!(120.50));
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].tx_id, 2);
        assert_eq!(expenses[0].kind, "Expense");
    }

    #[test]
    fn data_sources_unique_and_sorted() {
        let mut t = tx(4, "Buy", "2024-01-01");
        t.source = Some("Coinbase".to_string());
        let txns = vec![
            deposit(1, "Mining", dec!(1)),
            deposit(2, "Coinbase", dec!(1)),
            deposit(3, "", dec!(1)),
            t,
        ];
        assert_eq!(data_sources(&txns), vec!["Coinbase", "Mining"]);
        assert!(data_sources(&[]).is_empty());
    }

    #[test]
    fn transaction_row_tolerates_nulls() {
        let mut t = tx(5, "Transfer", "2024-01-01");
        t.created_at = RecordTime::parse("yesterday");
        let row = TransactionRow::from(&t);

        assert_eq!(row.tx_type, "Transfer");
        assert_eq!(row.amount, Decimal::ZERO);
        assert_eq!(row.realized_gain_usd, Decimal::ZERO);
        assert_eq!(row.created_at.as_deref(), Some(UNKNOWN_DATE));
        assert_eq!(row.updated_at, None);
    }

    #[test]
    fn fee_rounded_in_its_currency() {
        let mut t = tx(6, "Sell", "2024-01-01");
        t.fee_amount = Some(dec!(1.005));
        t.fee_currency = Some("USD".to_string());
        assert_eq!(TransactionRow::from(&t).fee_amount.to_string(), "1.00");

        t.fee_amount = Some(dec!(0.000012345));
        t.fee_currency = Some("BTC".to_string());
        assert_eq!(TransactionRow::from(&t).fee_amount.to_string(), "0.00001234");
    }

    #[test]
    fn lot_disposal_row_rounding() {
        let d = LotDisposal {
            id: 1,
            transaction_id: 2,
            lot_id: 3,
            disposed_btc: Some(dec!(0.123456785)),
            disposal_basis_usd: Some(dec!(1000.005)),
            proceeds_usd_for_that_portion: None,
            realized_gain_usd: Some(dec!(-12.3456)),
            holding_period: None,
        };
        let row = LotDisposalRow::from(&d);
        assert_eq!(row.disposed_btc, dec!(0.12345678));
        assert_eq!(row.disposal_basis_usd, dec!(1000.00));
        assert_eq!(row.proceeds_usd_for_that_portion, Decimal::ZERO);
        assert_eq!(row.realized_gain_usd, dec!(-12.35));
    }

    #[test]
    fn ledger_entry_row_keeps_sign() {
        let e = LedgerEntry {
            id: 1,
            transaction_id: 2,
            account_id: 3,
            amount: Some(dec!(-0.5)),
            currency: Some("BTC".to_string()),
            entry_type: Some("TRANSFER_OUT".to_string()),
            transaction_timestamp: RecordTime::Missing,
            account_name: Some("Wallet".to_string()),
        };
        let row = LedgerEntryRow::from(&e);
        assert_eq!(row.amount, dec!(-0.5));
        assert_eq!(row.transaction_timestamp, None);
        assert_eq!(row.account_name.as_deref(), Some("Wallet"));
    }

    #[test]
    fn usd_ledger_entry_rounded_to_cents() {
        let e = LedgerEntry {
            id: 1,
            transaction_id: 2,
            account_id: 3,
            amount: Some(dec!(30000.125)),
            currency: Some("USD".to_string()),
            entry_type: Some("SELL_IN".to_string()),
            transaction_timestamp: RecordTime::Missing,
            account_name: None,
        };
        assert_eq!(LedgerEntryRow::from(&e).amount.to_string(), "30000.12");
    }
}
