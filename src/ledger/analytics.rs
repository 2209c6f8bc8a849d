//! Ledger-wide balances, gains and cost basis.

use crate::core::money::{btc, or_zero, usd};
use crate::core::{BitcoinLot, LedgerEntry, LotDisposal, TaxYear, Transaction, TransactionType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct Account {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account_id: i64,
    pub name: String,
    pub currency: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeeTotals {
    #[serde(rename = "USD", with = "rust_decimal::serde::float")]
    pub usd: Decimal,
    #[serde(rename = "BTC", with = "rust_decimal::serde::float")]
    pub btc: Decimal,
}

/// Realized gains from lot disposals plus deposit income, fees and spending
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GainsAndLosses {
    #[serde(with = "rust_decimal::serde::float")]
    pub sells_proceeds: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub withdrawals_spent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub income_earned: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_earned: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rewards_earned: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gifts_received: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub short_term_gains: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub short_term_losses: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub short_term_net: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub long_term_gains: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub long_term_losses: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub long_term_net: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_net_capital_gains: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub income_btc: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_btc: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rewards_btc: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gifts_btc: Decimal,
    pub fees: FeeTotals,
    #[serde(with = "rust_decimal::serde::float")]
    pub year_to_date_capital_gains: Decimal,
}

/// Sum of each account's ledger lines, ordered by account id
pub fn account_balances(accounts: &[Account], entries: &[LedgerEntry]) -> Vec<AccountBalance> {
    let mut totals: HashMap<i64, Decimal> = HashMap::new();
    for entry in entries {
        *totals.entry(entry.account_id).or_default() += or_zero(entry.amount);
    }

    let mut balances: Vec<AccountBalance> = accounts
        .iter()
        .map(|account| AccountBalance {
            account_id: account.id,
            name: account.name.clone(),
            currency: account.currency.clone(),
            balance: totals.get(&account.id).copied().unwrap_or_default(),
        })
        .collect();
    balances.sort_by_key(|b| b.account_id);
    balances
}

#[derive(Default)]
struct Earned {
    usd: Decimal,
    btc: Decimal,
}

impl Earned {
    fn add(&mut self, tx: &Transaction) {
        let (Some(value), Some(amount)) = (tx.cost_basis_usd, tx.amount) else {
            return;
        };
        if value > Decimal::ZERO {
            self.usd += value;
        }
        if amount > Decimal::ZERO {
            self.btc += amount;
        }
    }
}

/// Aggregate gains and income across the whole ledger.
///
/// Capital gains come only from lot disposals so a disposal is never counted
/// twice. `as_of` fixes which year counts as year-to-date.
pub fn gains_and_losses(
    transactions: &[Transaction],
    disposals: &[LotDisposal],
    as_of: DateTime<Utc>,
) -> GainsAndLosses {
    let mut short_gains = Decimal::ZERO;
    let mut short_losses = Decimal::ZERO;
    let mut long_gains = Decimal::ZERO;
    let mut long_losses = Decimal::ZERO;

    for disposal in disposals {
        let Some(gain) = disposal.realized_gain_usd else {
            continue;
        };
        let short = match disposal.holding_period.as_deref() {
            Some(hp) if !hp.is_empty() => hp.eq_ignore_ascii_case("SHORT"),
            _ => {
                log::warn!(
                    "Lot disposal {} has no holding period; treating as SHORT",
                    disposal.id
                );
                true
            }
        };
        match (gain > Decimal::ZERO, gain < Decimal::ZERO, short) {
            (true, _, true) => short_gains += gain,
            (true, _, false) => long_gains += gain,
            (_, true, true) => short_losses += gain.abs(),
            (_, true, false) => long_losses += gain.abs(),
            _ => {}
        }
    }

    let mut sells_proceeds = Decimal::ZERO;
    let mut withdrawals_spent = Decimal::ZERO;
    let mut income = Earned::default();
    let mut interest = Earned::default();
    let mut rewards = Earned::default();
    let mut gifts = Earned::default();
    let mut fees = FeeTotals::default();

    for tx in transactions {
        let source = tx.source.as_deref().unwrap_or_default().to_lowercase();
        let purpose = tx.purpose.as_deref().unwrap_or_default().to_lowercase();

        match tx.tx_type {
            TransactionType::Sell => sells_proceeds += or_zero(tx.proceeds_usd),
            TransactionType::Withdrawal if purpose == "spent" => {
                withdrawals_spent += or_zero(tx.proceeds_usd)
            }
            TransactionType::Deposit => match source.as_str() {
                "income" => income.add(tx),
                "interest" => interest.add(tx),
                "reward" => rewards.add(tx),
                "gift" => gifts.add(tx),
                _ => {}
            },
            _ => {}
        }

        if let (Some(fee), Some(currency)) = (tx.fee_amount, tx.fee_currency.as_deref()) {
            if currency.eq_ignore_ascii_case("usd") {
                fees.usd += fee;
            } else if currency.eq_ignore_ascii_case("btc") {
                fees.btc += fee;
            }
        }
    }

    let ytd_start = TaxYear::containing(as_of).start();
    let timestamps: HashMap<i64, Option<DateTime<Utc>>> = transactions
        .iter()
        .map(|tx| (tx.id, tx.timestamp.at()))
        .collect();
    let ytd: Decimal = disposals
        .iter()
        .filter(|d| {
            matches!(
                (timestamps.get(&d.transaction_id), ytd_start),
                (Some(Some(ts)), Some(start)) if *ts >= start
            )
        })
        .filter_map(|d| d.realized_gain_usd)
        .sum();

    let short_net = short_gains - short_losses;
    let long_net = long_gains - long_losses;

    GainsAndLosses {
        sells_proceeds: usd(sells_proceeds),
        withdrawals_spent: usd(withdrawals_spent),
        income_earned: usd(income.usd),
        interest_earned: usd(interest.usd),
        rewards_earned: usd(rewards.usd),
        gifts_received: usd(gifts.usd),
        total_income: usd(income.usd + interest.usd + rewards.usd),
        short_term_gains: usd(short_gains),
        short_term_losses: usd(short_losses),
        short_term_net: usd(short_net),
        long_term_gains: usd(long_gains),
        long_term_losses: usd(long_losses),
        long_term_net: usd(long_net),
        total_net_capital_gains: usd(short_net + long_net),
        income_btc: btc(income.btc),
        interest_btc: btc(interest.btc),
        rewards_btc: btc(rewards.btc),
        gifts_btc: btc(gifts.btc),
        fees: FeeTotals {
            usd: usd(fees.usd),
            btc: btc(fees.btc),
        },
        year_to_date_capital_gains: usd(ytd),
    }
}

/// Leftover basis over leftover BTC across open lots, to the cent
pub fn average_cost_basis(lots: &[BitcoinLot]) -> Decimal {
    let mut total_btc = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;

    for lot in lots.iter().filter(|l| l.is_open()) {
        let Some(original) = lot.total_btc.filter(|t| *t > Decimal::ZERO) else {
            continue;
        };
        let fraction = btc(lot.remaining_btc / original);
        total_cost += usd(or_zero(lot.cost_basis_usd) * fraction);
        total_btc += lot.remaining_btc;
    }

    if total_btc.is_zero() {
        return Decimal::ZERO;
    }
    usd(total_cost / total_btc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::RecordTime;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn tx(id: i64, tx_type: &str, ts: &str) -> Transaction {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": tx_type,
            "timestamp": ts,
        }))
        .unwrap()
    }

    fn lot(id: i64, total: Decimal, remaining: Decimal, cost: Decimal) -> BitcoinLot {
        BitcoinLot {
            id,
            acquired_date: RecordTime::Missing,
            total_btc: Some(total),
            remaining_btc: remaining,
            cost_basis_usd: Some(cost),
        }
    }

    fn disposal(id: i64, tx_id: i64, gain: Decimal, holding: Option<&str>) -> LotDisposal {
        LotDisposal {
            id,
            transaction_id: tx_id,
            lot_id: 1,
            disposed_btc: Some(dec!(0.1)),
            disposal_basis_usd: None,
            proceeds_usd_for_that_portion: None,
            realized_gain_usd: Some(gain),
            holding_period: holding.map(str::to_string),
        }
    }

    #[test]
    fn balances_sum_entries_per_account() {
        let accounts = vec![
            Account { id: 2, name: "Exchange".into(), currency: Some("BTC".into()) },
            Account { id: 1, name: "Bank".into(), currency: Some("USD".into()) },
            Account { id: 3, name: "Empty".into(), currency: None },
        ];
        let entry = |id, account_id, amount| LedgerEntry {
            id,
            transaction_id: 1,
            account_id,
            amount: Some(amount),
            currency: None,
            entry_type: None,
            transaction_timestamp: RecordTime::Missing,
            account_name: None,
        };
        let entries = vec![
            entry(1, 1, dec!(-1000)),
            entry(2, 2, dec!(0.5)),
            entry(3, 2, dec!(-0.1)),
        ];

        let balances = account_balances(&accounts, &entries);
        assert_eq!(balances.iter().map(|b| b.account_id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(balances[0].balance, dec!(-1000));
        assert_eq!(balances[1].balance, dec!(0.4));
        assert_eq!(balances[2].balance, Decimal::ZERO);
    }

    #[test]
    fn gains_split_by_holding_period_and_sign() {
        let txns = vec![tx(1, "Sell", "2023-05-01T00:00:00Z"), tx(2, "Sell", "2024-02-01T00:00:00Z")];
        let disposals = vec![
            disposal(1, 1, dec!(100), Some("SHORT")),
            disposal(2, 1, dec!(-40), Some("short")),
            disposal(3, 2, dec!(250), Some("LONG")),
            disposal(4, 2, dec!(-10), Some("LONG")),
            disposal(5, 2, dec!(5), None),
        ];
        let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let g = gains_and_losses(&txns, &disposals, as_of);

        assert_eq!(g.short_term_gains, dec!(105));
        assert_eq!(g.short_term_losses, dec!(40));
        assert_eq!(g.short_term_net, dec!(65));
        assert_eq!(g.long_term_gains, dec!(250));
        assert_eq!(g.long_term_losses, dec!(10));
        assert_eq!(g.total_net_capital_gains, dec!(305));
        // only transaction 2 is in 2024
        assert_eq!(g.year_to_date_capital_gains, dec!(245));
    }

    #[test]
    fn deposit_income_and_fees() {
        let mut income = tx(1, "Deposit", "2024-01-01");
        income.source = Some("Income".into());
        income.cost_basis_usd = Some(dec!(500));
        income.amount = Some(dec!(0.01));
        income.fee_amount = Some(dec!(0.0001));
        income.fee_currency = Some("BTC".into());

        let mut interest = tx(2, "Deposit", "2024-01-02");
        interest.source = Some("interest".into());
        interest.cost_basis_usd = Some(dec!(20));
        interest.amount = Some(dec!(0.0004));

        let mut spent = tx(3, "Withdrawal", "2024-01-03");
        spent.purpose = Some("Spent".into());
        spent.proceeds_usd = Some(dec!(75.5));
        spent.fee_amount = Some(dec!(1.25));
        spent.fee_currency = Some("usd".into());

        let mut sale = tx(4, "Sell", "2024-01-04");
        sale.proceeds_usd = Some(dec!(1000));

        let g = gains_and_losses(&[income, interest, spent, sale], &[], Utc::now());
        assert_eq!(g.income_earned, dec!(500));
        assert_eq!(g.interest_earned, dec!(20));
        assert_eq!(g.total_income, dec!(520));
        assert_eq!(g.income_btc, dec!(0.01));
        assert_eq!(g.withdrawals_spent, dec!(75.5));
        assert_eq!(g.sells_proceeds, dec!(1000));
        assert_eq!(g.fees, FeeTotals { usd: dec!(1.25), btc: dec!(0.0001) });
    }

    #[test]
    fn average_basis_over_open_lots() {
        let lots = vec![
            lot(1, dec!(1), dec!(0.5), dec!(20000)),
            lot(2, dec!(2), dec!(2), dec!(100000)),
            lot(3, dec!(1), dec!(0), dec!(99999)),
        ];
        // (10000 + 100000) / 2.5
        assert_eq!(average_cost_basis(&lots), dec!(44000.00));
    }

    #[test]
    fn average_basis_zero_when_nothing_held() {
        assert_eq!(average_cost_basis(&[]), Decimal::ZERO);
        assert_eq!(average_cost_basis(&[lot(1, dec!(1), dec!(0), dec!(5))]), Decimal::ZERO);
    }
}
