use super::classify::{classify, is_long_term, Category};
use super::money::{or_zero, usd};
use super::transaction::Transaction;
use rust_decimal::Decimal;
use serde::Serialize;
use std::ops::Add;

/// Asset reported for every disposal in this ledger
pub const BTC: &str = "BTC";

/// Proceeds, basis and gain for one holding-period bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GainTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub proceeds: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub basis: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gain: Decimal,
}

impl GainTotals {
    fn add_disposal(&mut self, tx: &Transaction) {
        self.proceeds += or_zero(tx.proceeds_usd);
        self.basis += or_zero(tx.cost_basis_usd);
        self.gain += or_zero(tx.realized_gain_usd);
    }
}

impl Add for GainTotals {
    type Output = GainTotals;

    fn add(self, other: GainTotals) -> GainTotals {
        GainTotals {
            proceeds: self.proceeds + other.proceeds,
            basis: self.basis + other.basis,
            gain: self.gain + other.gain,
        }
    }
}

/// Realized gains for the period split by holding period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapitalGainsSummary {
    pub number_of_disposals: usize,
    pub short_term: GainTotals,
    pub long_term: GainTotals,
    pub total: GainTotals,
}

/// Sum every disposal into its short or long term bucket
pub fn summarize_capital_gains(txns: &[Transaction]) -> CapitalGainsSummary {
    let mut short_term = GainTotals::default();
    let mut long_term = GainTotals::default();
    let mut number_of_disposals = 0;

    for tx in txns
        .iter()
        .filter(|tx| classify(tx) == Some(Category::Disposal))
    {
        number_of_disposals += 1;
        if is_long_term(tx.holding_period.as_deref()) {
            long_term.add_disposal(tx);
        } else {
            short_term.add_disposal(tx);
        }
        log::debug!(
            "Disposal tx={} holding={:?} gain={:?}",
            tx.id,
            tx.holding_period,
            tx.realized_gain_usd
        );
    }

    CapitalGainsSummary {
        number_of_disposals,
        short_term,
        long_term,
        total: short_term + long_term,
    }
}

/// Profit and loss per asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    pub asset: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub loss: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net: Decimal,
}

/// Split realized gains into profit and loss. Always yields the BTC row.
pub fn summarize_assets(txns: &[Transaction]) -> Vec<AssetSummary> {
    let (profit, loss) = txns
        .iter()
        .filter(|tx| classify(tx) == Some(Category::Disposal))
        .map(|tx| or_zero(tx.realized_gain_usd))
        .fold((Decimal::ZERO, Decimal::ZERO), |(profit, loss), gain| {
            if gain >= Decimal::ZERO {
                (profit + gain, loss)
            } else {
                (profit, loss - gain)
            }
        });

    vec![AssetSummary {
        asset: BTC.to_string(),
        profit: usd(profit),
        loss: usd(loss),
        net: usd(profit - loss),
    }]
}
