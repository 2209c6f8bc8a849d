//! In-memory ledger loaded from a JSON export.

use super::analytics::{self, Account, AccountBalance, GainsAndLosses};
use super::{LedgerAnalytics, LedgerError, LedgerSource};
use crate::core::{BitcoinLot, LedgerEntry, LotDisposal, Transaction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;

/// Full ledger export: transactions, lots, and their ledger lines
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub lots: Vec<BitcoinLot>,
    #[serde(default)]
    pub lot_disposals: Vec<LotDisposal>,
    #[serde(default)]
    pub ledger_entries: Vec<LedgerEntry>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Year-end BTC/USD price per calendar year, as decimal strings
    #[serde(default)]
    pub year_end_prices: BTreeMap<i32, String>,
    /// Instant treated as "now" for year-to-date figures
    #[serde(skip)]
    as_of: Option<DateTime<Utc>>,
}

impl LedgerSnapshot {
    pub fn read_json<R: Read>(reader: R) -> Result<Self, LedgerError> {
        let snapshot: LedgerSnapshot = serde_json::from_reader(reader)?;
        log::info!(
            "Loaded ledger: {} transactions, {} lots, {} lot disposals, {} ledger entries",
            snapshot.transactions.len(),
            snapshot.lots.len(),
            snapshot.lot_disposals.len(),
            snapshot.ledger_entries.len()
        );
        Ok(snapshot)
    }

    /// Pin the instant used for year-to-date figures
    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn year_end_price(&self, year: i32) -> Option<&str> {
        self.year_end_prices.get(&year).map(String::as_str)
    }

    fn transaction_times(&self) -> HashMap<i64, Option<DateTime<Utc>>> {
        self.transactions
            .iter()
            .map(|tx| (tx.id, tx.timestamp.at()))
            .collect()
    }

    /// Records whose owning transaction falls in the window, ordered by
    /// (transaction timestamp, record id)
    fn joined_in_range<'a, T>(
        &self,
        records: &'a [T],
        transaction_id: impl Fn(&T) -> i64,
        id: impl Fn(&T) -> i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<(DateTime<Utc>, &'a T)> {
        let times = self.transaction_times();
        let mut joined: Vec<_> = records
            .iter()
            .filter_map(|r| match times.get(&transaction_id(r)) {
                Some(Some(ts)) if *ts >= start && *ts <= end => Some((*ts, r)),
                _ => None,
            })
            .collect();
        joined.sort_by_key(|(ts, r)| (*ts, id(*r)));
        joined
    }
}

fn in_window(ts: Option<DateTime<Utc>>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    ts.is_some_and(|ts| ts >= start && ts <= end)
}

impl LedgerSource for LedgerSnapshot {
    /// Lots are matched before export; check the lot book is still coherent
    fn refresh_all_lots(&self) -> Result<(), LedgerError> {
        for lot in &self.lots {
            if lot.remaining_btc < Decimal::ZERO {
                return Err(LedgerError::InconsistentLot {
                    lot_id: lot.id,
                    reason: format!("negative remaining quantity {}", lot.remaining_btc),
                });
            }
            if let Some(total) = lot.total_btc {
                if lot.remaining_btc > total {
                    return Err(LedgerError::InconsistentLot {
                        lot_id: lot.id,
                        reason: format!(
                            "remaining quantity {} exceeds acquired {}",
                            lot.remaining_btc, total
                        ),
                    });
                }
            }
        }

        let times = self.transaction_times();
        let lot_ids: Vec<i64> = self.lots.iter().map(|l| l.id).collect();
        for d in &self.lot_disposals {
            if !lot_ids.contains(&d.lot_id) {
                return Err(LedgerError::DanglingReference {
                    kind: "lot disposal",
                    id: d.id,
                    target: "lot",
                    target_id: d.lot_id,
                });
            }
            if !times.contains_key(&d.transaction_id) {
                return Err(LedgerError::DanglingReference {
                    kind: "lot disposal",
                    id: d.id,
                    target: "transaction",
                    target_id: d.transaction_id,
                });
            }
        }
        for e in &self.ledger_entries {
            if !times.contains_key(&e.transaction_id) {
                return Err(LedgerError::DanglingReference {
                    kind: "ledger entry",
                    id: e.id,
                    target: "transaction",
                    target_id: e.transaction_id,
                });
            }
        }

        log::debug!("Lot book verified: {} lots", self.lots.len());
        Ok(())
    }

    fn transactions_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let mut txns: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|tx| in_window(tx.timestamp.at(), start, end))
            .cloned()
            .collect();
        txns.sort_by_key(Transaction::order_key);
        Ok(txns)
    }

    fn open_lots_as_of(&self, cutoff: DateTime<Utc>) -> Result<Vec<BitcoinLot>, LedgerError> {
        let mut lots: Vec<BitcoinLot> = self
            .lots
            .iter()
            .filter(|lot| lot.is_open())
            .filter(|lot| lot.acquired_date.at().is_some_and(|acquired| acquired <= cutoff))
            .cloned()
            .collect();
        lots.sort_by_key(|lot| (lot.acquired_date.at(), lot.id));
        Ok(lots)
    }

    fn lot_disposals_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LotDisposal>, LedgerError> {
        Ok(self
            .joined_in_range(
                self.lot_disposals.as_slice(),
                |d| d.transaction_id,
                |d| d.id,
                start,
                end,
            )
            .into_iter()
            .map(|(_, d)| d.clone())
            .collect())
    }

    fn ledger_entries_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let names: HashMap<i64, &str> = self
            .accounts
            .iter()
            .map(|a| (a.id, a.name.as_str()))
            .collect();

        Ok(self
            .joined_in_range(
                self.ledger_entries.as_slice(),
                |e| e.transaction_id,
                |e| e.id,
                start,
                end,
            )
            .into_iter()
            .map(|(ts, e)| LedgerEntry {
                transaction_timestamp: ts.into(),
                account_name: names.get(&e.account_id).map(|n| n.to_string()),
                ..e.clone()
            })
            .collect())
    }
}

impl LedgerAnalytics for LedgerSnapshot {
    fn account_balances(&self) -> Result<Vec<AccountBalance>, LedgerError> {
        Ok(analytics::account_balances(&self.accounts, &self.ledger_entries))
    }

    fn gains_and_losses_summary(&self) -> Result<GainsAndLosses, LedgerError> {
        let as_of = self.as_of.unwrap_or_else(Utc::now);
        Ok(analytics::gains_and_losses(
            &self.transactions,
            &self.lot_disposals,
            as_of,
        ))
    }

    fn average_cost_basis(&self) -> Result<Decimal, LedgerError> {
        Ok(analytics::average_cost_basis(&self.lots))
    }
}
