//! Read-only access to the ledger the report is built from.
//!
//! The report engine never touches storage directly. It is handed something
//! implementing [`LedgerSource`] for the period's records and
//! [`LedgerAnalytics`] for the ledger-wide figures it passes through.

pub mod analytics;
pub mod snapshot;

use crate::core::{BitcoinLot, LedgerEntry, LotDisposal, Transaction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub use analytics::{AccountBalance, GainsAndLosses};
pub use snapshot::LedgerSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to read ledger: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse ledger: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("lot {lot_id} is inconsistent: {reason}")]
    InconsistentLot { lot_id: i64, reason: String },
    #[error("{kind} {id} references missing {target} {target_id}")]
    DanglingReference {
        kind: &'static str,
        id: i64,
        target: &'static str,
        target_id: i64,
    },
}

/// Period queries over transactions, lots and their ledger lines
pub trait LedgerSource {
    /// Re-apply lot matching across the whole ledger. Must finish before any query.
    fn refresh_all_lots(&self) -> Result<(), LedgerError>;

    /// Transactions with `start <= timestamp <= end`, ordered by (timestamp, id)
    fn transactions_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// Lots with remaining quantity acquired on or before `cutoff`, oldest first
    fn open_lots_as_of(&self, cutoff: DateTime<Utc>) -> Result<Vec<BitcoinLot>, LedgerError>;

    /// Lot disposals whose transaction falls in the window
    fn lot_disposals_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LotDisposal>, LedgerError>;

    /// Ledger entries whose transaction falls in the window
    fn ledger_entries_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;
}

/// Ledger-wide figures copied into the report as-is
pub trait LedgerAnalytics {
    fn account_balances(&self) -> Result<Vec<AccountBalance>, LedgerError>;

    fn gains_and_losses_summary(&self) -> Result<GainsAndLosses, LedgerError>;

    /// Average USD paid per BTC still held
    fn average_cost_basis(&self) -> Result<Decimal, LedgerError>;
}
