pub mod classify;
pub mod detail;
pub mod gains;
pub mod holdings;
pub mod income;
pub mod lot;
pub mod money;
pub mod report;
pub mod transaction;
pub mod year;

// Flat public surface for domain types and functions.
pub use classify::IncomeKind;
pub use gains::{AssetSummary, CapitalGainsSummary, GainTotals};
pub use holdings::EndOfYearBalance;
pub use income::IncomeSummary;
pub use lot::{BitcoinLot, LotDisposal};
pub use report::{generate_report_data, ReportDataset, ReportRequest};
pub use transaction::{LedgerEntry, Transaction, TransactionType};
pub use year::TaxYear;
