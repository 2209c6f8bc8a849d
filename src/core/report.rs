//! Assembles the full tax report dataset for one calendar year.

use super::classify::classify;
use super::detail::{
    capital_gain_rows, data_sources, expense_rows, gift_rows, income_rows, ledger_entry_rows,
    lot_disposal_rows, transaction_rows, CapitalGainRow, ExpenseRow, GiftRow, IncomeRow,
    LedgerEntryRow, LotDisposalRow, TransactionRow,
};
use super::gains::{summarize_assets, summarize_capital_gains, AssetSummary, CapitalGainsSummary};
use super::holdings::{value_open_lots, EndOfYearBalance};
use super::income::{summarize_income, IncomeSummary};
use super::money::parse_decimal;
use super::year::TaxYear;
use crate::ledger::{AccountBalance, GainsAndLosses, LedgerAnalytics, LedgerError, LedgerSource};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("data integrity: {0}")]
    DataIntegrity(String),
    #[error("no UTC window for year {0}")]
    InvalidYear(i32),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Parameters of one report run
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub year: TaxYear,
    /// Year-end BTC/USD price, as supplied by the caller
    pub valuation_price: Option<String>,
    /// Stamped into the dataset as `report_date`
    pub generated_at: DateTime<Utc>,
}

/// Everything a renderer needs for the year, built once per request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDataset {
    pub tax_year: i32,
    pub report_date: String,
    pub period: String,
    pub capital_gains_summary: CapitalGainsSummary,
    pub income_summary: IncomeSummary,
    pub asset_summary: Vec<AssetSummary>,
    pub end_of_year_balances: Vec<EndOfYearBalance>,
    pub capital_gains_transactions: Vec<CapitalGainRow>,
    pub income_transactions: Vec<IncomeRow>,
    pub gifts_donations_lost: Vec<GiftRow>,
    pub expenses: Vec<ExpenseRow>,
    pub data_sources: Vec<String>,
    pub all_transactions: Vec<TransactionRow>,
    pub lot_disposals: Vec<LotDisposalRow>,
    pub ledger_entries: Vec<LedgerEntryRow>,
    pub account_balances: Vec<AccountBalance>,
    pub overall_calcs: GainsAndLosses,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_btc_cost_basis: Decimal,
}

/// A price is mandatory: there is no sensible default for valuing holdings
pub fn parse_valuation_price(raw: Option<&str>) -> Result<Decimal, ReportError> {
    let raw = raw.ok_or_else(|| {
        ReportError::DataIntegrity("no year-end valuation price supplied".to_string())
    })?;
    let price = parse_decimal(raw).ok_or_else(|| {
        ReportError::DataIntegrity(format!("valuation price is not a number: {:?}", raw))
    })?;
    if price.is_sign_negative() {
        return Err(ReportError::DataIntegrity(format!(
            "valuation price is negative: {}",
            price
        )));
    }
    Ok(price)
}

/// Build the report dataset for `request.year`.
///
/// Lots are refreshed first so every query sees the same basis. Any
/// collaborator failure aborts the whole report.
pub fn generate_report_data<S, A>(
    source: &S,
    analytics: &A,
    request: &ReportRequest,
) -> Result<ReportDataset, ReportError>
where
    S: LedgerSource + ?Sized,
    A: LedgerAnalytics + ?Sized,
{
    let year = request.year;
    let price = parse_valuation_price(request.valuation_price.as_deref())?;
    let (start, end) = match (year.start(), year.end()) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(ReportError::InvalidYear(year.0)),
    };

    source.refresh_all_lots()?;

    let txns = source.transactions_in_range(start, end)?;
    let capital_gains_summary = summarize_capital_gains(&txns);
    log::info!(
        "Tax year {} ({} to {}): {} transactions, {} disposals",
        year,
        start,
        end,
        txns.len(),
        capital_gains_summary.number_of_disposals
    );
    for tx in &txns {
        match classify(tx) {
            Some(category) => log::debug!("Transaction {} classified as {:?}", tx.id, category),
            None => log::warn!(
                "Transaction {} ({}) matches no report category",
                tx.id,
                tx.tx_type
            ),
        }
    }

    let open_lots = source.open_lots_as_of(end)?;
    let disposals = source.lot_disposals_in_range(start, end)?;
    let entries = source.ledger_entries_in_range(start, end)?;

    let account_balances = analytics.account_balances()?;
    let overall_calcs = analytics.gains_and_losses_summary()?;
    let average_btc_cost_basis = analytics.average_cost_basis()?;

    Ok(ReportDataset {
        tax_year: year.0,
        report_date: request.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        period: year.period(),
        capital_gains_summary,
        income_summary: summarize_income(&txns),
        asset_summary: summarize_assets(&txns),
        end_of_year_balances: value_open_lots(&open_lots, price)?,
        capital_gains_transactions: capital_gain_rows(&txns),
        income_transactions: income_rows(&txns),
        gifts_donations_lost: gift_rows(&txns),
        expenses: expense_rows(&txns),
        data_sources: data_sources(&txns),
        all_transactions: transaction_rows(&txns),
        lot_disposals: lot_disposal_rows(&disposals),
        ledger_entries: ledger_entry_rows(&entries),
        account_balances,
        overall_calcs,
        average_btc_cost_basis,
    })
}
