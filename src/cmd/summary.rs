//! Summary command - year totals as tables

use super::LedgerArgs;
use crate::core::{
    generate_report_data, AssetSummary, CapitalGainsSummary, EndOfYearBalance, GainTotals,
    IncomeKind, IncomeSummary, ReportDataset,
};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SummaryCommand {
    #[command(flatten)]
    ledger: LedgerArgs,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

/// Summary sections of the dataset, without the detail lists
#[derive(Debug, Serialize)]
struct SummaryData<'a> {
    tax_year: i32,
    period: &'a str,
    capital_gains_summary: &'a CapitalGainsSummary,
    income_summary: &'a IncomeSummary,
    asset_summary: &'a [AssetSummary],
    end_of_year_balances: &'a [EndOfYearBalance],
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (ledger, request) = self.ledger.load()?;
        let dataset = generate_report_data(&ledger, &ledger, &request)?;

        if self.json {
            let data = SummaryData {
                tax_year: dataset.tax_year,
                period: &dataset.period,
                capital_gains_summary: &dataset.capital_gains_summary,
                income_summary: &dataset.income_summary,
                asset_summary: &dataset.asset_summary,
                end_of_year_balances: &dataset.end_of_year_balances,
            };
            println!("{}", serde_json::to_string_pretty(&data)?);
        } else {
            print_summary(&dataset);
        }
        Ok(())
    }
}

fn print_summary(dataset: &ReportDataset) {
    println!();
    println!("TAX SUMMARY ({})", dataset.period);
    println!();

    let cg = &dataset.capital_gains_summary;
    println!("Capital Gains ({} disposals)", cg.number_of_disposals);
    print_table(vec![
        gain_row("Short term", &cg.short_term),
        gain_row("Long term", &cg.long_term),
        gain_row("Total", &cg.total),
    ]);

    let income = &dataset.income_summary;
    println!("Income");
    print_table(vec![
        income_row(IncomeKind::Mining.display(), income.mining),
        income_row(IncomeKind::Reward.display(), income.reward),
        income_row(IncomeKind::Other.display(), income.other),
        income_row("Total", income.total),
    ]);

    println!("Holdings at year end");
    let rows: Vec<HoldingRow> = dataset
        .end_of_year_balances
        .iter()
        .map(|b| HoldingRow {
            lot: if b.is_total() {
                b.asset.clone()
            } else {
                b.lot_id.map(|id| id.to_string()).unwrap_or_default()
            },
            acquired: b.acquired_date.clone().unwrap_or_default(),
            quantity: format_btc(b.quantity),
            cost: format_usd(b.cost),
            value: format_usd(b.value),
        })
        .collect();
    print_table(rows);
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
    println!();
}

fn gain_row(term: &str, totals: &GainTotals) -> GainRow {
    GainRow {
        term: term.to_string(),
        proceeds: format_usd(totals.proceeds),
        basis: format_usd(totals.basis),
        gain: format_usd(totals.gain),
    }
}

fn income_row(bucket: &str, value: Decimal) -> IncomeRow {
    IncomeRow {
        bucket: bucket.to_string(),
        value: format_usd(value),
    }
}

fn format_usd(value: Decimal) -> String {
    if value.is_sign_negative() {
        format!("-${:.2}", value.abs())
    } else {
        format!("${:.2}", value)
    }
}

fn format_btc(value: Decimal) -> String {
    format!("{:.8}", value)
}

#[derive(Debug, Tabled)]
struct GainRow {
    #[tabled(rename = "Term")]
    term: String,
    #[tabled(rename = "Proceeds")]
    proceeds: String,
    #[tabled(rename = "Cost Basis")]
    basis: String,
    #[tabled(rename = "Gain/Loss")]
    gain: String,
}

#[derive(Debug, Tabled)]
struct IncomeRow {
    #[tabled(rename = "Source")]
    bucket: String,
    #[tabled(rename = "Value (USD)")]
    value: String,
}

#[derive(Debug, Tabled)]
struct HoldingRow {
    #[tabled(rename = "Lot")]
    lot: String,
    #[tabled(rename = "Acquired")]
    acquired: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Cost (USD)")]
    cost: String,
    #[tabled(rename = "Value (USD)")]
    value: String,
}
