//! Report command - the full year dataset as JSON, or one detail section as CSV

use super::LedgerArgs;
use crate::core::{generate_report_data, ReportDataset};
use clap::{Args, ValueEnum};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ReportCommand {
    #[command(flatten)]
    ledger: LedgerArgs,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Single-line JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Write one detail section as CSV instead of the whole dataset
    #[arg(long, value_enum)]
    csv: Option<CsvSection>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CsvSection {
    CapitalGains,
    Income,
    Gifts,
    Expenses,
    Transactions,
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (ledger, request) = self.ledger.load()?;
        let dataset = generate_report_data(&ledger, &ledger, &request)?;

        let bytes = match self.csv {
            Some(section) => section_csv(&dataset, section)?,
            None => self.to_json(&dataset)?,
        };
        log::info!("Report sha256: {}", digest(&bytes));

        match &self.output {
            Some(path) => {
                File::create(path)?.write_all(&bytes)?;
                log::info!("Wrote {}", path.display());
            }
            None => io::stdout().write_all(&bytes)?,
        }
        Ok(())
    }

    fn to_json(&self, dataset: &ReportDataset) -> anyhow::Result<Vec<u8>> {
        let mut json = if self.compact {
            serde_json::to_vec(dataset)?
        } else {
            serde_json::to_vec_pretty(dataset)?
        };
        json.push(b'\n');
        Ok(json)
    }
}

fn section_csv(dataset: &ReportDataset, section: CsvSection) -> anyhow::Result<Vec<u8>> {
    match section {
        CsvSection::CapitalGains => write_csv(&dataset.capital_gains_transactions),
        CsvSection::Income => write_csv(&dataset.income_transactions),
        CsvSection::Gifts => write_csv(&dataset.gifts_donations_lost),
        CsvSection::Expenses => write_csv(&dataset.expenses),
        CsvSection::Transactions => write_csv(&dataset.all_transactions),
    }
}

fn write_csv<T: Serialize>(rows: &[T]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    Ok(wtr.into_inner()?)
}

/// Hex SHA-256 of the rendered output, for checking reruns are byte-identical
fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let a = digest(b"{\"tax_year\":2024}");
        assert_eq!(a.len(), 64);
        assert_eq!(a, digest(b"{\"tax_year\":2024}"));
        assert_ne!(a, digest(b"{\"tax_year\":2023}"));
    }

    #[test]
    fn csv_has_header_and_rows() {
        #[derive(Serialize)]
        struct Row {
            tx_id: i64,
            purpose: &'static str,
        }
        let out = write_csv(&[
            Row { tx_id: 1, purpose: "Gift" },
            Row { tx_id: 2, purpose: "Lost" },
        ])
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "tx_id,purpose\n1,Gift\n2,Lost\n");
    }
}
