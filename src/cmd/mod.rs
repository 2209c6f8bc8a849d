pub mod report;
pub mod schema;
pub mod summary;

use crate::core::{ReportRequest, TaxYear};
use crate::ledger::LedgerSnapshot;
use chrono::{DateTime, Utc};
use clap::Args;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Ledger input and report parameters shared by `report` and `summary`
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// JSON ledger export. Reads from stdin with "-".
    #[arg(short, long, default_value = "-")]
    ledger: PathBuf,

    /// Calendar year to report (e.g. 2024)
    #[arg(short, long)]
    year: i32,

    /// Year-end BTC/USD price. Defaults to the ledger's year_end_prices entry.
    #[arg(short, long)]
    price: Option<String>,

    /// Timestamp stamped on the report (RFC3339). Defaults to now.
    #[arg(long)]
    report_date: Option<DateTime<Utc>>,
}

impl LedgerArgs {
    /// Load the ledger and build the request for it
    pub fn load(&self) -> anyhow::Result<(LedgerSnapshot, ReportRequest)> {
        let generated_at = self.report_date.unwrap_or_else(Utc::now);
        let ledger = read_ledger(&self.ledger)?.with_as_of(generated_at);

        let valuation_price = self
            .price
            .clone()
            .or_else(|| ledger.year_end_price(self.year).map(str::to_string));
        if valuation_price.is_none() {
            log::warn!("No valuation price for {}, pass --price", self.year);
        }

        let request = ReportRequest {
            year: TaxYear(self.year),
            valuation_price,
            generated_at,
        };
        Ok((ledger, request))
    }
}

/// Read the ledger export from a file (or stdin with "-")
pub fn read_ledger(path: &Path) -> anyhow::Result<LedgerSnapshot> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        let file = File::open(path)?;
        Ok(LedgerSnapshot::read_json(BufReader::new(file))?)
    }
}

fn read_from_stdin() -> anyhow::Result<LedgerSnapshot> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a ledger file or pipe it to stdin.");
    }

    Ok(LedgerSnapshot::read_json(io::Cursor::new(buffer))?)
}
