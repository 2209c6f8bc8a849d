use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Marker rendered in place of a date that could not be parsed
pub const UNKNOWN_DATE: &str = "unknown";

/// Kind of ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    Buy,
    Sell,
    /// Any type the ledger knows about that this report has no rule for
    Other(String),
}

impl From<String> for TransactionType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Deposit" => TransactionType::Deposit,
            "Withdrawal" => TransactionType::Withdrawal,
            "Transfer" => TransactionType::Transfer,
            "Buy" => TransactionType::Buy,
            "Sell" => TransactionType::Sell,
            _ => TransactionType::Other(s),
        }
    }
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Deposit => "Deposit",
            TransactionType::Withdrawal => "Withdrawal",
            TransactionType::Transfer => "Transfer",
            TransactionType::Buy => "Buy",
            TransactionType::Sell => "Sell",
            TransactionType::Other(s) => s,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A date field read from the ledger.
///
/// Upstream data is not validated, so a field can be absent or hold text that
/// is not a date. Both are kept distinct so detail rows can tell them apart:
/// absent renders as `null`, malformed renders as [`UNKNOWN_DATE`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecordTime {
    At(DateTime<Utc>),
    #[default]
    Missing,
    Malformed(String),
}

impl RecordTime {
    pub fn parse(s: &str) -> Self {
        match parse_datetime(s) {
            Some(dt) => RecordTime::At(dt),
            None => {
                log::warn!("Unparseable date field: {:?}", s);
                RecordTime::Malformed(s.to_string())
            }
        }
    }

    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordTime::At(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Display form for detail rows
    pub fn render(&self) -> Option<String> {
        match self {
            RecordTime::At(dt) => Some(dt.to_rfc3339()),
            RecordTime::Missing => None,
            RecordTime::Malformed(_) => Some(UNKNOWN_DATE.to_string()),
        }
    }
}

impl From<DateTime<Utc>> for RecordTime {
    fn from(dt: DateTime<Utc>) -> Self {
        RecordTime::At(dt)
    }
}

impl<'de> Deserialize<'de> for RecordTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Deserialize::deserialize(deserializer)?;
        Ok(match s {
            Some(s) => RecordTime::parse(&s),
            None => RecordTime::Missing,
        })
    }
}

/// Ledger transaction header, already priced by the lot-matching engine
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct Transaction {
    pub id: i64,
    /// When the transaction occurred (RFC3339; naive and date-only values assume UTC)
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub timestamp: RecordTime,
    /// Deposit, Withdrawal, Transfer, Buy, Sell, ...
    #[serde(rename = "type")]
    #[schemars(with = "String")]
    pub tx_type: TransactionType,
    #[serde(default)]
    pub from_account_id: Option<i64>,
    #[serde(default)]
    pub to_account_id: Option<i64>,
    /// Asset quantity moved
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub fee_amount: Option<Decimal>,
    #[serde(default)]
    pub fee_currency: Option<String>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub cost_basis_usd: Option<Decimal>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub proceeds_usd: Option<Decimal>,
    /// Set only once the disposal has been priced upstream
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub realized_gain_usd: Option<Decimal>,
    /// "LONG", "SHORT" or absent
    #[serde(default)]
    pub holding_period: Option<String>,
    /// Free-text provenance tag (e.g. "Mining Pool Payout")
    #[serde(default)]
    pub source: Option<String>,
    /// Free-text intent tag (e.g. "Gift", "Expenses")
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub created_at: RecordTime,
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub updated_at: RecordTime,
}

impl Transaction {
    /// Sort key used by every query over the ledger
    pub fn order_key(&self) -> (Option<DateTime<Utc>>, i64) {
        (self.timestamp.at(), self.id)
    }
}

/// A single debit or credit line of a transaction
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LedgerEntry {
    pub id: i64,
    pub transaction_id: i64,
    pub account_id: i64,
    /// Signed amount
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub entry_type: Option<String>,
    /// Filled from the owning transaction when queried
    #[serde(default)]
    #[schemars(skip)]
    pub transaction_timestamp: RecordTime,
    /// Filled from the account when queried
    #[serde(default)]
    #[schemars(skip)]
    pub account_name: Option<String>,
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
