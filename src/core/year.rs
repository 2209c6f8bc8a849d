use chrono::{DateTime, NaiveDate, Utc};

/// Calendar tax year (1 January to 31 December, UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaxYear(pub i32);

impl TaxYear {
    /// Tax year containing the given instant
    pub fn containing(at: DateTime<Utc>) -> Self {
        use chrono::Datelike;
        TaxYear(at.year())
    }

    /// First instant of the year, `None` if the year is out of chrono's range
    pub fn start(&self) -> Option<DateTime<Utc>> {
        NaiveDate::from_ymd_opt(self.0, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Last whole second of the year
    pub fn end(&self) -> Option<DateTime<Utc>> {
        NaiveDate::from_ymd_opt(self.0, 12, 31)
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .map(|dt| dt.and_utc())
    }

    /// Display as "2024-01-01 to 2024-12-31"
    pub fn period(&self) -> String {
        format!("{0}-01-01 to {0}-12-31", self.0)
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
