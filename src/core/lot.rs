use super::transaction::RecordTime;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Deserialize;

/// A discrete BTC acquisition tracked by the lot-matching engine
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BitcoinLot {
    pub id: i64,
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub acquired_date: RecordTime,
    /// Quantity originally acquired
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub total_btc: Option<Decimal>,
    /// Quantity not yet disposed of
    #[serde(default, deserialize_with = "crate::core::money::null_as_zero")]
    #[schemars(with = "f64")]
    pub remaining_btc: Decimal,
    /// Basis for the whole of `total_btc`
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub cost_basis_usd: Option<Decimal>,
}

impl BitcoinLot {
    pub fn is_open(&self) -> bool {
        self.remaining_btc > Decimal::ZERO
    }

    /// Share of the original lot still held; 1 when the original size is
    /// unknown. `None` if the ratio does not fit in a `Decimal`.
    pub fn remaining_fraction(&self) -> Option<Decimal> {
        match self.total_btc {
            Some(total) if total > Decimal::ZERO => self.remaining_btc.checked_div(total),
            _ => Some(Decimal::ONE),
        }
    }
}

/// Partial use of one lot by one disposing transaction
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LotDisposal {
    pub id: i64,
    pub transaction_id: i64,
    pub lot_id: i64,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub disposed_btc: Option<Decimal>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub disposal_basis_usd: Option<Decimal>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub proceeds_usd_for_that_portion: Option<Decimal>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub realized_gain_usd: Option<Decimal>,
    #[serde(default)]
    pub holding_period: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::fixtures::lot;
    use rust_decimal_macros::dec;

    #[test]
    fn fraction_of_partially_disposed_lot() {
        let l = lot(1, "2023-01-01", dec!(2), dec!(0.5), dec!(40000));
        assert_eq!(l.remaining_fraction(), Some(dec!(0.25)));
        assert!(l.is_open());
    }

    #[test]
    fn fraction_defaults_to_one_without_total() {
        let mut l = lot(1, "2023-01-01", dec!(0), dec!(0.5), dec!(100));
        assert_eq!(l.remaining_fraction(), Some(Decimal::ONE));
        l.total_btc = None;
        assert_eq!(l.remaining_fraction(), Some(Decimal::ONE));
    }

    #[test]
    fn null_remaining_reads_as_zero() {
        let l: BitcoinLot = serde_json::from_str(
            r#"{"id": 1, "acquired_date": null, "total_btc": null,
                "remaining_btc": null, "cost_basis_usd": null}"#,
        )
        .unwrap();
        assert_eq!(l.remaining_btc, Decimal::ZERO);
        assert!(!l.is_open());

        let l: BitcoinLot = serde_json::from_str(r#"{"id": 2}"#).unwrap();
        assert_eq!(l.remaining_btc, Decimal::ZERO);
    }

    #[test]
    fn closed_lot() {
        let l = lot(1, "2023-01-01", dec!(1), dec!(0), dec!(100));
        assert!(!l.is_open());
    }
}
