//! End-of-year valuation of open lots.

use super::gains::BTC;
use super::lot::BitcoinLot;
use super::money::{btc, or_zero, usd};
use super::report::ReportError;
use rust_decimal::Decimal;
use serde::Serialize;

/// Asset name of the aggregate row
pub const TOTAL_ROW: &str = "TOTAL";

/// One open lot (or the aggregate row) valued at the year-end price
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndOfYearBalance {
    pub lot_id: Option<i64>,
    pub asset: String,
    pub acquired_date: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub description: String,
}

impl EndOfYearBalance {
    pub fn is_total(&self) -> bool {
        self.lot_id.is_none() && self.asset == TOTAL_ROW
    }
}

/// Value each open lot at `price` and append the aggregate row.
///
/// Remaining basis is the lot's basis scaled by the share still held. Cost and
/// value are rounded to the cent with ties toward zero so basis is never
/// overstated. A price too large to value the holdings with is rejected.
pub fn value_open_lots(
    lots: &[BitcoinLot],
    price: Decimal,
) -> Result<Vec<EndOfYearBalance>, ReportError> {
    let overflow = |lot_id: i64| {
        ReportError::DataIntegrity(format!(
            "valuing lot {} at price {} overflows",
            lot_id, price
        ))
    };

    let mut rows = Vec::with_capacity(lots.len() + 1);
    let mut total_quantity = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    let mut total_value = Decimal::ZERO;

    for lot in lots {
        if let Some(total) = lot.total_btc {
            if lot.remaining_btc > total {
                log::warn!(
                    "Lot {} has more remaining ({}) than acquired ({})",
                    lot.id,
                    lot.remaining_btc,
                    total
                );
            }
        }

        let cost = lot
            .remaining_fraction()
            .and_then(|fraction| or_zero(lot.cost_basis_usd).checked_mul(fraction))
            .map(usd)
            .ok_or_else(|| overflow(lot.id))?;
        let value = lot
            .remaining_btc
            .checked_mul(price)
            .map(usd)
            .ok_or_else(|| overflow(lot.id))?;
        log::debug!(
            "Lot {} remaining={} cost={} value={}",
            lot.id,
            lot.remaining_btc,
            cost,
            value
        );

        rows.push(EndOfYearBalance {
            lot_id: Some(lot.id),
            asset: BTC.to_string(),
            acquired_date: lot.acquired_date.render(),
            quantity: btc(lot.remaining_btc),
            cost,
            value,
            description: format!("EOY approx @ ${} / BTC", price),
        });

        total_quantity = total_quantity
            .checked_add(lot.remaining_btc)
            .ok_or_else(|| overflow(lot.id))?;
        total_cost = total_cost.checked_add(cost).ok_or_else(|| overflow(lot.id))?;
        total_value = total_value.checked_add(value).ok_or_else(|| overflow(lot.id))?;
    }

    rows.push(EndOfYearBalance {
        lot_id: None,
        asset: TOTAL_ROW.to_string(),
        acquired_date: None,
        quantity: btc(total_quantity),
        cost: usd(total_cost),
        value: usd(total_value),
        description: String::new(),
    });
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::fixtures::lot;
    use crate::core::transaction::UNKNOWN_DATE;
    use rust_decimal_macros::dec;

    #[test]
    fn half_remaining_lot() {
        let lots = vec![lot(1, "2023-02-01", dec!(1.0), dec!(0.5), dec!(20000.00))];
        let rows = value_open_lots(&lots, dec!(40000.00)).unwrap();

        assert_eq!(rows.len(), 2);
        let row = &rows[0];
        assert_eq!(row.lot_id, Some(1));
        assert_eq!(row.asset, "BTC");
        assert_eq!(row.quantity.to_string(), "0.50000000");
        assert_eq!(row.cost, dec!(10000.00));
        assert_eq!(row.value, dec!(20000.00));
        assert_eq!(row.acquired_date.as_deref(), Some("2023-02-01T00:00:00+00:00"));
        assert_eq!(row.description, "EOY approx @ $40000.00 / BTC");
    }

    #[test]
    fn cost_rounds_half_down() {
        // 0.01 * 1/8 = 0.00125 -> 0.00; 100.05 * 1/2 = 50.025 -> 50.02
        let lots = vec![
            lot(1, "2023-01-01", dec!(8), dec!(1), dec!(0.01)),
            lot(2, "2023-01-02", dec!(2), dec!(1), dec!(100.05)),
        ];
        let rows = value_open_lots(&lots, dec!(0.005)).unwrap();

        assert_eq!(rows[0].cost, dec!(0.00));
        assert_eq!(rows[1].cost, dec!(50.02));
        // 1 * 0.005 = 0.005 -> 0.00
        assert_eq!(rows[1].value, dec!(0.00));
    }

    #[test]
    fn zero_total_uses_whole_basis() {
        let lots = vec![lot(1, "2023-01-01", dec!(0), dec!(0.3), dec!(900))];
        let rows = value_open_lots(&lots, dec!(100)).unwrap();
        assert_eq!(rows[0].cost, dec!(900.00));
        assert_eq!(rows[0].value, dec!(30.00));
    }

    #[test]
    fn total_row_sums_lots() {
        let lots = vec![
            lot(1, "2021-01-01", dec!(1), dec!(0.12345678), dec!(10000)),
            lot(2, "2022-01-01", dec!(2), dec!(1.5), dec!(60000)),
            lot(3, "2023-01-01", dec!(0.3), dec!(0.3), dec!(6000.33)),
        ];
        let rows = value_open_lots(&lots, dec!(50000)).unwrap();
        let total = rows.last().unwrap();

        assert!(total.is_total());
        assert_eq!(total.acquired_date, None);
        assert_eq!(total.description, "");

        let lot_rows = &rows[..rows.len() - 1];
        let quantity: Decimal = lot_rows.iter().map(|r| r.quantity).sum();
        let cost: Decimal = lot_rows.iter().map(|r| r.cost).sum();
        let value: Decimal = lot_rows.iter().map(|r| r.value).sum();
        assert!((quantity - total.quantity).abs() <= dec!(0.00000001));
        assert_eq!(cost, total.cost);
        assert_eq!(value, total.value);
        assert_eq!(total.quantity, dec!(1.92345678));
    }

    #[test]
    fn no_lots_yields_zero_total_row() {
        let rows = value_open_lots(&[], dec!(50000)).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_total());
        assert_eq!(rows[0].quantity, Decimal::ZERO);
        assert_eq!(rows[0].value, Decimal::ZERO);
    }

    #[test]
    fn oversized_price_is_integrity_error() {
        let lots = vec![lot(7, "2023-01-01", dec!(2), dec!(2), dec!(100))];
        let err = value_open_lots(&lots, Decimal::MAX).unwrap_err();
        assert!(matches!(err, ReportError::DataIntegrity(msg) if msg.contains("lot 7")));
    }

    #[test]
    fn overflowing_total_is_integrity_error() {
        let lots = vec![
            lot(1, "2023-01-01", dec!(1), dec!(1), dec!(100)),
            lot(2, "2023-01-02", dec!(1), dec!(1), dec!(100)),
        ];
        // each lot fits on its own, their sum does not
        let price = Decimal::MAX - dec!(1);
        assert!(matches!(
            value_open_lots(&lots, price),
            Err(ReportError::DataIntegrity(_))
        ));
    }

    #[test]
    fn malformed_acquired_date_marked_unknown() {
        let lots = vec![lot(1, "sometime in 2019", dec!(1), dec!(1), dec!(5000))];
        let rows = value_open_lots(&lots, dec!(1)).unwrap();
        assert_eq!(rows[0].acquired_date.as_deref(), Some(UNKNOWN_DATE));
    }
}
