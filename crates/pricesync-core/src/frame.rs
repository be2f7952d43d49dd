//! Conversion of price history into a polars [`DataFrame`].

use chrono::NaiveDate;
use polars::prelude::*;

use crate::{
    error::{Result, SyncError},
    types::PriceBar,
};

/// Builds a frame with columns `symbol, date, open, high, low, close, adjusted_close,
/// volume, dividend_amount, split_coefficient, source`, preserving the input order.
///
/// # Errors
/// Returns [`SyncError::Other`] if polars rejects the columns.
pub fn bars_to_frame(bars: &[PriceBar]) -> Result<DataFrame> {
    // NaiveDate::default() is the Unix epoch, which polars uses as day zero.
    let epoch = NaiveDate::default();

    let symbols: Vec<String> = bars.iter().map(|b| b.symbol.to_string()).collect();
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch).num_days() as i32)
        .collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let adj_closes: Vec<f64> = bars.iter().map(|b| b.adjusted_close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let dividends: Vec<f64> = bars.iter().map(|b| b.dividend_amount).collect();
    let splits: Vec<f64> = bars.iter().map(|b| b.split_coefficient).collect();
    let sources: Vec<String> = bars.iter().map(|b| b.source.clone()).collect();

    let df = DataFrame::new(vec![
        Column::new("symbol".into(), symbols),
        Column::new("date".into(), dates),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("adjusted_close".into(), adj_closes),
        Column::new("volume".into(), volumes),
        Column::new("dividend_amount".into(), dividends),
        Column::new("split_coefficient".into(), splits),
        Column::new("source".into(), sources),
    ])
    .map_err(|e| SyncError::Other(e.to_string()))?;

    df.lazy()
        .with_column(col("date").cast(DataType::Date))
        .collect()
        .map_err(|e| SyncError::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Symbol;
    use chrono::Utc;

    #[test]
    fn test_bars_to_frame() {
        let bars = vec![
            PriceBar::new(
                Symbol::new("AAPL"),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                151.0,
                153.0,
                150.0,
                152.0,
                1_100_000.0,
                "FMP",
                Utc::now(),
            ),
            PriceBar::new(
                Symbol::new("AAPL"),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                150.0,
                152.0,
                149.0,
                151.0,
                1_000_000.0,
                "FMP",
                Utc::now(),
            ),
        ];

        let df = bars_to_frame(&bars).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 11);
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_empty_history() {
        let df = bars_to_frame(&[]).unwrap();
        assert_eq!(df.height(), 0);
    }
}
