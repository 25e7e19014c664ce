//! Parser for headerless tabular exports. Two positional layouts exist,
//! distinguished only by whether the last column is an "M/D/YYYY H:MM"
//! timestamp:
//!
//! A) symbol feeCoin feeAmount feesJson orderType side value price avgPrice
//!    qty filledValue status orderNo [orderNo]
//! B) symbol orderType side feeCoin feeAmount filledValue filledPrice
//!    filledQty fees txnId orderNo timestamp
//!
//! Variant A rows whose status is present and not FILLED represent orders
//! that never executed; they are excluded silently, not reported as errors.

use log::{debug, warn};
use models::{ParseResult, TradeRecord, TradeSide};
use utils::{is_mdy_short_timestamp, parse_amount, parse_timestamp_mdy, split_row, symbol_to_pair};

pub const PARSER_NAME: &str = "headerless_table";

fn col<'a>(cols: &'a [String], idx: usize) -> &'a str {
    cols.get(idx).map(|s| s.as_str()).unwrap_or("")
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn parse(lines: &[String]) -> ParseResult {
    let mut result = ParseResult::default();

    for line in lines {
        let cols = split_row(line);
        if cols.len() < 12 {
            continue;
        }
        let is_variant_b = is_mdy_short_timestamp(col(&cols, cols.len() - 1));

        let pair = symbol_to_pair(col(&cols, 0));
        let side_raw = if is_variant_b { col(&cols, 2) } else { col(&cols, 5) };
        let Some(side) = TradeSide::parse_loose(side_raw) else {
            warn!("headerless table: unmapped side {side_raw:?}: {line}");
            result
                .errors
                .push(format!("Unrecognized trade side: \"{line}\""));
            continue;
        };

        if is_variant_b {
            let fees = col(&cols, 8);
            let fee_amount_raw = col(&cols, 4);
            // An explicit fees value takes precedence over the feeAmount slot.
            let fee_amount = if !fees.is_empty() {
                parse_amount(fees)
            } else if !fee_amount_raw.is_empty() {
                parse_amount(fee_amount_raw)
            } else {
                None
            };

            result.trades.push(TradeRecord {
                symbol: pair.symbol,
                market_type: "Spot".to_string(),
                order_type: col(&cols, 1).to_string(),
                side,
                price: parse_amount(col(&cols, 6)).unwrap_or(0.0),
                price_asset: pair.quote.clone(),
                base_amount: parse_amount(col(&cols, 7)).unwrap_or(0.0),
                base_asset: pair.base,
                quote_amount: parse_amount(col(&cols, 5)).unwrap_or(0.0),
                quote_asset: pair.quote,
                fee_amount,
                fee_asset: non_empty(col(&cols, 3)),
                time: parse_timestamp_mdy(col(&cols, 11)),
                order_id: non_empty(col(&cols, 10)),
                trade_id: non_empty(col(&cols, 9)),
                session_id: None,
                raw_lines: vec![line.clone()],
            });
            continue;
        }

        // Variant A: a non-FILLED status means the order never executed.
        let status = col(&cols, 11).to_uppercase();
        if !status.is_empty() && status != "FILLED" {
            debug!("headerless table: skipping non-executed order: {line}");
            continue;
        }

        let order_no = if cols.len() > 12 { col(&cols, 12) } else { col(&cols, 11) };
        let fee_amount_raw = col(&cols, 2);

        result.trades.push(TradeRecord {
            symbol: pair.symbol,
            market_type: "Spot".to_string(),
            order_type: col(&cols, 4).to_string(),
            side,
            price: parse_amount(col(&cols, 7)).unwrap_or(0.0),
            price_asset: pair.quote.clone(),
            base_amount: parse_amount(col(&cols, 9)).unwrap_or(0.0),
            base_asset: pair.base,
            quote_amount: parse_amount(col(&cols, 6)).unwrap_or(0.0),
            quote_asset: pair.quote,
            fee_amount: if fee_amount_raw.is_empty() {
                None
            } else {
                parse_amount(fee_amount_raw)
            },
            fee_asset: non_empty(col(&cols, 1)),
            time: None,
            order_id: non_empty(order_no),
            trade_id: None,
            session_id: None,
            raw_lines: vec![line.clone()],
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_lines(rows: &[&str]) -> Vec<String> {
        rows.iter().map(|s| s.to_string()).collect()
    }

    const VARIANT_A_ROW: &str = "SOLUSDT\tSOL\t0.005\t{\"fees\":[]}\tLimit\tBuy\t720.70\t144.14\t144.14\t5.0\t720.70\tFILLED\tORD100";

    #[test]
    fn variant_a_positions() {
        let result = parse(&to_lines(&[VARIANT_A_ROW]));
        assert!(result.errors.is_empty());
        assert_eq!(result.trades.len(), 1);

        let trade = &result.trades[0];
        assert_eq!(trade.symbol, "SOL/USDT");
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.quote_amount, 720.7);
        assert_eq!(trade.price, 144.14);
        assert_eq!(trade.base_amount, 5.0);
        assert_eq!(trade.fee_amount, Some(0.005));
        assert_eq!(trade.fee_asset.as_deref(), Some("SOL"));
        assert_eq!(trade.order_id.as_deref(), Some("ORD100"));
        assert!(trade.time.is_none());
    }

    #[test]
    fn variant_a_non_filled_status_is_silently_excluded() {
        let row = VARIANT_A_ROW.replace("FILLED", "Cancelled");
        let result = parse(&to_lines(&[&row]));
        assert!(result.trades.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn variant_b_positions_and_fee_precedence() {
        let row = "SOLUSDT\tLimit\tSELL\tUSDT\t0.10\t300.00\t150.00\t2.0\t0.30\tTX9\tORD9\t3/2/2024 11:00";
        let result = parse(&to_lines(&[row]));
        assert!(result.errors.is_empty());
        assert_eq!(result.trades.len(), 1);

        let trade = &result.trades[0];
        assert_eq!(trade.side, TradeSide::Sell);
        assert_eq!(trade.quote_amount, 300.0);
        assert_eq!(trade.price, 150.0);
        assert_eq!(trade.base_amount, 2.0);
        // "fees" wins over the feeAmount slot.
        assert_eq!(trade.fee_amount, Some(0.3));
        assert_eq!(trade.time.as_deref(), Some("2024-03-02 11:00:00"));
        assert_eq!(trade.trade_id.as_deref(), Some("TX9"));
        assert_eq!(trade.order_id.as_deref(), Some("ORD9"));
    }

    #[test]
    fn narrow_rows_are_skipped_without_error() {
        let result = parse(&to_lines(&["just a short line", "a\tb\tc"]));
        assert!(result.trades.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn bad_side_is_an_error() {
        let row = VARIANT_A_ROW.replace("\tBuy\t", "\tHold\t");
        let result = parse(&to_lines(&[&row]));
        assert!(result.trades.is_empty());
        assert_eq!(result.errors.len(), 1);
    }
}
