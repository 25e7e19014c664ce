//! Parser for "vertical" exports carrying one field per line. A group is:
//! symbol (must contain "/"), market type, order type, side, a
//! "quoteAmount quoteAsset" line, a bare price line, a "baseAmount baseAsset"
//! line, then an optional fee block ("Trade" label + "feeAmount feeAsset").
//! After the fixed block, "--" separators are skipped, an optional canonical
//! timestamp line and an optional order-id line are consumed, and trailing
//! "--" separators are skipped before the scan resumes. A bad side advances
//! by a single line, not the whole group width, to resynchronize.

use log::warn;
use models::{ParseResult, TradeRecord, TradeSide};
use utils::{is_canonical_timestamp, parse_amount};

pub const PARSER_NAME: &str = "vertical_export";

pub fn parse(lines: &[String]) -> ParseResult {
    let mut result = ParseResult::default();
    let mut i = 0;

    while i < lines.len() {
        let symbol_line = &lines[i];
        if !symbol_line.contains('/') {
            i += 1;
            continue;
        }

        let market_type = lines.get(i + 1);
        let order_type = lines.get(i + 2);
        let side_raw = lines.get(i + 3);
        let quote_line = lines.get(i + 4);

        let (Some(market_type), Some(order_type), Some(side_raw), Some(quote_line)) =
            (market_type, order_type, side_raw, quote_line)
        else {
            i += 1;
            continue;
        };

        let Some(side) = TradeSide::parse_loose(side_raw) else {
            warn!("vertical export: unmapped side {side_raw:?}");
            result
                .errors
                .push(format!("Unrecognized trade side: \"{side_raw}\""));
            i += 1;
            continue;
        };

        let mut quote_parts = quote_line.split_whitespace();
        let quote_amount = parse_amount(quote_parts.next().unwrap_or("")).unwrap_or(0.0);
        let quote_asset = quote_parts.next().unwrap_or("USDT").to_string();

        let price_line = lines.get(i + 5);
        let qty_line = lines.get(i + 6);

        let mut base_parts = qty_line.map(|l| l.split_whitespace()).into_iter().flatten();
        let base_amount_raw = base_parts.next();
        let base_asset = base_parts
            .next()
            .map(|s| s.to_string())
            .unwrap_or_else(|| {
                symbol_line
                    .split('/')
                    .next()
                    .unwrap_or(symbol_line)
                    .to_string()
            });

        let mut trade = TradeRecord {
            symbol: symbol_line.clone(),
            market_type: market_type.clone(),
            order_type: order_type.clone(),
            side,
            price: price_line.and_then(|l| parse_amount(l)).unwrap_or(0.0),
            price_asset: quote_asset.clone(),
            base_amount: base_amount_raw.and_then(parse_amount).unwrap_or(0.0),
            base_asset,
            quote_amount,
            quote_asset,
            fee_amount: None,
            fee_asset: None,
            time: None,
            order_id: None,
            trade_id: None,
            session_id: None,
            raw_lines: vec![
                symbol_line.clone(),
                market_type.clone(),
                order_type.clone(),
                side_raw.clone(),
                quote_line.clone(),
            ],
        };

        let fee_label = lines.get(i + 7);
        let fee_line = lines.get(i + 8);
        if let (Some(label), Some(fee_line)) = (fee_label, fee_line) {
            if label.eq_ignore_ascii_case("Trade") {
                let mut fee_parts = fee_line.split_whitespace();
                trade.fee_amount = fee_parts.next().and_then(parse_amount);
                trade.fee_asset = fee_parts.next().map(|s| s.to_string());
                trade.raw_lines.push(label.clone());
                trade.raw_lines.push(fee_line.clone());
            }
        }

        // The cursor resumes after the fixed nine-line window whether or not
        // the fee block was present.
        let mut cursor = i + 9;
        while lines.get(cursor).is_some_and(|l| l == "--") {
            cursor += 1;
        }
        if let Some(time_line) = lines.get(cursor) {
            if is_canonical_timestamp(time_line) {
                trade.time = Some(time_line.clone());
                trade.raw_lines.push(time_line.clone());
                cursor += 1;
            }
        }
        if let Some(order_line) = lines.get(cursor) {
            if order_line != "--" {
                trade.order_id = Some(order_line.clone());
                trade.raw_lines.push(order_line.clone());
                cursor += 1;
            }
        }
        while lines.get(cursor).is_some_and(|l| l == "--") {
            cursor += 1;
        }

        result.trades.push(trade);
        i = cursor;
    }

    result
}
