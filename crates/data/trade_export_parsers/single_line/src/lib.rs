//! Parser for the legacy single-line format: one record per matching line
//! (symbol, market, order type, side, quote amount/asset, price/asset,
//! base amount/asset), optionally followed by a fee line ("amount asset")
//! and/or a time line ("YYYY-MM-DD HH:MM:SS orderId tradeId"), each consumed
//! greedily when the next line matches. This is the final fallback format;
//! every non-matching line is reported as an error and skipped.

use log::warn;
use models::{ParseResult, TradeRecord, TradeSide};
use regex::Regex;
use std::sync::LazyLock;
use utils::parse_amount;

pub const PARSER_NAME: &str = "single_line";

static MAIN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\S+)\s+(\S+)\s+(\S+)\s+(Buy|Sell)\s+([\d,.]+)\s+(\S+)\s+([\d,.]+)\s+(\S+)\s+([\d,.]+)\s+(\S+)",
    )
    .unwrap()
});

static FEE_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([\d,.]+)\s+(\S+)").unwrap());

static TIME_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})\s+(\S+)\s+(\S+)").unwrap()
});

pub fn parse(lines: &[String]) -> ParseResult {
    let mut result = ParseResult::default();
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        let Some(caps) = MAIN_LINE.captures(line) else {
            warn!("single line: unmatched line: {line}");
            result
                .errors
                .push(format!("Could not parse trade line: \"{line}\""));
            i += 1;
            continue;
        };

        // The anchor regex only admits "Buy"/"Sell", so the side always maps.
        let Some(side) = TradeSide::parse_loose(&caps[4]) else {
            i += 1;
            continue;
        };

        let mut trade = TradeRecord {
            symbol: caps[1].to_string(),
            market_type: caps[2].to_string(),
            order_type: caps[3].to_string(),
            side,
            price: parse_amount(&caps[7]).unwrap_or(0.0),
            price_asset: caps[8].to_string(),
            base_amount: parse_amount(&caps[9]).unwrap_or(0.0),
            base_asset: caps[10].to_string(),
            quote_amount: parse_amount(&caps[5]).unwrap_or(0.0),
            quote_asset: caps[6].to_string(),
            fee_amount: None,
            fee_asset: None,
            time: None,
            order_id: None,
            trade_id: None,
            session_id: None,
            raw_lines: vec![line.clone()],
        };

        let mut next = i + 1;

        if let Some(fee_line) = lines.get(next) {
            if let Some(fee_caps) = FEE_LINE.captures(fee_line) {
                trade.fee_amount = parse_amount(&fee_caps[1]);
                trade.fee_asset = Some(fee_caps[2].to_string());
                trade.raw_lines.push(fee_line.clone());
                next += 1;
            }
        }

        if let Some(time_line) = lines.get(next) {
            if let Some(time_caps) = TIME_LINE.captures(time_line) {
                trade.time = Some(time_caps[1].to_string());
                trade.order_id = Some(time_caps[2].to_string());
                trade.trade_id = Some(time_caps[3].to_string());
                trade.raw_lines.push(time_line.clone());
                next += 1;
            }
        }

        result.trades.push(trade);
        i = next;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_lines(rows: &[&str]) -> Vec<String> {
        rows.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn main_line_with_fee_and_time_continuations() {
        let lines = to_lines(&[
            "SOL/USDT Spot Limit Sell 720.700000 USDT 144.14 USDT 5.0000 SOL",
            "0.72 USDT",
            "2024-03-01 10:15:00 ORD1 TRD1",
        ]);
        let result = parse(&lines);
        assert!(result.errors.is_empty());
        assert_eq!(result.trades.len(), 1);

        let trade = &result.trades[0];
        assert_eq!(trade.symbol, "SOL/USDT");
        assert_eq!(trade.side, TradeSide::Sell);
        assert_eq!(trade.price, 144.14);
        assert_eq!(trade.base_amount, 5.0);
        assert_eq!(trade.quote_amount, 720.7);
        assert_eq!(trade.fee_amount, Some(0.72));
        assert_eq!(trade.fee_asset.as_deref(), Some("USDT"));
        assert_eq!(trade.time.as_deref(), Some("2024-03-01 10:15:00"));
        assert_eq!(trade.order_id.as_deref(), Some("ORD1"));
        assert_eq!(trade.trade_id.as_deref(), Some("TRD1"));
        assert_eq!(trade.raw_lines.len(), 3);
    }

    #[test]
    fn bare_main_line_has_no_fee_or_time() {
        let lines = to_lines(&["SOL/USDT Spot Limit Buy 144.14 USDT 144.14 USDT 1.0 SOL"]);
        let result = parse(&lines);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].fee_amount, None);
        assert!(result.trades[0].time.is_none());
    }

    #[test]
    fn unmatched_lines_produce_one_error_each() {
        let lines = to_lines(&[
            "garbage",
            "SOL/USDT Spot Limit Buy 144.14 USDT 144.14 USDT 1.0 SOL",
            "more garbage",
        ]);
        let result = parse(&lines);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn every_line_failing_still_returns_a_result() {
        let lines = to_lines(&["nothing", "matches", "here"]);
        let result = parse(&lines);
        assert!(result.trades.is_empty());
        assert_eq!(result.errors.len(), 3);
    }
}
