//! Parser for multi-line "block" exports. A record starts at an anchor line
//! carrying "Spot" plus a Buy/Sell token, in one of two shapes: the full
//! shape has quote amount, price and base amount inline; the short shape has
//! only the quote amount and relies on continuation lines for the rest.
//! After the anchor the parser consumes, in order: an optional price line
//! ("price/asset"), an optional quantity line ("qty/asset"), any number of
//! bare "--" separators, an optional quote-amount confirmation line, a
//! status line, and an optional "time orderId" line. A status other than
//! "Filled" discards the whole record without reporting an error.

use log::{debug, warn};
use models::{ParseResult, TradeRecord, TradeSide};
use regex::Regex;
use std::sync::LazyLock;
use utils::parse_amount;

pub const PARSER_NAME: &str = "block_export";

static MAIN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\S+)\s+(\S+)\s+(\S+)\s+(Buy|Sell)\s+([\d,.]+)\s+(\S+)\s+([\d,.]+)\s+(\S+)\s+([\d,.]+)\s+(\S+)",
    )
    .unwrap()
});

static SHORT_MAIN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\S+)\s+(\S+)\s+(\S+)\s+(Buy|Sell)\s+([\d,.]+)\s+(\S+)\s*$").unwrap()
});

static TIME_ORDER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})\s+(\S+)").unwrap());

fn is_anchor_candidate(line: &str) -> bool {
    line.contains("Spot") && (line.contains("Buy") || line.contains("Sell"))
}

fn match_anchor(line: &str) -> Option<TradeRecord> {
    if let Some(caps) = MAIN_LINE.captures(line) {
        let side = TradeSide::parse_loose(&caps[4])?;
        return Some(TradeRecord {
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
            raw_lines: vec![line.to_string()],
        });
    }
    if let Some(caps) = SHORT_MAIN_LINE.captures(line) {
        let side = TradeSide::parse_loose(&caps[4])?;
        let symbol = caps[1].to_string();
        let quote_asset = caps[6].to_string();
        // Price and base amount stay 0 until continuation lines overwrite
        // them; absent continuations keep the zeros.
        let base_asset = symbol
            .split_once('/')
            .map(|(base, _)| base.to_string())
            .unwrap_or_else(|| symbol.clone());
        return Some(TradeRecord {
            symbol,
            market_type: caps[2].to_string(),
            order_type: caps[3].to_string(),
            side,
            price: 0.0,
            price_asset: quote_asset.clone(),
            base_amount: 0.0,
            base_asset,
            quote_amount: parse_amount(&caps[5]).unwrap_or(0.0),
            quote_asset,
            fee_amount: None,
            fee_asset: None,
            time: None,
            order_id: None,
            trade_id: None,
            session_id: None,
            raw_lines: vec![line.to_string()],
        });
    }
    None
}

/// Applies a "value/asset" continuation line, returning (amount, asset).
fn split_slash_line(line: &str) -> (Option<f64>, Option<String>) {
    let mut parts = line.split_whitespace();
    let first = parts.next().unwrap_or("");
    let asset = parts.next().map(|s| s.to_string());
    let amount = first
        .split('/')
        .next()
        .filter(|v| !v.is_empty())
        .map(|v| parse_amount(v).unwrap_or(0.0));
    (amount, asset)
}

pub fn parse(lines: &[String]) -> ParseResult {
    let mut result = ParseResult::default();
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        if !is_anchor_candidate(line) {
            i += 1;
            continue;
        }
        let Some(mut trade) = match_anchor(line) else {
            warn!("block export: anchor did not match either shape: {line}");
            result
                .errors
                .push(format!("Could not parse trade line: \"{line}\""));
            i += 1;
            continue;
        };

        let mut next = i + 1;

        if let Some(price_line) = lines.get(next) {
            if price_line.contains('/') {
                let (amount, asset) = split_slash_line(price_line);
                if let Some(price) = amount {
                    trade.price = price;
                    if let Some(asset) = asset {
                        trade.price_asset = asset;
                    }
                }
                trade.raw_lines.push(price_line.clone());
                next += 1;
            }
        }

        if let Some(qty_line) = lines.get(next) {
            if qty_line.contains('/') {
                let (amount, asset) = split_slash_line(qty_line);
                if let Some(qty) = amount {
                    trade.base_amount = qty;
                    if let Some(asset) = asset {
                        trade.base_asset = asset;
                    }
                }
                trade.raw_lines.push(qty_line.clone());
                next += 1;
            }
        }

        while lines.get(next).is_some_and(|l| l == "--") {
            trade.raw_lines.push(lines[next].clone());
            next += 1;
        }

        if let Some(quote_line) = lines.get(next) {
            if quote_line.to_uppercase().contains(&trade.quote_asset) {
                let amount = quote_line.split_whitespace().next().unwrap_or("");
                trade.quote_amount = parse_amount(amount).unwrap_or(0.0);
                trade.raw_lines.push(quote_line.clone());
                next += 1;
            }
        }

        if let Some(status_line) = lines.get(next) {
            trade.raw_lines.push(status_line.clone());
            if status_line != "Filled" {
                // The order never executed; drop the record silently and
                // resume scanning after the status line.
                debug!("block export: skipping non-executed order: {status_line}");
                i = next + 1;
                continue;
            }
            next += 1;
        }

        if let Some(time_line) = lines.get(next) {
            if let Some(caps) = TIME_ORDER_LINE.captures(time_line) {
                trade.time = Some(caps[1].to_string());
                trade.order_id = Some(caps[2].to_string());
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
    fn full_anchor_with_status_and_time() {
        let lines = to_lines(&[
            "SOL/USDT Spot Limit Sell 720.700000 USDT 144.14 USDT 5.0000 SOL",
            "Filled",
            "2024-03-01 10:15:00 ORD123",
        ]);
        let result = parse(&lines);
        assert!(result.errors.is_empty());
        assert_eq!(result.trades.len(), 1);

        let trade = &result.trades[0];
        assert_eq!(trade.side, TradeSide::Sell);
        assert_eq!(trade.price, 144.14);
        assert_eq!(trade.base_amount, 5.0);
        assert_eq!(trade.quote_amount, 720.7);
        assert_eq!(trade.time.as_deref(), Some("2024-03-01 10:15:00"));
        assert_eq!(trade.order_id.as_deref(), Some("ORD123"));
        assert_eq!(trade.raw_lines.len(), 3);
    }

    #[test]
    fn short_anchor_filled_by_continuation_lines() {
        let lines = to_lines(&[
            "BTC/USDT Spot Market Buy 1,000.00 USDT",
            "65000.00/USDT",
            "0.01530000/BTC",
            "--",
            "994.50 USDT",
            "Filled",
            "2024-03-02 09:30:00 ORD456",
        ]);
        let result = parse(&lines);
        assert!(result.errors.is_empty());
        assert_eq!(result.trades.len(), 1);

        let trade = &result.trades[0];
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.price, 65000.0);
        assert_eq!(trade.base_amount, 0.0153);
        // The quote confirmation line overwrites the anchor amount.
        assert_eq!(trade.quote_amount, 994.5);
        assert_eq!(trade.order_id.as_deref(), Some("ORD456"));
    }

    #[test]
    fn short_anchor_without_continuations_keeps_zero_defaults() {
        let lines = to_lines(&["ETH/USDT Spot Limit Buy 500.00 USDT", "Filled"]);
        let result = parse(&lines);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].price, 0.0);
        assert_eq!(result.trades[0].base_amount, 0.0);
        assert_eq!(result.trades[0].quote_amount, 500.0);
    }

    #[test]
    fn non_filled_status_discards_record_silently() {
        let lines = to_lines(&[
            "SOL/USDT Spot Limit Sell 720.70 USDT 144.14 USDT 5.0 SOL",
            "Cancelled",
            "SOL/USDT Spot Limit Sell 100.00 USDT 100.00 USDT 1.0 SOL",
            "Filled",
        ]);
        let result = parse(&lines);
        assert!(result.errors.is_empty());
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].quote_amount, 100.0);
    }

    #[test]
    fn anchor_candidate_failing_both_shapes_is_an_error() {
        let lines = to_lines(&["Spot Buy but nothing else matches here !!"]);
        let result = parse(&lines);
        assert!(result.trades.is_empty());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn unrelated_lines_are_skipped_without_comment() {
        let lines = to_lines(&[
            "Order history",
            "SOL/USDT Spot Limit Sell 720.70 USDT 144.14 USDT 5.0 SOL",
            "Filled",
        ]);
        let result = parse(&lines);
        assert!(result.errors.is_empty());
        assert_eq!(result.trades.len(), 1);
    }
}
