//! Parser for headered tabular exports: a header row naming the columns
//! ("Spot Pairs", "Order Type", "Direction", ...) followed by one data row
//! per fill. Column positions are resolved by case- and space-insensitive
//! name lookup, so reordered exports still parse.

use log::warn;
use models::{ParseResult, TradeRecord, TradeSide};
use utils::{normalize_header, parse_amount, parse_timestamp_mdy, split_row, symbol_to_pair};

pub const PARSER_NAME: &str = "headered_table";

struct HeaderIndex {
    cols: Vec<String>,
}

impl HeaderIndex {
    fn new(header_line: &str) -> Self {
        let cols = split_row(header_line)
            .iter()
            .map(|c| normalize_header(c))
            .collect();
        Self { cols }
    }

    fn len(&self) -> usize {
        self.cols.len()
    }

    fn find(&self, name: &str) -> Option<usize> {
        let wanted = normalize_header(name);
        self.cols.iter().position(|c| *c == wanted)
    }
}

fn cell<'a>(cols: &'a [String], idx: Option<usize>) -> &'a str {
    idx.and_then(|i| cols.get(i)).map(|s| s.as_str()).unwrap_or("")
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parses lines starting at the header row. Rows with fewer columns than the
/// header, or with an unmapped side, produce one error each and are skipped;
/// a malformed timestamp keeps the record with its time unset.
pub fn parse(lines: &[String]) -> ParseResult {
    let mut result = ParseResult::default();
    let Some(header_line) = lines.first() else {
        return result;
    };
    let header = HeaderIndex::new(header_line);

    let idx_symbol = header.find("spot pairs");
    let idx_order_type = header.find("order type");
    let idx_side = header.find("direction");
    let idx_fee_coin = header.find("feecoin");
    let idx_fee_alt = header.find("execfeev2");
    let idx_filled_value = header.find("filled value");
    let idx_filled_price = header.find("filled price");
    let idx_filled_qty = header.find("filled quantity");
    let idx_fees = header.find("fees");
    let idx_txn = header.find("transaction id");
    let idx_order_no = header.find("order no.");
    let idx_timestamp = header.find("timestamp (utc)");

    for line in &lines[1..] {
        let cols = split_row(line);
        if cols.len() < header.len() {
            warn!("headered table: not enough columns: {line}");
            result
                .errors
                .push(format!("Not enough columns in row: \"{line}\""));
            continue;
        }

        let pair = symbol_to_pair(cell(&cols, idx_symbol));
        let side_raw = cell(&cols, idx_side);
        let Some(side) = TradeSide::parse_loose(side_raw) else {
            warn!("headered table: unmapped side {side_raw:?}: {line}");
            result
                .errors
                .push(format!("Unrecognized trade side: \"{line}\""));
            continue;
        };

        // The generic "fees" column is authoritative; "execfeev2" is the
        // fallback spelling seen in older exports.
        let fee_raw = if idx_fees.is_some() {
            cell(&cols, idx_fees)
        } else {
            cell(&cols, idx_fee_alt)
        };
        let fee_amount = parse_amount(fee_raw).filter(|v| *v > 0.0);
        let fee_asset = non_empty(cell(&cols, idx_fee_coin));

        result.trades.push(TradeRecord {
            symbol: pair.symbol,
            market_type: "Spot".to_string(),
            order_type: cell(&cols, idx_order_type).to_string(),
            side,
            price: parse_amount(cell(&cols, idx_filled_price)).unwrap_or(0.0),
            price_asset: pair.quote.clone(),
            base_amount: parse_amount(cell(&cols, idx_filled_qty)).unwrap_or(0.0),
            base_asset: pair.base,
            quote_amount: parse_amount(cell(&cols, idx_filled_value)).unwrap_or(0.0),
            quote_asset: pair.quote,
            fee_amount,
            fee_asset,
            time: parse_timestamp_mdy(cell(&cols, idx_timestamp)),
            order_id: non_empty(cell(&cols, idx_order_no)),
            trade_id: non_empty(cell(&cols, idx_txn)),
            session_id: None,
            raw_lines: vec![line.clone()],
        });
    }

    result
}
