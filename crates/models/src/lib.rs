use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Direction of an executed spot trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Accepts any capitalization of "buy"/"sell"; everything else is unmapped.
    pub fn parse_loose(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "BUY" => Some(TradeSide::Buy),
            "SELL" => Some(TradeSide::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "Buy",
            TradeSide::Sell => "Sell",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical executed-trade record shared by every export parser, the ledger
/// merge and the PnL engine.
///
/// `quote_amount` is stored independently of `price * base_amount` because
/// several source exports report the filled value directly. `time`, fees and
/// identifiers are optional; exports differ in what they carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    /// Displayed as "BASE/QUOTE".
    pub symbol: String,
    pub market_type: String,
    pub order_type: String,
    pub side: TradeSide,
    /// Quote-per-base units.
    pub price: f64,
    pub price_asset: String,
    pub base_amount: f64,
    pub base_asset: String,
    pub quote_amount: f64,
    pub quote_asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_asset: Option<String>,
    /// Canonical "YYYY-MM-DD HH:MM:SS" form; absence is legal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<String>,
    /// Assigned by the external persistence layer, never by the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Source lines that produced this record, kept for diagnostics.
    #[serde(default)]
    pub raw_lines: Vec<String>,
}

/// Outcome of one parse run: whatever records were extracted plus one
/// diagnostic per line/group that failed every pattern of the active format.
/// Errors never replace partial success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseResult {
    pub trades: Vec<TradeRecord>,
    pub errors: Vec<String>,
}

impl ParseResult {
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

/// A live quote supplied by the external price provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    /// Milliseconds since the Unix epoch; freshness is the provider's concern.
    pub updated_at: i64,
}

/// Remaining exposure in one symbol after FIFO consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSummary {
    pub symbol: String,
    pub qty: f64,
    #[serde(rename = "avgCost")]
    pub avg_cost: f64,
    #[serde(rename = "marketPrice", default, skip_serializing_if = "Option::is_none")]
    pub market_price: Option<f64>,
    /// 0 when no market price was supplied for the symbol.
    #[serde(rename = "unrealizedPnL")]
    pub unrealized_pnl: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PnLSummary {
    #[serde(rename = "realizedPnL")]
    pub realized_pnl: f64,
    #[serde(rename = "unrealizedPnL")]
    pub unrealized_pnl: f64,
    /// Fee asset -> summed fee amount, across every trade with a fee.
    #[serde(rename = "feeTotals")]
    pub fee_totals: BTreeMap<String, f64>,
    pub positions: Vec<PositionSummary>,
}

/// One entry per processed trade; the running realized total after it.
/// Timeline length always equals trade count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnLPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(rename = "realizedPnL")]
    pub realized_pnl: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_parses_any_capitalization() {
        assert_eq!(TradeSide::parse_loose("BUY"), Some(TradeSide::Buy));
        assert_eq!(TradeSide::parse_loose("sell"), Some(TradeSide::Sell));
        assert_eq!(TradeSide::parse_loose(" Buy "), Some(TradeSide::Buy));
        assert_eq!(TradeSide::parse_loose("short"), None);
    }

    #[test]
    fn trade_record_serializes_with_camel_case_fields() {
        let record = TradeRecord {
            symbol: "SOL/USDT".to_string(),
            market_type: "Spot".to_string(),
            order_type: "Limit".to_string(),
            side: TradeSide::Sell,
            price: 144.14,
            price_asset: "USDT".to_string(),
            base_amount: 5.0,
            base_asset: "SOL".to_string(),
            quote_amount: 720.7,
            quote_asset: "USDT".to_string(),
            fee_amount: Some(0.72),
            fee_asset: Some("USDT".to_string()),
            time: Some("2024-03-01 10:15:00".to_string()),
            order_id: Some("ORD1".to_string()),
            trade_id: None,
            session_id: None,
            raw_lines: vec!["raw".to_string()],
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["quoteAmount"], 720.7);
        assert_eq!(json["baseAsset"], "SOL");
        assert_eq!(json["side"], "Sell");
        assert!(json.get("tradeId").is_none());
    }
}
