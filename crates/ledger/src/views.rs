use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use models::{TradeRecord, TradeSide};
use serde::Serialize;
use std::collections::HashMap;
use utils::{normalize_time, CANONICAL_TIME_FORMAT};

/// Predicate filter over the ledger. Every bound is optional; an unset bound
/// matches everything. Date bounds compare against midnight of the given
/// day, and trades without a timestamp are excluded whenever a date bound
/// is set.
#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    pub symbol: Option<String>,
    pub side: Option<TradeSide>,
    pub market_type: Option<String>,
    pub order_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_qty: Option<f64>,
    pub max_qty: Option<f64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl TradeFilter {
    pub fn matches(&self, trade: &TradeRecord) -> bool {
        if let Some(symbol) = &self.symbol {
            if trade.symbol != *symbol {
                return false;
            }
        }
        if let Some(side) = self.side {
            if trade.side != side {
                return false;
            }
        }
        if let Some(market_type) = &self.market_type {
            if trade.market_type != *market_type {
                return false;
            }
        }
        if let Some(order_type) = &self.order_type {
            if trade.order_type != *order_type {
                return false;
            }
        }

        if self.min_price.is_some_and(|min| trade.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| trade.price > max) {
            return false;
        }
        if self.min_qty.is_some_and(|min| trade.base_amount < min) {
            return false;
        }
        if self.max_qty.is_some_and(|max| trade.base_amount > max) {
            return false;
        }

        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(trade_time) = parse_trade_time(trade.time.as_deref()) else {
                return false;
            };
            if let Some(from) = self.date_from {
                if trade_time < from.and_time(NaiveTime::MIN) {
                    return false;
                }
            }
            if let Some(to) = self.date_to {
                if trade_time > to.and_time(NaiveTime::MIN) {
                    return false;
                }
            }
        }

        true
    }
}

fn parse_trade_time(time: Option<&str>) -> Option<NaiveDateTime> {
    let normalized = normalize_time(time);
    if normalized.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(&normalized, CANONICAL_TIME_FORMAT).ok()
}

pub fn filter_trades(trades: &[TradeRecord], filter: &TradeFilter) -> Vec<TradeRecord> {
    trades
        .iter()
        .filter(|trade| filter.matches(trade))
        .cloned()
        .collect()
}

/// Volume-weighted average buy and sell prices with the underlying
/// quantities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SideAverages {
    pub avg_buy: f64,
    pub avg_sell: f64,
    pub buy_qty: f64,
    pub sell_qty: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolAverages {
    pub symbol: String,
    #[serde(flatten)]
    pub averages: SideAverages,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeReport {
    pub total_quote: f64,
    pub total_base: f64,
    pub overall: SideAverages,
    pub per_symbol: Vec<SymbolAverages>,
}

#[derive(Default)]
struct SideAccumulator {
    buy_qty: f64,
    buy_cost: f64,
    sell_qty: f64,
    sell_proceeds: f64,
}

impl SideAccumulator {
    fn add(&mut self, trade: &TradeRecord) {
        match trade.side {
            TradeSide::Buy => {
                self.buy_qty += trade.base_amount;
                self.buy_cost += trade.base_amount * trade.price;
            }
            TradeSide::Sell => {
                self.sell_qty += trade.base_amount;
                self.sell_proceeds += trade.base_amount * trade.price;
            }
        }
    }

    fn averages(&self) -> SideAverages {
        SideAverages {
            avg_buy: if self.buy_qty > 0.0 {
                self.buy_cost / self.buy_qty
            } else {
                0.0
            },
            avg_sell: if self.sell_qty > 0.0 {
                self.sell_proceeds / self.sell_qty
            } else {
                0.0
            },
            buy_qty: self.buy_qty,
            sell_qty: self.sell_qty,
        }
    }
}

/// Volume totals and average-price rollups over a (usually pre-filtered)
/// trade slice. Per-symbol entries appear in first-seen order.
pub fn volume_report(trades: &[TradeRecord]) -> VolumeReport {
    let mut overall = SideAccumulator::default();
    let mut per_symbol: HashMap<String, SideAccumulator> = HashMap::new();
    let mut symbol_order: Vec<String> = Vec::new();
    let mut total_quote = 0.0;
    let mut total_base = 0.0;

    for trade in trades {
        total_quote += trade.quote_amount;
        total_base += trade.base_amount;
        overall.add(trade);
        if !per_symbol.contains_key(&trade.symbol) {
            symbol_order.push(trade.symbol.clone());
        }
        per_symbol.entry(trade.symbol.clone()).or_default().add(trade);
    }

    VolumeReport {
        total_quote,
        total_base,
        overall: overall.averages(),
        per_symbol: symbol_order
            .into_iter()
            .map(|symbol| {
                let averages = per_symbol[&symbol].averages();
                SymbolAverages { symbol, averages }
            })
            .collect(),
    }
}
