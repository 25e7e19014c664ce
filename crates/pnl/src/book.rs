use models::{TradeRecord, TradeSide};
use std::collections::{HashMap, VecDeque};

/// One acquisition parcel still held. The fee paid at acquisition is folded
/// into `cost_per_unit`, so consuming a lot accounts for it automatically.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lot {
    pub qty: f64,
    pub cost_per_unit: f64,
}

/// FIFO lot queues keyed by symbol. Symbols keep their first-seen order so
/// position reports come out deterministic.
#[derive(Debug, Default)]
pub(crate) struct FifoBook {
    lots: HashMap<String, VecDeque<Lot>>,
    symbol_order: Vec<String>,
}

impl FifoBook {
    /// Feeds one trade through the book and returns the realized PnL it
    /// produced (always 0 for buys).
    ///
    /// Fees denominated in the base asset shrink the quantity moved; fees
    /// denominated in the quote asset adjust cost (buys) or proceeds (sells).
    /// A buy whose entire quantity is eaten by a base-asset fee opens no lot.
    pub fn apply(&mut self, trade: &TradeRecord) -> f64 {
        let fee_amount = trade.fee_amount.unwrap_or(0.0);
        let fee_in_base = match &trade.fee_asset {
            Some(asset) if *asset == trade.base_asset => fee_amount,
            _ => 0.0,
        };
        let fee_in_quote = match &trade.fee_asset {
            Some(asset) if *asset == trade.quote_asset => fee_amount,
            _ => 0.0,
        };

        match trade.side {
            TradeSide::Buy => {
                let base_acquired = (trade.base_amount - fee_in_base).max(0.0);
                if base_acquired > 0.0 {
                    let total_cost = trade.price * base_acquired + fee_in_quote;
                    self.lots_mut(&trade.symbol).push_back(Lot {
                        qty: base_acquired,
                        cost_per_unit: total_cost / base_acquired,
                    });
                }
                0.0
            }
            TradeSide::Sell => {
                let base_sold = (trade.base_amount - fee_in_base).max(0.0);
                let lots = self.lots_mut(&trade.symbol);
                let mut remaining = base_sold;
                let mut cost_basis = 0.0;
                while remaining > 0.0 {
                    let Some(front) = lots.front_mut() else {
                        break;
                    };
                    let qty = remaining.min(front.qty);
                    cost_basis += qty * front.cost_per_unit;
                    front.qty -= qty;
                    remaining -= qty;
                    if front.qty <= 0.0 {
                        lots.pop_front();
                    }
                }
                let proceeds = trade.price * base_sold;
                proceeds - fee_in_quote - cost_basis
            }
        }
    }

    /// Remaining (symbol, qty, avg_cost) per symbol with open lots,
    /// in first-seen order.
    pub fn open_positions(&self) -> Vec<(String, f64, f64)> {
        let mut positions = Vec::new();
        for symbol in &self.symbol_order {
            let Some(lots) = self.lots.get(symbol) else {
                continue;
            };
            let qty: f64 = lots.iter().map(|lot| lot.qty).sum();
            if qty == 0.0 {
                continue;
            }
            let total_cost: f64 = lots.iter().map(|lot| lot.qty * lot.cost_per_unit).sum();
            positions.push((symbol.clone(), qty, total_cost / qty));
        }
        positions
    }

    fn lots_mut(&mut self, symbol: &str) -> &mut VecDeque<Lot> {
        if !self.lots.contains_key(symbol) {
            self.symbol_order.push(symbol.to_string());
        }
        self.lots.entry(symbol.to_string()).or_default()
    }
}
