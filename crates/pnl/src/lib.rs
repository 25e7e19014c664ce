//! FIFO cost-basis PnL over executed spot trades.
//!
//! Trades are processed oldest first. Buys open lots, sells consume the
//! oldest lots of the same symbol, and whatever remains afterwards is valued
//! against the supplied market prices. Trades without a timestamp sort to
//! the very beginning.

mod book;

use book::FifoBook;
use models::{PnLPoint, PnLSummary, PositionSummary, PriceQuote, TradeRecord};
use std::collections::{BTreeMap, HashMap};
use utils::time_sort_key;

fn sorted_by_time(trades: &[TradeRecord]) -> Vec<&TradeRecord> {
    let mut sorted: Vec<&TradeRecord> = trades.iter().collect();
    sorted.sort_by_key(|trade| time_sort_key(trade.time.as_deref()));
    sorted
}

/// Runs every trade through the FIFO book and reports realized PnL, open
/// positions, unrealized PnL against `prices`, and per-asset fee totals.
///
/// Fee totals cover every trade carrying a positive fee, including buys
/// whose quantity was fully consumed by a base-asset fee. Symbols absent
/// from `prices` still appear in `positions`, with zero unrealized PnL.
pub fn calculate_pnl(
    trades: &[TradeRecord],
    prices: &HashMap<String, PriceQuote>,
) -> PnLSummary {
    let mut book = FifoBook::default();
    let mut fee_totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut realized_pnl = 0.0;

    for trade in sorted_by_time(trades) {
        if let (Some(asset), Some(amount)) = (&trade.fee_asset, trade.fee_amount) {
            if amount > 0.0 && !asset.is_empty() {
                *fee_totals.entry(asset.clone()).or_default() += amount;
            }
        }
        realized_pnl += book.apply(trade);
    }

    let mut positions = Vec::new();
    let mut unrealized_pnl = 0.0;
    for (symbol, qty, avg_cost) in book.open_positions() {
        let market_price = prices.get(&symbol).map(|quote| quote.price);
        let unrealized = match market_price {
            Some(price) => (price - avg_cost) * qty,
            None => 0.0,
        };
        unrealized_pnl += unrealized;
        positions.push(PositionSummary {
            symbol,
            qty,
            avg_cost,
            market_price,
            unrealized_pnl: unrealized,
        });
    }

    PnLSummary {
        realized_pnl,
        unrealized_pnl,
        fee_totals,
        positions,
    }
}

/// Running realized-PnL total after each trade, oldest first. Every trade
/// contributes exactly one point, timed or not.
pub fn build_pnl_timeline(trades: &[TradeRecord]) -> Vec<PnLPoint> {
    let mut book = FifoBook::default();
    let mut realized_pnl = 0.0;
    let mut timeline = Vec::with_capacity(trades.len());

    for trade in sorted_by_time(trades) {
        realized_pnl += book.apply(trade);
        timeline.push(PnLPoint {
            time: trade.time.clone(),
            realized_pnl,
        });
    }

    timeline
}
