use models::TradeRecord;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use utils::{normalize_time, time_sort_key};

/// Stable identity key for a trade. When the export carries order id, trade
/// id and a time, those three identify the fill exactly; otherwise the key
/// falls back to the trade's observable shape at 8 decimal places. Time is
/// normalized first so the same fill reported by different sources collapses
/// to one key.
pub fn trade_key(trade: &TradeRecord) -> String {
    let time_key = normalize_time(trade.time.as_deref());
    if let (Some(order_id), Some(trade_id)) = (trade.order_id.as_deref(), trade.trade_id.as_deref())
    {
        if !order_id.is_empty() && !trade_id.is_empty() && !time_key.is_empty() {
            return format!("{order_id}|{trade_id}|{time_key}");
        }
    }
    format!(
        "{}|{}|{}|{:.8}|{:.8}|{:.8}",
        trade.symbol.trim(),
        trade.side.as_str(),
        time_key,
        trade.price,
        trade.base_amount,
        trade.quote_amount
    )
}

/// Statistics about one merge operation.
#[derive(Debug, Clone, Serialize)]
pub struct MergeStats {
    pub added: usize,
    pub skipped: usize,
    pub total: usize,
}

impl MergeStats {
    pub fn has_duplicates(&self) -> bool {
        self.skipped > 0
    }
}

/// Folds an incoming batch into the current ledger. Existing records always
/// win: an incoming record is inserted only if its key is absent. The merged
/// ledger is returned sorted by time descending; records with no time sort
/// as oldest. Re-merging the same batch is a no-op.
pub fn merge_trades(
    current: &[TradeRecord],
    incoming: &[TradeRecord],
) -> (Vec<TradeRecord>, MergeStats) {
    let mut by_key: HashMap<String, TradeRecord> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for trade in current {
        let key = trade_key(trade);
        if !by_key.contains_key(&key) {
            order.push(key.clone());
        }
        by_key.insert(key, trade.clone());
    }

    let mut stats = MergeStats {
        added: 0,
        skipped: 0,
        total: incoming.len(),
    };

    for trade in incoming {
        let key = trade_key(trade);
        if by_key.contains_key(&key) {
            stats.skipped += 1;
        } else {
            order.push(key.clone());
            by_key.insert(key, trade.clone());
            stats.added += 1;
        }
    }

    let mut merged: Vec<TradeRecord> = order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect();
    // Stable sort keeps first-seen order for equal timestamps.
    merged.sort_by_key(|t| Reverse(time_sort_key(t.time.as_deref())));

    (merged, stats)
}

/// Returns the subset of `incoming` whose key is not already present in
/// `current`, in original order. Used to compute the minimal new-rows set
/// before a persistence write, without performing the merge itself.
pub fn diff_trades(current: &[TradeRecord], incoming: &[TradeRecord]) -> Vec<TradeRecord> {
    let existing: HashSet<String> = current.iter().map(trade_key).collect();
    incoming
        .iter()
        .filter(|trade| !existing.contains(&trade_key(trade)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::TradeSide;

    fn trade(
        symbol: &str,
        side: TradeSide,
        price: f64,
        qty: f64,
        time: Option<&str>,
        ids: Option<(&str, &str)>,
    ) -> TradeRecord {
        TradeRecord {
            symbol: symbol.to_string(),
            market_type: "Spot".to_string(),
            order_type: "Limit".to_string(),
            side,
            price,
            price_asset: "USDT".to_string(),
            base_amount: qty,
            base_asset: symbol.split('/').next().unwrap().to_string(),
            quote_amount: price * qty,
            quote_asset: "USDT".to_string(),
            fee_amount: None,
            fee_asset: None,
            time: time.map(|t| t.to_string()),
            order_id: ids.map(|(o, _)| o.to_string()),
            trade_id: ids.map(|(_, t)| t.to_string()),
            session_id: None,
            raw_lines: Vec::new(),
        }
    }

    #[test]
    fn key_uses_ids_when_all_present() {
        let t = trade(
            "SOL/USDT",
            TradeSide::Buy,
            100.0,
            1.0,
            Some("2024-03-01 10:15:00"),
            Some(("ORD1", "TRD1")),
        );
        assert_eq!(trade_key(&t), "ORD1|TRD1|2024-03-01 10:15:00");
    }

    #[test]
    fn key_falls_back_to_shape_without_ids() {
        let t = trade(
            "SOL/USDT",
            TradeSide::Buy,
            100.0,
            1.0,
            Some("2024-03-01 10:15:00"),
            None,
        );
        assert_eq!(
            trade_key(&t),
            "SOL/USDT|Buy|2024-03-01 10:15:00|100.00000000|1.00000000|100.00000000"
        );
    }

    #[test]
    fn key_normalizes_time_across_sources() {
        let a = trade(
            "SOL/USDT",
            TradeSide::Buy,
            100.0,
            1.0,
            Some("2024-03-01T10:15:00.500Z"),
            Some(("ORD1", "TRD1")),
        );
        let b = trade(
            "SOL/USDT",
            TradeSide::Buy,
            100.0,
            1.0,
            Some("2024-03-01 10:15:00"),
            Some(("ORD1", "TRD1")),
        );
        assert_eq!(trade_key(&a), trade_key(&b));
    }

    #[test]
    fn merge_is_idempotent_on_re_merge() {
        let a = vec![trade(
            "SOL/USDT",
            TradeSide::Buy,
            100.0,
            1.0,
            Some("2024-03-01 10:00:00"),
            None,
        )];
        let b = vec![
            trade(
                "SOL/USDT",
                TradeSide::Sell,
                110.0,
                1.0,
                Some("2024-03-02 10:00:00"),
                None,
            ),
            trade(
                "ETH/USDT",
                TradeSide::Buy,
                2500.0,
                0.2,
                Some("2024-03-03 10:00:00"),
                None,
            ),
        ];

        let (merged, stats) = merge_trades(&a, &b);
        assert_eq!(stats.added, 2);
        assert_eq!(merged.len(), 3);

        let (re_merged, re_stats) = merge_trades(&merged, &b);
        assert_eq!(re_stats.added, 0);
        assert_eq!(re_stats.skipped, 2);
        assert!(re_stats.has_duplicates());
        assert_eq!(re_merged.len(), merged.len());
        for (x, y) in merged.iter().zip(re_merged.iter()) {
            assert_eq!(trade_key(x), trade_key(y));
        }
    }

    #[test]
    fn merge_sorts_descending_and_missing_time_sorts_oldest() {
        let current = vec![trade(
            "SOL/USDT",
            TradeSide::Buy,
            100.0,
            1.0,
            None,
            None,
        )];
        let incoming = vec![
            trade(
                "SOL/USDT",
                TradeSide::Buy,
                101.0,
                1.0,
                Some("2024-03-01 10:00:00"),
                None,
            ),
            trade(
                "SOL/USDT",
                TradeSide::Buy,
                102.0,
                1.0,
                Some("2024-03-05 10:00:00"),
                None,
            ),
        ];

        let (merged, _) = merge_trades(&current, &incoming);
        assert_eq!(merged[0].price, 102.0);
        assert_eq!(merged[1].price, 101.0);
        assert!(merged[2].time.is_none());
    }

    #[test]
    fn incoming_never_overwrites_current() {
        let current = vec![trade(
            "SOL/USDT",
            TradeSide::Buy,
            100.0,
            1.0,
            Some("2024-03-01 10:00:00"),
            Some(("ORD1", "TRD1")),
        )];
        let mut duplicate = current[0].clone();
        duplicate.order_type = "Market".to_string();

        let (merged, stats) = merge_trades(&current, &[duplicate]);
        assert_eq!(stats.skipped, 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].order_type, "Limit");
    }

    #[test]
    fn diff_returns_only_unseen_incoming_in_order() {
        let a = vec![trade(
            "SOL/USDT",
            TradeSide::Buy,
            100.0,
            1.0,
            Some("2024-03-01 10:00:00"),
            None,
        )];
        let b = vec![
            a[0].clone(),
            trade(
                "ETH/USDT",
                TradeSide::Buy,
                2500.0,
                0.2,
                Some("2024-03-03 10:00:00"),
                None,
            ),
            trade(
                "SOL/USDT",
                TradeSide::Sell,
                110.0,
                0.5,
                Some("2024-03-04 10:00:00"),
                None,
            ),
        ];

        let new_rows = diff_trades(&a, &b);
        assert_eq!(new_rows.len(), 2);
        assert_eq!(new_rows[0].symbol, "ETH/USDT");
        assert_eq!(new_rows[1].side, TradeSide::Sell);

        // diff against the merged ledger finds nothing new.
        let (merged, _) = merge_trades(&a, &b);
        assert!(diff_trades(&merged, &b).is_empty());
    }
}
