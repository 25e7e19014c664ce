//! Running trade ledger: stable identity keys, duplicate-free merging of
//! repeated imports, and thin derived views (filtering, volume and
//! average-price rollups) over the canonical records.

pub mod merge;
pub mod views;

pub use crate::merge::{diff_trades, merge_trades, trade_key, MergeStats};
pub use crate::views::{filter_trades, volume_report, SideAverages, SymbolAverages, TradeFilter, VolumeReport};
