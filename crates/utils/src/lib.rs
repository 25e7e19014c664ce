//! Shared record-normalization helpers used by every trade-export parser:
//! row splitting, header normalization, numeric parsing with thousands
//! separators, symbol splitting and timestamp handling.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

/// Quote assets recognized when splitting a bare concatenated symbol
/// like "SOLUSDT". Order matters only for readability; matching is by suffix.
pub const QUOTE_ASSETS: [&str; 8] = ["USDT", "USDC", "BUSD", "BTC", "ETH", "BNB", "MNT", "EUR"];

/// Canonical timestamp form used as the comparison key across all formats.
pub const CANONICAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static MDY_SHORT_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}\s+\d{1,2}:\d{2}$").unwrap());

static CANONICAL_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}$").unwrap());

static TIME_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\.\d+)?(Z|[+-]\d\d:\d\d)?$").unwrap());

/// Splits a row into cells: on tab if any tab is present, else on comma if
/// any comma is present, else on runs of two or more spaces.
pub fn split_row(line: &str) -> Vec<String> {
    static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

    if line.contains('\t') {
        line.split('\t').map(|cell| cell.trim().to_string()).collect()
    } else if line.contains(',') {
        line.split(',').map(|cell| cell.trim().to_string()).collect()
    } else {
        MULTI_SPACE
            .split(line)
            .map(|cell| cell.trim().to_string())
            .collect()
    }
}

/// Lowercases and collapses internal whitespace so header names compare
/// regardless of spacing or case.
pub fn normalize_header(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a decimal that may carry thousands-separator commas ("1,234.56").
pub fn parse_amount(value: &str) -> Option<f64> {
    let cleaned = value.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolParts {
    pub symbol: String,
    pub base: String,
    pub quote: String,
}

/// Splits a symbol into base and quote. "SOL/USDT" splits on the slash;
/// a bare "SOLUSDT" is matched against the known quote-asset suffixes.
/// Unknown suffixes collapse to symbol == base == quote.
pub fn symbol_to_pair(value: &str) -> SymbolParts {
    if let Some((base, quote)) = value.split_once('/') {
        return SymbolParts {
            symbol: value.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
        };
    }
    let upper = value.to_uppercase();
    match QUOTE_ASSETS.iter().find(|asset| upper.ends_with(*asset)) {
        Some(quote) => {
            let base = upper[..upper.len() - quote.len()].to_string();
            SymbolParts {
                symbol: format!("{}/{}", base, quote),
                base,
                quote: quote.to_string(),
            }
        }
        None => SymbolParts {
            symbol: upper.clone(),
            base: upper.clone(),
            quote: upper,
        },
    }
}

/// Parses a US-style "M/D/YYYY H:MM[:SS]" timestamp and re-emits it in the
/// canonical form. Returns None on anything malformed; callers keep the
/// record and leave its time unset.
pub fn parse_timestamp_mdy(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = NaiveDateTime::parse_from_str(trimmed, "%m/%d/%Y %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%m/%d/%Y %H:%M"))
        .ok()?;
    Some(parsed.format(CANONICAL_TIME_FORMAT).to_string())
}

/// True for the headerless-table short timestamp shape "M/D/YYYY H:MM".
pub fn is_mdy_short_timestamp(value: &str) -> bool {
    MDY_SHORT_TIMESTAMP.is_match(value)
}

/// True for a bare canonical "YYYY-MM-DD HH:MM:SS" line.
pub fn is_canonical_timestamp(value: &str) -> bool {
    CANONICAL_TIMESTAMP.is_match(value)
}

/// Normalizes a timestamp for identity comparison: the first "T" separator
/// becomes a space and any sub-second fraction or timezone suffix is
/// stripped, so the same fill reported by different sources compares equal.
pub fn normalize_time(value: Option<&str>) -> String {
    match value {
        Some(v) => {
            let spaced = v.replacen('T', " ", 1);
            TIME_SUFFIX.replace(&spaced, "").to_string()
        }
        None => String::new(),
    }
}

/// Sort key for an optional canonical timestamp, in whole seconds since the
/// epoch. A missing or unparsable time sorts as epoch 0 (oldest); that can
/// reorder FIFO consumption relative to true execution order and is a known
/// limitation of the source exports, kept as-is.
pub fn time_sort_key(value: Option<&str>) -> i64 {
    let normalized = normalize_time(value);
    if normalized.is_empty() {
        return 0;
    }
    NaiveDateTime::parse_from_str(&normalized, CANONICAL_TIME_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .or_else(|_| {
            NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
                .map(|d| d.and_time(NaiveTime::MIN).and_utc().timestamp())
        })
        .unwrap_or(0)
}
