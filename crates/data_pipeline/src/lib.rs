//! Format detection over raw trade-export text.
//!
//! The five export layouts share no schema, so the pipeline sniffs the
//! cleaned lines with cheap shape predicates and tries matching parsers in a
//! fixed priority order. The first strategy that produces at least one
//! record wins; the single-line parser is the unconditional last resort, so
//! a parse always returns a result, possibly all errors.

use log::debug;
use models::ParseResult;
use utils::{is_mdy_short_timestamp, normalize_header, split_row};

/// Trims every line and drops the blank ones. All parsers assume this shape.
pub fn clean_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn header_line_index(lines: &[String]) -> Option<usize> {
    lines.iter().position(|line| {
        let columns: Vec<String> = split_row(line)
            .iter()
            .map(|cell| normalize_header(cell))
            .collect();
        columns.iter().any(|c| c == "spot pairs") && columns.iter().any(|c| c == "order type")
    })
}

fn try_headered(lines: &[String]) -> Option<ParseResult> {
    let start = header_line_index(lines)?;
    Some(headered_table::parse(&lines[start..]))
}

fn looks_headerless(line: &str) -> bool {
    if line.contains("{\"") {
        return true;
    }
    let columns = split_row(line);
    columns.len() >= 12
        && columns
            .last()
            .is_some_and(|cell| is_mdy_short_timestamp(cell))
}

fn try_headerless(lines: &[String]) -> Option<ParseResult> {
    if !lines.iter().any(|line| looks_headerless(line)) {
        return None;
    }
    let result = headerless_table::parse(lines);
    (!result.is_empty()).then_some(result)
}

fn try_block(lines: &[String]) -> Option<ParseResult> {
    if !lines
        .iter()
        .any(|line| line.contains("--") || line.contains("Filled"))
    {
        return None;
    }
    let result = block_export::parse(lines);
    (!result.is_empty()).then_some(result)
}

fn try_vertical(lines: &[String]) -> Option<ParseResult> {
    if !lines.iter().any(|line| line.contains('/')) {
        return None;
    }
    let result = vertical_export::parse(lines);
    (!result.is_empty()).then_some(result)
}

fn try_single_line(lines: &[String]) -> Option<ParseResult> {
    Some(single_line::parse(lines))
}

type Strategy = fn(&[String]) -> Option<ParseResult>;

// Priority order matters: the headered format always wins once its header
// is present, and single_line must stay last because it never declines.
const STRATEGIES: [(&str, Strategy); 5] = [
    (headered_table::PARSER_NAME, try_headered),
    (headerless_table::PARSER_NAME, try_headerless),
    (block_export::PARSER_NAME, try_block),
    (vertical_export::PARSER_NAME, try_vertical),
    (single_line::PARSER_NAME, try_single_line),
];

/// Parses raw export text end to end: clean the lines, pick a strategy,
/// return whatever it extracted together with per-line diagnostics.
pub fn parse_trades(input: &str) -> ParseResult {
    let lines = clean_lines(input);
    parse_trade_lines(&lines)
}

/// Same as [`parse_trades`] for callers that already hold cleaned lines.
pub fn parse_trade_lines(lines: &[String]) -> ParseResult {
    if lines.is_empty() {
        return ParseResult::default();
    }

    for (name, strategy) in STRATEGIES {
        if let Some(result) = strategy(lines) {
            debug!(
                "strategy {} matched: {} trades, {} errors",
                name,
                result.trades.len(),
                result.errors.len()
            );
            return result;
        }
    }

    // unreachable: single_line always returns Some
    ParseResult::default()
}
