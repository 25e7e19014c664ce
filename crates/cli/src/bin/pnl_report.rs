use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use models::{PriceQuote, TradeRecord, TradeSide};
use serde_json::json;
use std::collections::HashMap;
use std::{fs, path::PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "pnl-report",
    about = "Compute FIFO realized/unrealized PnL over a ledger file."
)]
struct Args {
    /// Path to the ledger JSON file
    #[arg(short, long)]
    ledger: PathBuf,

    /// Optional JSON file mapping symbol to a price quote, e.g.
    /// {"SOL/USDT": {"symbol": "SOL/USDT", "price": 150.0, "updatedAt": 0}}
    #[arg(short, long)]
    prices: Option<PathBuf>,

    /// Restrict the report to one symbol
    #[arg(long)]
    symbol: Option<String>,

    /// Restrict the report to one side (buy/sell)
    #[arg(long)]
    side: Option<String>,

    /// Only trades on or after this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Only trades on or before this date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Include the running realized-PnL timeline in the output
    #[arg(long)]
    timeline: bool,

    /// Include volume totals and average-price rollups in the output
    #[arg(long)]
    volume: bool,
}

fn load_prices(path: &PathBuf) -> Result<HashMap<String, PriceQuote>> {
    let txt =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&txt).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let txt = fs::read_to_string(&args.ledger)
        .with_context(|| format!("reading {}", args.ledger.display()))?;
    let trades: Vec<TradeRecord> = serde_json::from_str(&txt)
        .with_context(|| format!("parsing {}", args.ledger.display()))?;

    let side = match args.side.as_deref() {
        Some(raw) => Some(
            TradeSide::parse_loose(raw)
                .with_context(|| format!("unrecognized side: {raw}"))?,
        ),
        None => None,
    };
    let filter = ledger::TradeFilter {
        symbol: args.symbol.clone(),
        side,
        date_from: args.from,
        date_to: args.to,
        ..Default::default()
    };
    let trades = ledger::filter_trades(&trades, &filter);

    let prices = match &args.prices {
        Some(path) => load_prices(path)?,
        None => HashMap::new(),
    };

    let summary = pnl::calculate_pnl(&trades, &prices);
    let mut out = json!({ "summary": summary });
    if args.timeline {
        out["timeline"] = serde_json::to_value(pnl::build_pnl_timeline(&trades))?;
    }
    if args.volume {
        out["volume"] = serde_json::to_value(ledger::volume_report(&trades))?;
    }

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
