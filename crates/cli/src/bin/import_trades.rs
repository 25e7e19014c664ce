use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use models::TradeRecord;
use std::{fs, path::PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "import-trades",
    about = "Parse a raw trade export and fold it into the ledger file."
)]
struct Args {
    /// Path to the raw export text file
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the ledger JSON file; created if missing
    #[arg(short, long)]
    ledger: PathBuf,

    /// Report what would be added without writing the ledger
    #[arg(long)]
    dry_run: bool,

    /// Write compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

fn load_ledger(path: &PathBuf) -> Result<Vec<TradeRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let txt =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&txt).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let parsed = data_pipeline::parse_trades(&raw);

    for error in &parsed.errors {
        warn!("{error}");
    }
    println!(
        "Parsed {} trades ({} lines failed)",
        parsed.trades.len(),
        parsed.errors.len()
    );

    let current = load_ledger(&args.ledger)?;
    let new_rows = ledger::diff_trades(&current, &parsed.trades);
    let (merged, stats) = ledger::merge_trades(&current, &parsed.trades);
    println!(
        "Ledger: {} added, {} duplicates skipped, {} total",
        stats.added, stats.skipped, stats.total
    );

    if args.dry_run {
        for trade in &new_rows {
            println!(
                "+ {} {} {} @ {} x {}",
                trade.time.as_deref().unwrap_or("(no time)"),
                trade.symbol,
                trade.side,
                trade.price,
                trade.base_amount
            );
        }
        return Ok(());
    }

    let json = if args.compact {
        serde_json::to_string(&merged)?
    } else {
        serde_json::to_string_pretty(&merged)?
    };
    fs::write(&args.ledger, json)
        .with_context(|| format!("writing {}", args.ledger.display()))?;
    println!("Wrote ledger: {}", args.ledger.display());
    Ok(())
}
