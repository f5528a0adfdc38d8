//! Command line front end.
//!
//! Usage:
//!   empower-holdings                       # pick a capture interactively
//!   empower-holdings portfolio.webarchive  # table + portfolio.csv
//!   empower-holdings page.mhtml --full-text --no-csv
//!   empower-holdings networth.webarchive --net-worth --text

use anyhow::{bail, Context, Result};
use clap::Parser;
use empower_holdings::export::{self, format_currency};
use empower_holdings::stats::{self, PortfolioStats};
use empower_holdings::{archive, config, extract_holdings, files, networth, Extraction};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract portfolio holdings from saved Empower pages")]
struct Cli {
    /// Saved page (.webarchive, .mhtml, .mht); prompts for one when omitted
    input: Option<PathBuf>,

    /// Output file base name (extension is replaced)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not write the CSV export
    #[arg(long)]
    no_csv: bool,

    /// Write the full decoded page text to <base>.txt
    #[arg(long)]
    full_text: bool,

    /// Write formatted text to <base>.holdings.txt (<base>.networth.txt with --net-worth)
    #[arg(long)]
    text: bool,

    /// Print the extraction as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print portfolio statistics
    #[arg(long)]
    stats: bool,

    /// Extract the net worth account list instead of holdings
    #[arg(long)]
    net_worth: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

fn select_input(config: &config::AppConfig) -> Result<Option<PathBuf>> {
    let dirs = vec![PathBuf::from("."), config.data_dir.clone()];
    let candidates = files::list_archive_files(&dirs);
    if candidates.is_empty() {
        bail!(
            "No .webarchive, .mhtml or .mht files found in {}",
            files::describe_dirs(&dirs)
        );
    }

    let stdin = io::stdin();
    files::choose_file(&candidates, stdin.lock(), io::stdout())
        .context("Failed to read file selection")
}

fn print_stats(stats: &PortfolioStats) {
    println!("\nPortfolio Statistics:");
    println!("  Holdings:       {}", stats.count);
    println!("  Total value:    {}", format_currency(stats.total_value));
    println!("  Average value:  {}", format_currency(stats.average_value));
    println!("  Median value:   {}", format_currency(stats.median_value));
    println!(
        "  Range:          {} - {}",
        format_currency(stats.min_value),
        format_currency(stats.max_value)
    );
    println!("  Top 5 share:    {:.1}%", stats.top5_share);
    println!("  Top 10 share:   {:.1}%", stats.top10_share);
    println!(
        "  HHI:            {:.0} ({})",
        stats.hhi,
        stats.concentration.label()
    );
    println!("\nAsset Allocation:");
    for entry in &stats.allocation {
        println!(
            "  {:<20} {:>16} {:>6.1}%",
            entry.asset_class,
            format_currency(entry.value),
            entry.share
        );
    }
}

fn write_outputs(cli: &Cli, extraction: &Extraction, base: &Path) -> Result<()> {
    if !cli.no_csv {
        let csv_path = files::output_path(base, "csv");
        export::save_csv(&extraction.holdings, &csv_path)
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
        println!("Portfolio holdings saved as CSV to '{}'", csv_path.display());
    }

    if cli.text {
        let text_path = files::output_path(base, "holdings.txt");
        std::fs::write(&text_path, export::format_holdings_text(&extraction.holdings))
            .with_context(|| format!("Failed to write {}", text_path.display()))?;
        println!("Portfolio holdings text saved to '{}'", text_path.display());
    }

    if cli.full_text {
        let text_path = files::output_path(base, "txt");
        std::fs::write(&text_path, extraction.text.to_text())
            .with_context(|| format!("Failed to write {}", text_path.display()))?;
        println!("Extracted page text saved to '{}'", text_path.display());
    }

    Ok(())
}

fn run_net_worth(cli: &Cli, bytes: &[u8], base: &Path) -> Result<()> {
    let archive = archive::read_archive(bytes).context("Failed to decode archive")?;
    let net_worth = networth::extract_net_worth(&archive.text)
        .context("Could not extract net worth data")?;

    if !cli.no_csv {
        let csv_path = files::output_path(base, "networth.csv");
        networth::save_networth_csv(&net_worth, &csv_path)
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
        println!("Net worth data saved as CSV to '{}'", csv_path.display());
    }

    let summary = networth::format_networth_text(&net_worth);
    if cli.text {
        let text_path = files::output_path(base, "networth.txt");
        std::fs::write(&text_path, &summary)
            .with_context(|| format!("Failed to write {}", text_path.display()))?;
        println!("Net worth text saved to '{}'", text_path.display());
    }

    if cli.full_text {
        let text_path = files::output_path(base, "txt");
        std::fs::write(&text_path, archive.text.to_text())
            .with_context(|| format!("Failed to write {}", text_path.display()))?;
        println!("Extracted page text saved to '{}'", text_path.display());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&net_worth)?);
    } else {
        println!("\n{}", summary);
    }

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = config::init();
    log::debug!("Configuration: {:?}", config);
    log::debug!(
        "LLM provider {:?} ({}, model {})",
        config.llm_provider,
        config.active_provider().base_url,
        config.active_provider().model_id
    );

    let input = match &cli.input {
        Some(path) => path.clone(),
        None => match select_input(config)? {
            Some(path) => path,
            None => return Ok(()),
        },
    };

    let bytes = std::fs::read(&input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;

    let base = cli.output.clone().unwrap_or_else(|| input.clone());

    if cli.net_worth {
        log::info!("Extracting net worth from '{}'", input.display());
        return run_net_worth(&cli, &bytes, &base)
            .with_context(|| format!("Failed to process '{}'", input.display()));
    }

    log::info!("Extracting holdings from '{}'", input.display());
    let extraction = extract_holdings(&bytes)
        .with_context(|| format!("Failed to decode '{}'", input.display()))?;

    write_outputs(&cli, &extraction, &base)?;

    let portfolio_stats = stats::calculate_stats(&extraction.holdings);

    if cli.json {
        let mut value = serde_json::to_value(&extraction)?;
        if cli.stats {
            value["stats"] = serde_json::to_value(&portfolio_stats)?;
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\nPortfolio Holdings Table:");
    print!("{}", export::render_table(&extraction.holdings));
    if extraction.holdings.is_empty() {
        println!();
    }

    if let Some(check) = &extraction.integrity {
        println!(
            "\nIntegrity Check: reported {} | calculated {} | {}",
            format_currency(check.reported_total),
            format_currency(check.calculated_total),
            if check.matches { "Match" } else { "Mismatch" }
        );
    }

    if cli.stats {
        match &portfolio_stats {
            Some(s) => print_stats(s),
            None => println!("\nNo holding values available for statistics."),
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
