use crate::demo::{describe_address, describe_verdict};
use crate::infra::live_service;
use clap::Args;
use housing_eligibility::config::AppConfig;
use housing_eligibility::eligibility::check_batch;
use housing_eligibility::error::AppError;
use housing_eligibility::telemetry;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AddressSearchArgs {
    /// Postcode to search, e.g. "E8 1DY"
    pub(crate) postcode: String,
    /// Print the raw JSON payload instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PropertyCheckArgs {
    /// Property reference to verify
    pub(crate) property_id: String,
    /// Print the raw JSON payload instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV file with a `property_id` column
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Where to write results (defaults to stdout)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) async fn run_address_search(args: AddressSearchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_stderr(&config.telemetry)?;
    let service = live_service(&config)?;

    let addresses = service.search_addresses(&args.postcode).await?;
    if args.json {
        print_json(&addresses);
        return Ok(());
    }

    println!(
        "{} eligible address(es) for {}",
        addresses.len(),
        args.postcode.trim()
    );
    for address in &addresses {
        println!("  - {}", describe_address(address));
    }
    Ok(())
}

pub(crate) async fn run_property_check(args: PropertyCheckArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_stderr(&config.telemetry)?;
    let service = live_service(&config)?;

    let verdict = service.verify_property(&args.property_id).await?;
    if args.json {
        print_json(&verdict);
    } else {
        println!("{}", describe_verdict(args.property_id.trim(), &verdict));
    }
    Ok(())
}

pub(crate) async fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_stderr(&config.telemetry)?;
    let service = live_service(&config)?;

    let input = BufReader::new(File::open(&args.input)?);
    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };

    let summary = check_batch(&service, input, output).await?;
    eprintln!(
        "Checked {} properties: {} eligible, {} failed lookups",
        summary.checked, summary.eligible, summary.failed
    );
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to render JSON output: {err}"),
    }
}
