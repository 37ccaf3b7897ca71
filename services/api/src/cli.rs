use crate::demo::{run_demo, DemoArgs};
use crate::lookup::{
    run_address_search, run_batch, run_property_check, AddressSearchArgs, BatchArgs,
    PropertyCheckArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use housing_eligibility::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Online Repairs Eligibility",
    about = "Serve and query online repairs eligibility for housing properties",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Query the address search pipeline
    Addresses {
        #[command(subcommand)]
        command: AddressCommand,
    },
    /// Query the single-property eligibility pipeline
    Property {
        #[command(subcommand)]
        command: PropertyCommand,
    },
    /// Check every property listed in a CSV file
    Batch(BatchArgs),
    /// Run both pipelines against built-in fixtures
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum AddressCommand {
    /// List eligible addresses for a postcode
    Search(AddressSearchArgs),
}

#[derive(Subcommand, Debug)]
enum PropertyCommand {
    /// Verify whether one property can use online repairs
    Check(PropertyCheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Addresses {
            command: AddressCommand::Search(args),
        } => run_address_search(args).await,
        Command::Property {
            command: PropertyCommand::Check(args),
        } => run_property_check(args).await,
        Command::Batch(args) => run_batch(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
