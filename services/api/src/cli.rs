use crate::commands::{
    run_estimate, run_opportunities, run_revalue, EstimateArgs, OpportunityArgs, RevalueArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rema::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "REMA valuation engine",
    about = "Estimate property prices and rank undervalued listings from the command line",
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
    /// Estimate the price of a single property
    Estimate(EstimateArgs),
    /// Batch operations over a listing CSV
    Inventory {
        #[command(subcommand)]
        command: InventoryCommand,
    },
}

#[derive(Subcommand, Debug)]
enum InventoryCommand {
    /// Recompute every valuation in a CSV and optionally write the result
    Revalue(RevalueArgs),
    /// Print the deepest-discount listings in a CSV
    Opportunities(OpportunityArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the listing CSV loaded at startup
    #[arg(long)]
    pub(crate) inventory: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Estimate(args) => run_estimate(args),
        Command::Inventory {
            command: InventoryCommand::Revalue(args),
        } => run_revalue(args),
        Command::Inventory {
            command: InventoryCommand::Opportunities(args),
        } => run_opportunities(args),
    }
}
