use crate::demo::{run_demo, run_roster_scores, DemoArgs, RosterArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use learntrack::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Learnership Compliance Engine",
    about = "Serve and demonstrate the learnership compliance scoring engine from the command line",
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
    /// Score the demo roster with bounded concurrency and print the rows
    Roster(RosterArgs),
    /// Run an end-to-end CLI demo covering scoring, badges, and snapshots
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the in-memory store with the demo roster on startup
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Roster(args) => run_roster_scores(args).await,
        Command::Demo(args) => run_demo(args),
    }
}
