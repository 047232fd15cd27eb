use crate::demo::{run_demo, run_overview, DemoArgs, OverviewArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use flexwork::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Flexible Work Portal",
    about = "Run the flexible work arrangement portal and its demo tooling from the command line",
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
    /// Render the office/home presence overview for one day from fixture data
    Overview(OverviewArgs),
    /// Run an end-to-end CLI walkthrough: submit, approve, classify, withdraw
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
    /// Seed the in-memory store and directory with walkthrough fixtures
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
        Command::Overview(args) => run_overview(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
