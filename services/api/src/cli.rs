use crate::demo::{run_catalog, run_demo, CatalogArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use placement_portal::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Placement Portal",
    about = "Run the campus placement portal or explore it from the command line",
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
    /// Walk one student, one recruiter and the placement cell through a full hiring round
    Demo(DemoArgs),
    /// List the sample jobs a student with the given record could apply to
    Catalog(CatalogArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Load the sample companies and job postings before serving
    #[arg(long)]
    pub(crate) seed: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Catalog(args) => run_catalog(args),
    }
}
