use crate::demo::{print_tokens, run_demo, DemoArgs, TokenArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use nomination_portal::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "TOPS Nomination Portal",
    about = "Run the TOPS nomination portal or walk through it from the command line",
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
    /// Walk one nomination from the wizard through review against in-memory storage
    Demo(DemoArgs),
    /// Print freshly generated public status tokens
    Token(TokenArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::Token(args) => {
            print_tokens(args);
            Ok(())
        }
    }
}
