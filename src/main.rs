use clap::Parser;
use readmark::cli::commands::Cli;
use readmark::cli::handlers;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `READMARK_LOG=debug`
const LOG_ENV: &str = "READMARK_LOG";

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
