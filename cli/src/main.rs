mod downsample;
mod encode;
mod io;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lttb",
    about = "Downsample time series with Largest-Triangle-Three-Buckets"
)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[clap(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reduce each input series to a target number of points
    Downsample(downsample::Opts),
    /// Transcode series between encodings
    Encode(encode::Opts),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Downsample(opts) => downsample::downsample(&opts).await,
        Command::Encode(opts) => encode::encode(&opts).await,
    }
}
