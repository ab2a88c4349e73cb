use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use shared::pipeline::{self, RunOptions, RunOutcome};
use shared::{Config, DigestError, Variant};
use tracing::error;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Summarize CoinGecko market data (Claude, then OpenAI)
    Market,
    /// Lead with a search-augmented news summary (Perplexity), then fall back to market
    News,
}

impl From<Mode> for Variant {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Market => Variant::Market,
            Mode::News => Variant::News,
        }
    }
}

#[derive(Parser)]
#[command(name = "daily-digest")]
#[command(about = "Build a morning crypto digest and post it to Telegram")]
struct Args {
    /// Print the digest to stdout instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Which summarizer line-up to use
    #[arg(long, value_enum, default_value = "market")]
    variant: Mode,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

async fn run(args: Args) -> Result<RunOutcome> {
    let config = Config::from_env();
    let options = RunOptions {
        dry_run: args.dry_run,
        variant: args.variant.into(),
    };

    let mut stdout = std::io::stdout().lock();
    let outcome = pipeline::run(&config, options, &mut stdout).await?;
    Ok(outcome.into_result()?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    shared::logging::init(args.verbose);

    match run(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<DigestError>() {
                Some(DigestError::MissingCredential(name)) => error!(
                    "{} is not set; set it in the environment or ~/.config/daily-digest/.env",
                    name
                ),
                _ => error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
