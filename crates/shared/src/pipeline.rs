//! One run of the digest: fetch, assemble, summarize, format, then print or send.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::briefing::BriefingAssembler;
use crate::coingecko::CoinGeckoClient;
use crate::config::Config;
use crate::error::DigestError;
use crate::format::format_digest;
use crate::summarizer::{SummaryChain, Variant};
use crate::telegram::{SendReport, TelegramNotifier};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Print to stdout instead of sending to Telegram.
    pub dry_run: bool,
    pub variant: Variant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Printed { chars: usize },
    Sent(SendReport),
}

pub async fn run(
    config: &Config,
    options: RunOptions,
    out: &mut impl Write,
) -> Result<RunOutcome> {
    run_at(config, options, Utc::now(), out).await
}

pub async fn run_at(
    config: &Config,
    options: RunOptions,
    now: DateTime<Utc>,
    out: &mut impl Write,
) -> Result<RunOutcome> {
    info!(
        dry_run = options.dry_run,
        variant = ?options.variant,
        ai_keys = config.has_ai_keys(),
        "Starting daily digest"
    );

    // Resolve everything that can fail fatally before touching the network
    let notifier = if options.dry_run {
        None
    } else {
        let credentials = config.telegram().map_err(|e| {
            error!("Telegram credentials not set, aborting");
            e
        })?;
        Some(TelegramNotifier::new(config.endpoints.telegram.clone(), credentials)?)
    };

    let coingecko = CoinGeckoClient::new(config.endpoints.coingecko.clone())?;
    let chain = SummaryChain::from_config(config, options.variant)?;

    info!("Fetching market data");
    let snapshot = coingecko.fetch_snapshot().await;
    let raw = BriefingAssembler::assemble(&snapshot, config.digest_topics.as_deref(), now).render();
    info!(chars = raw.chars().count(), "Raw briefing assembled");

    let summary = chain.summarize(&raw, now).await;
    let message = format_digest(&summary, now);
    let chars = message.chars().count();

    let Some(notifier) = notifier else {
        print_digest(out, &message).context("Failed to write digest to stdout")?;
        info!("Dry run complete");
        return Ok(RunOutcome::Printed { chars });
    };

    let report = notifier.send(&message).await;
    if report.is_success() {
        info!(chars, chunks = report.total(), "Digest sent successfully");
    } else {
        error!(
            failed = report.failed,
            total = report.total(),
            "Failed to send digest to Telegram"
        );
        notifier.send_error_notice("Failed to send digest message.").await;
    }

    Ok(RunOutcome::Sent(report))
}

impl RunOutcome {
    /// Turn a partially or fully failed delivery into an error.
    pub fn into_result(self) -> Result<Self, DigestError> {
        match self {
            RunOutcome::Sent(report) if !report.is_success() => Err(DigestError::DeliveryFailed {
                failed: report.failed,
                total: report.total(),
            }),
            outcome => Ok(outcome),
        }
    }
}

fn print_digest(out: &mut impl Write, message: &str) -> std::io::Result<()> {
    let rule = "=".repeat(60);
    writeln!(out, "{}", rule)?;
    writeln!(out, "{}", message)?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "\nLength: {} chars", message.chars().count())?;
    out.flush()
}
