use chrono::{DateTime, Utc};

use crate::providers::truncate_chars;
use crate::summarizer::Summary;

/// Telegram's hard limit for a single message.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Headroom kept below [`MAX_MESSAGE_LEN`] when truncating the body.
const SAFETY_MARGIN: usize = 50;

const ELLIPSIS: &str = "...";

pub fn header(now: DateTime<Utc>) -> String {
    format!("📰 Morning Crypto Digest — {}\n", now.format("%Y-%m-%d"))
}

pub fn footer(summary: &Summary) -> String {
    match summary.provider() {
        Some(provider) => format!("\n—\nPowered by CoinGecko | AI Summary ({})", provider),
        None => "\n—\nPowered by CoinGecko | Raw Data".to_string(),
    }
}

/// Wrap a summary as `header + "\n" + body + footer`.
///
/// The body is cut (with a trailing `...`) so the result never exceeds
/// [`MAX_MESSAGE_LEN`] characters.
pub fn format_digest(summary: &Summary, now: DateTime<Utc>) -> String {
    let header = header(now);
    let footer = footer(summary);

    let max_body = MAX_MESSAGE_LEN
        .saturating_sub(header.chars().count())
        .saturating_sub(footer.chars().count())
        .saturating_sub(SAFETY_MARGIN);

    let text = summary.text();
    let body = truncate_chars(text, max_body);
    let ellipsis = if body.len() < text.len() { ELLIPSIS } else { "" };

    format!("{}\n{}{}{}", header, body, ellipsis, footer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 7, 0, 0).unwrap()
    }

    fn generated(text: impl Into<String>) -> Summary {
        Summary::Generated {
            provider: "Claude",
            text: text.into(),
        }
    }

    #[test]
    fn test_short_summary_is_kept_whole() {
        let digest = format_digest(&generated("📊 MARKET MOOD: Neutral"), now());

        assert_eq!(
            digest,
            "📰 Morning Crypto Digest — 2026-02-01\n\n📊 MARKET MOOD: Neutral\n—\n\
             Powered by CoinGecko | AI Summary (Claude)"
        );
    }

    #[test]
    fn test_fallback_footer() {
        let digest = format_digest(&Summary::Fallback("raw".to_string()), now());
        assert!(digest.ends_with("Powered by CoinGecko | Raw Data"));
    }

    #[test]
    fn test_long_summary_is_truncated_with_ellipsis() {
        let digest = format_digest(&generated("a".repeat(10_000)), now());

        assert!(digest.chars().count() <= MAX_MESSAGE_LEN);
        assert!(digest.contains("aaa...\n—\n"));
    }

    #[test]
    fn test_summary_exactly_at_limit_has_no_ellipsis() {
        let summary = generated("");
        let limit = MAX_MESSAGE_LEN
            - header(now()).chars().count()
            - footer(&summary).chars().count()
            - SAFETY_MARGIN;

        let digest = format_digest(&generated("b".repeat(limit)), now());
        assert!(!digest.contains("..."));

        let digest = format_digest(&generated("b".repeat(limit + 1)), now());
        assert!(digest.contains("b..."));
    }

    proptest! {
        #[test]
        fn digest_never_exceeds_message_limit(text in "\\PC{0,6000}") {
            let digest = format_digest(&generated(text), now());
            prop_assert!(digest.chars().count() <= MAX_MESSAGE_LEN);
        }

        #[test]
        fn multibyte_summary_never_exceeds_limit(n in 0usize..8000) {
            let digest = format_digest(&Summary::Fallback("📈".repeat(n)), now());
            prop_assert!(digest.chars().count() <= MAX_MESSAGE_LEN);
        }
    }
}
