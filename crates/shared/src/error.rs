use thiserror::Error;

/// Failures that end a run with a non-zero exit code.
///
/// Everything else (provider outages, malformed JSON, AI failures) degrades
/// to a placeholder or fallback and never surfaces here.
#[derive(Error, Debug)]
pub enum DigestError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("Failed to deliver digest: {failed} of {total} chunks failed")]
    DeliveryFailed { failed: usize, total: usize },
}
