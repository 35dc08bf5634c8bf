use thiserror::Error;

/// Failures surfaced by the market data client.
///
/// Every variant is retryable by the user; the client itself never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// Transport failure, non-2xx status, or a response that did not match
    /// the expected schema.
    #[error("market data unavailable: {0}")]
    Transient(String),
    #[error("coin not found: {0}")]
    NotFound(String),
}

impl MarketError {
    pub fn transient(message: impl Into<String>) -> Self {
        MarketError::Transient(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MarketError::NotFound(_))
    }
}
