//! Broker error types.

/// Errors that can occur talking to the brokerage, quote or signal provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// Transport failure, timeout, or a non-success HTTP status.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider answered, but not with the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no usable quote for {0}")]
    QuoteUnavailable(String),

    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// The request was refused locally before reaching the provider.
    #[error("invalid order: {0}")]
    InvalidOrder(String),
}

impl BrokerError {
    /// Short machine-readable name, used in audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            BrokerError::ProviderUnavailable(_) => "provider_unavailable",
            BrokerError::MalformedResponse(_) => "malformed_response",
            BrokerError::QuoteUnavailable(_) => "quote_unavailable",
            BrokerError::OrderRejected(_) => "order_rejected",
            BrokerError::InvalidOrder(_) => "invalid_order",
        }
    }
}
