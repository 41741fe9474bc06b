use thiserror::Error;

/// Raised when an inbound payload cannot be turned into a usable event.
///
/// A decode failure aborts processing of that single message only; it carries no state and cannot affect other
/// orders.
#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("Could not deserialize event payload. {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Event payload does not carry an order id.")]
    MissingOrderId,
}
