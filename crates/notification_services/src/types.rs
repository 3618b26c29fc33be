use serde::Serialize;

/// Errors raised by notification configuration and the mail transport.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Missing or invalid notification configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Simple email service (SES) errors.
    #[error("AWS SES error: {0}")]
    SesError(String),
}

/// Outcome of one individual send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// The transport accepted the message for this recipient.
    Success,
    /// The transport failed for this recipient.
    Failure,
}

/// Per-recipient delivery outcome.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    /// Recipient email address
    pub recipient: String,
    /// Whether the send attempt succeeded
    pub status: DeliveryStatus,
    /// Stringified transport error for failed attempts
    pub error: Option<String>,
}

/// Aggregate outcome of one notification dispatch across all recipients.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryReport {
    /// Number of successful deliveries
    pub success_count: usize,
    /// Number of failed deliveries
    pub failure_count: usize,
    /// Per-recipient outcomes, in dispatch order
    pub results: Vec<DeliveryResult>,
    /// Human-readable error messages for failed deliveries
    pub errors: Vec<String>,
}

impl DeliveryReport {
    /// Total number of delivery attempts made.
    pub fn total_attempts(&self) -> usize {
        self.success_count + self.failure_count
    }

    /// Recipient addresses that were attempted, in dispatch order.
    pub fn recipients(&self) -> Vec<String> {
        self.results.iter().map(|r| r.recipient.clone()).collect()
    }
}
