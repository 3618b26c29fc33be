use std::env;
use std::sync::Arc;

use crate::recipients::parse_recipients;
use crate::transport::EmailTransport;
use crate::types::{DeliveryReport, DeliveryResult, DeliveryStatus, NotificationError};

/// Environment variable holding the recipient address list.
pub const RECIPIENTS_ENV_VAR: &str = "EMAIL_TO_ADDRESS";

/// Sends one logical notification to every configured recipient.
///
/// Each recipient gets an individual transport call so a failing address
/// never prevents delivery to the rest; outcomes are accumulated into a
/// [`DeliveryReport`] for metrics and logging.
pub struct EmailDispatcher {
    transport: Arc<dyn EmailTransport>,
    recipient_source: Option<String>,
}

impl EmailDispatcher {
    /// Create a dispatcher over a transport and a raw recipient value
    /// (single address or comma-separated list).
    pub fn new(transport: Arc<dyn EmailTransport>, recipient_source: Option<String>) -> Self {
        Self { transport, recipient_source }
    }

    /// Create a dispatcher reading recipients from `EMAIL_TO_ADDRESS`.
    pub fn from_env(transport: Arc<dyn EmailTransport>) -> Self {
        Self::new(transport, env::var(RECIPIENTS_ENV_VAR).ok())
    }

    /// Resolve and validate the configured recipient list.
    pub fn resolve_recipients(&self) -> Result<Vec<String>, NotificationError> {
        parse_recipients(self.recipient_source.as_deref())
    }

    /// Send a notification to all configured recipients.
    ///
    /// Never fails for individual delivery errors. When recipient
    /// resolution itself fails, the returned report has zero counts and a
    /// single aggregate configuration error so callers can log and proceed.
    pub async fn send_all(
        &self,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> DeliveryReport {
        let recipients = match self.resolve_recipients() {
            Ok(recipients) => recipients,
            Err(e) => {
                log::error!("Failed to resolve notification recipients: {}", e);
                return DeliveryReport {
                    errors: vec![format!("Email configuration error: {e}")],
                    ..DeliveryReport::default()
                };
            }
        };

        log::info!("Sending notifications to {} recipient(s)", recipients.len());

        let mut report = DeliveryReport::default();

        for recipient in recipients {
            match self.transport.send(&recipient, subject, text_body, html_body).await {
                Ok(message_id) => {
                    log::info!(
                        "Successfully sent notification to {} (message id {})",
                        recipient,
                        message_id
                    );
                    report.success_count += 1;
                    report.results.push(DeliveryResult {
                        recipient,
                        status: DeliveryStatus::Success,
                        error: None,
                    });
                }
                Err(e) => {
                    let error_msg = format!("Failed to send notification to {recipient}: {e}");
                    log::error!("{}", error_msg);
                    report.failure_count += 1;
                    report.results.push(DeliveryResult {
                        recipient,
                        status: DeliveryStatus::Failure,
                        error: Some(e.to_string()),
                    });
                    report.errors.push(error_msg);
                }
            }
        }

        log::info!(
            "Email delivery summary: {} successful, {} failed",
            report.success_count,
            report.failure_count
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Transport that records sends and fails for a chosen set of addresses.
    struct MockTransport {
        failing: HashSet<String>,
        sent_to: Mutex<Vec<String>>,
    }

    impl MockTransport {
        fn new(failing: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                failing: failing.iter().map(|s| s.to_string()).collect(),
                sent_to: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl EmailTransport for MockTransport {
        async fn send(
            &self,
            to: &str,
            _subject: &str,
            _text_body: &str,
            _html_body: Option<&str>,
        ) -> Result<String, NotificationError> {
            self.sent_to.lock().unwrap().push(to.to_string());
            if self.failing.contains(to) {
                Err(NotificationError::SesError("connection refused".to_string()))
            } else {
                Ok(format!("mock-message-{to}"))
            }
        }
    }

    #[tokio::test]
    async fn delivers_to_every_recipient() {
        let transport = MockTransport::new(&[]);
        let dispatcher = EmailDispatcher::new(
            transport.clone(),
            Some("a@example.com,b@example.com".to_string()),
        );

        let report = dispatcher.send_all("Subject", "body", None).await;

        assert_eq!(report.success_count, 2);
        assert_eq!(report.failure_count, 0);
        assert!(report.errors.is_empty());
        assert_eq!(
            *transport.sent_to.lock().unwrap(),
            vec!["a@example.com", "b@example.com"]
        );
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_block_the_rest() {
        let transport = MockTransport::new(&["b@example.com"]);
        let dispatcher = EmailDispatcher::new(
            transport.clone(),
            Some("a@example.com,b@example.com,c@example.com".to_string()),
        );

        let report = dispatcher.send_all("Subject", "body", Some("<p>body</p>")).await;

        assert_eq!(report.success_count, 2);
        assert_eq!(report.failure_count, 1);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[0].status, DeliveryStatus::Success);
        assert_eq!(report.results[1].status, DeliveryStatus::Failure);
        assert_eq!(report.results[2].status, DeliveryStatus::Success);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("b@example.com"));
        // All three were attempted despite the middle failure.
        assert_eq!(transport.sent_to.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn missing_recipient_config_yields_zero_count_report() {
        let transport = MockTransport::new(&[]);
        let dispatcher = EmailDispatcher::new(transport.clone(), None);

        let report = dispatcher.send_all("Subject", "body", None).await;

        assert_eq!(report.success_count, 0);
        assert_eq!(report.failure_count, 0);
        assert!(report.results.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Email configuration error"));
        assert!(transport.sent_to.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_only_recipient_config_yields_zero_count_report() {
        let transport = MockTransport::new(&[]);
        let dispatcher =
            EmailDispatcher::new(transport.clone(), Some("not-an-email".to_string()));

        let report = dispatcher.send_all("Subject", "body", None).await;

        assert_eq!(report.total_attempts(), 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Email configuration error"));
    }

    #[tokio::test]
    async fn failure_results_carry_the_transport_error() {
        let transport = MockTransport::new(&["only@example.com"]);
        let dispatcher =
            EmailDispatcher::new(transport, Some("only@example.com".to_string()));

        let report = dispatcher.send_all("Subject", "body", None).await;

        assert_eq!(report.failure_count, 1);
        let error = report.results[0].error.as_deref().unwrap();
        assert!(error.contains("connection refused"));
    }
}
