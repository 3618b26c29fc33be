use std::env;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ses::Client as SesClient;

use crate::types::NotificationError;

/// Mail transport boundary: sends one message to one recipient.
///
/// Implementations may fail per call; the dispatcher isolates those
/// failures so one recipient never blocks another.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send one message to a single recipient, returning the provider's
    /// message id on success.
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> Result<String, NotificationError>;
}

/// AWS SES mail transport.
#[derive(Debug, Clone)]
pub struct SesEmailTransport {
    ses_client: SesClient,
    from_address: String,
}

impl SesEmailTransport {
    /// Create an SES transport from environment configuration.
    ///
    /// Fails fast with a configuration error when the sender address or the
    /// AWS credentials are absent: no partial transport should exist without
    /// a valid sending identity.
    pub async fn from_env() -> Result<Self, NotificationError> {
        let from_address = require_env("EMAIL_FROM_ADDRESS")?;
        require_env("AWS_REGION")?;
        require_env("AWS_ACCESS_KEY_ID")?;
        require_env("AWS_SECRET_ACCESS_KEY")?;

        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let ses_client = SesClient::new(&config);

        Ok(Self { ses_client, from_address })
    }

    /// Create a transport with an explicit client and sender address.
    pub fn new(ses_client: SesClient, from_address: String) -> Result<Self, NotificationError> {
        if from_address.trim().is_empty() {
            return Err(NotificationError::Config(
                "sender address must not be empty".to_string(),
            ));
        }
        Ok(Self { ses_client, from_address })
    }

    /// The configured sender address.
    pub fn from_address(&self) -> &str {
        &self.from_address
    }
}

fn require_env(name: &str) -> Result<String, NotificationError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| NotificationError::Config(format!("{name} environment variable not set")))
}

#[async_trait]
impl EmailTransport for SesEmailTransport {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> Result<String, NotificationError> {
        log::info!("Sending email to {} with subject: {}", to, subject);

        let subject_content = aws_sdk_ses::types::Content::builder()
            .data(subject)
            .build()
            .map_err(|e| NotificationError::SesError(format!("Failed to build subject: {e}")))?;

        let text_content = aws_sdk_ses::types::Content::builder()
            .data(text_body)
            .build()
            .map_err(|e| NotificationError::SesError(format!("Failed to build text body: {e}")))?;

        let mut body = aws_sdk_ses::types::Body::builder().text(text_content);

        if let Some(html) = html_body {
            let html_content = aws_sdk_ses::types::Content::builder()
                .data(html)
                .build()
                .map_err(|e| {
                    NotificationError::SesError(format!("Failed to build HTML body: {e}"))
                })?;
            body = body.html(html_content);
        }

        let message = aws_sdk_ses::types::Message::builder()
            .subject(subject_content)
            .body(body.build())
            .build();

        let destination = aws_sdk_ses::types::Destination::builder()
            .to_addresses(to)
            .build();

        let result = self
            .ses_client
            .send_email()
            .source(&self.from_address)
            .destination(destination)
            .message(message)
            .send()
            .await;

        match result {
            Ok(output) => {
                let message_id = output.message_id().to_string();
                log::info!("SES accepted message {} for {}", message_id, to);
                Ok(message_id)
            }
            Err(e) => {
                let error_msg = if let Some(service_error) = e.as_service_error() {
                    format!("AWS SES service error: {service_error:?}")
                } else {
                    format!("AWS SES error: {e}")
                };
                log::error!("Failed to send email to {}: {}", to, error_msg);
                Err(NotificationError::SesError(error_msg))
            }
        }
    }
}
