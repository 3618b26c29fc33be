//! # Notification Services
//!
//! This crate delivers one logical availability notification to every
//! configured recipient. Recipients come from a single comma-separated
//! configuration value; each recipient gets an individual send attempt so
//! that one failing address never blocks the others, and the aggregate
//! outcome is reported as a [`DeliveryReport`].

/// Per-recipient dispatch with isolated failure handling.
pub mod dispatcher;
/// Parsing and validation of recipient address configuration.
pub mod recipients;
/// Mail transport boundary and the AWS SES implementation.
pub mod transport;
/// Errors and delivery accounting types.
pub mod types;

pub use dispatcher::EmailDispatcher;
pub use recipients::{parse_recipients, primary_recipient};
pub use transport::{EmailTransport, SesEmailTransport};
pub use types::{DeliveryReport, DeliveryResult, DeliveryStatus, NotificationError};
