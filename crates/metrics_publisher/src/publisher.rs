use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudwatch::Client as CloudWatchClient;
use aws_sdk_cloudwatch::types::{Dimension, MetricDatum, StandardUnit};

/// CloudWatch namespace for notification metrics.
const METRICS_NAMESPACE: &str = "CampsiteCheck/Notifications";

/// CloudWatch caps put_metric_data at 20 datums per call.
const METRICS_BATCH_SIZE: usize = 20;

/// Sink for named counters with string-valued dimensions.
///
/// All methods are fire-and-forget: implementations log failures and never
/// surface them to the caller.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Record delivery outcomes for one campground's notification dispatch.
    async fn publish_delivery_metrics(
        &self,
        campground_id: &str,
        campground_name: &str,
        success_count: usize,
        failure_count: usize,
        recipients: &[String],
    );

    /// Record that a notification was skipped, with the reason as a dimension.
    async fn publish_notification_skipped(
        &self,
        campground_id: &str,
        campground_name: &str,
        reason: &str,
    );

    /// Record a snapshot-store operation failure.
    async fn publish_store_failure(&self, operation: &str, target: &str, key: &str);
}

/// Publishes metrics to CloudWatch, batching datums per API limits.
#[derive(Debug, Clone)]
pub struct CloudWatchMetrics {
    cloudwatch: CloudWatchClient,
    namespace: String,
}

impl CloudWatchMetrics {
    /// Create a publisher over an existing CloudWatch client.
    pub fn new(cloudwatch: CloudWatchClient) -> Self {
        Self { cloudwatch, namespace: METRICS_NAMESPACE.to_string() }
    }

    /// Create a publisher using default AWS configuration.
    pub async fn from_default_config() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(CloudWatchClient::new(&config))
    }

    async fn publish_batches(&self, data: Vec<MetricDatum>) {
        for batch in data.chunks(METRICS_BATCH_SIZE) {
            let result = self
                .cloudwatch
                .put_metric_data()
                .namespace(&self.namespace)
                .set_metric_data(Some(batch.to_vec()))
                .send()
                .await;

            match result {
                Ok(_) => log::debug!("Published batch of {} metrics to CloudWatch", batch.len()),
                Err(e) => log::error!("Failed to publish metrics batch: {}", e),
            }
        }
    }
}

fn datum(name: &str, value: f64, unit: StandardUnit, dimensions: &[(&str, &str)]) -> MetricDatum {
    let mut builder = MetricDatum::builder().metric_name(name).value(value).unit(unit);
    for (dim_name, dim_value) in dimensions {
        builder = builder
            .dimensions(Dimension::builder().name(*dim_name).value(*dim_value).build());
    }
    builder.build()
}

#[async_trait]
impl MetricsSink for CloudWatchMetrics {
    async fn publish_delivery_metrics(
        &self,
        campground_id: &str,
        campground_name: &str,
        success_count: usize,
        failure_count: usize,
        recipients: &[String],
    ) {
        let campground_dims: &[(&str, &str)] = &[
            ("CampgroundId", campground_id),
            ("CampgroundName", campground_name),
        ];

        let mut data = Vec::new();

        if success_count > 0 {
            data.push(datum(
                "EmailDeliverySuccess",
                success_count as f64,
                StandardUnit::Count,
                campground_dims,
            ));
        }

        if failure_count > 0 {
            data.push(datum(
                "EmailDeliveryFailure",
                failure_count as f64,
                StandardUnit::Count,
                campground_dims,
            ));
        }

        let total_attempts = success_count + failure_count;
        if total_attempts > 0 {
            let success_rate = (success_count as f64 / total_attempts as f64) * 100.0;
            data.push(datum(
                "EmailDeliverySuccessRate",
                success_rate,
                StandardUnit::Percent,
                campground_dims,
            ));
        }

        // Per-recipient datums use masked addresses; raw addresses never
        // leave the process through metrics.
        for (i, recipient) in recipients.iter().enumerate() {
            let masked = mask_email(recipient);
            data.push(datum(
                "IndividualEmailDelivery",
                if i < success_count { 1.0 } else { 0.0 },
                StandardUnit::Count,
                &[("CampgroundId", campground_id), ("EmailAddress", &masked)],
            ));
        }

        self.publish_batches(data).await;

        log::info!(
            "Published email delivery metrics for {}: {} successes, {} failures",
            campground_name,
            success_count,
            failure_count
        );
    }

    async fn publish_notification_skipped(
        &self,
        campground_id: &str,
        campground_name: &str,
        reason: &str,
    ) {
        let data = vec![datum(
            "NotificationSkipped",
            1.0,
            StandardUnit::Count,
            &[
                ("CampgroundId", campground_id),
                ("CampgroundName", campground_name),
                ("Reason", reason),
            ],
        )];

        self.publish_batches(data).await;
        log::info!(
            "Published notification skipped metric for {}: {}",
            campground_name,
            reason
        );
    }

    async fn publish_store_failure(&self, operation: &str, target: &str, key: &str) {
        let data = vec![datum(
            "SnapshotStoreFailure",
            1.0,
            StandardUnit::Count,
            &[("Operation", operation), ("Target", target)],
        )];

        self.publish_batches(data).await;
        log::info!(
            "Published store failure metric for {} on {}/{}",
            operation,
            target,
            key
        );
    }
}

/// Log-only sink for local development runs.
#[derive(Debug, Default, Clone)]
pub struct LogMetrics;

#[async_trait]
impl MetricsSink for LogMetrics {
    async fn publish_delivery_metrics(
        &self,
        campground_id: &str,
        campground_name: &str,
        success_count: usize,
        failure_count: usize,
        recipients: &[String],
    ) {
        log::info!(
            "[metrics] delivery campground={}({}) success={} failure={} recipients={}",
            campground_name,
            campground_id,
            success_count,
            failure_count,
            recipients.len()
        );
    }

    async fn publish_notification_skipped(
        &self,
        campground_id: &str,
        campground_name: &str,
        reason: &str,
    ) {
        log::info!(
            "[metrics] skipped campground={}({}) reason={}",
            campground_name,
            campground_id,
            reason
        );
    }

    async fn publish_store_failure(&self, operation: &str, target: &str, key: &str) {
        log::info!("[metrics] store failure op={} target={} key={}", operation, target, key);
    }
}

/// Mask an email address for use as a metric dimension.
fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return "invalid_email".to_string();
    };

    let mut chars = local.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(_)) => {
            let masked = "*".repeat(local.chars().count() - 1);
            format!("{first}{masked}@{domain}")
        }
        _ => format!("{local}@{domain}"),
    }
}
