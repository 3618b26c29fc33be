use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{error, info};

use crate::types::{SnapshotStore, StoredSnapshot, snapshot_key};

/// Snapshot store backed by an S3 cache bucket.
#[derive(Debug, Clone)]
pub struct S3SnapshotStore {
    s3_client: S3Client,
    bucket_name: String,
}

impl S3SnapshotStore {
    /// Create a store over an existing client and bucket.
    pub fn new(s3_client: S3Client, bucket_name: impl Into<String>) -> Self {
        Self { s3_client, bucket_name: bucket_name.into() }
    }

    /// Create a store using default AWS configuration.
    pub async fn from_default_config(bucket_name: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(S3Client::new(&config), bucket_name)
    }

    /// The configured cache bucket name.
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

#[async_trait]
impl SnapshotStore for S3SnapshotStore {
    async fn retrieve(&self, campground_id: &str) -> Option<StoredSnapshot> {
        let key = snapshot_key(campground_id);

        let response = match self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    info!("No previous results found for campground {}", campground_id);
                } else {
                    error!(
                        "S3 error retrieving results for campground {}: {}",
                        campground_id, e
                    );
                }
                return None;
            }
        };

        let bytes = match response.body.collect().await {
            Ok(data) => data.into_bytes(),
            Err(e) => {
                error!("Failed to read S3 body for campground {}: {}", campground_id, e);
                return None;
            }
        };

        match serde_json::from_slice::<StoredSnapshot>(&bytes) {
            Ok(snapshot) => {
                info!(
                    "Successfully retrieved results for campground {} from S3",
                    campground_id
                );
                Some(snapshot)
            }
            Err(e) => {
                error!(
                    "Data parsing error for campground {}: {}",
                    campground_id, e
                );
                None
            }
        }
    }

    async fn store(&self, snapshot: &StoredSnapshot) -> bool {
        let key = snapshot_key(&snapshot.campground_id);

        let body = match serde_json::to_vec_pretty(snapshot) {
            Ok(body) => body,
            Err(e) => {
                error!(
                    "JSON serialization error for campground {}: {}",
                    snapshot.campground_id, e
                );
                return false;
            }
        };

        match self
            .s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
        {
            Ok(_) => {
                info!(
                    "Successfully stored results for campground {} in S3",
                    snapshot.campground_id
                );
                true
            }
            Err(e) => {
                error!(
                    "S3 error storing results for campground {}: {}",
                    snapshot.campground_id, e
                );
                false
            }
        }
    }
}
