use crate::config::{RetentionPolicy, S3Settings};
use crate::error::StorageError;
use crate::prelude::*;
use tracing::{error, info};

use super::{generate_key, ObjectStorage, UploadKey};

/// Stores payloads in a single bucket, creating the bucket on first use and
/// locking each object when a retention policy is enabled.
///
/// Each provider call is made at most once per upload; nothing is retried.
pub struct Uploader<S> {
    storage: S,
    bucket: String,
    retention: Option<RetentionPolicy>,
}

impl<S: ObjectStorage> Uploader<S> {
    pub fn new(storage: S, bucket: impl Into<String>, retention: Option<RetentionPolicy>) -> Self {
        Self {
            storage,
            bucket: bucket.into(),
            retention,
        }
    }

    pub fn from_settings(storage: S, settings: &S3Settings) -> Self {
        Self::new(storage, settings.bucket.clone(), settings.retention.clone())
    }

    /// Uploads `payload` under a fresh key ending in `identifier`.
    ///
    /// A failed retention lock does not fail the upload: the object is already
    /// stored by then, so the error is only logged.
    pub async fn upload(&self, payload: &[u8], identifier: &str) -> Result<UploadKey> {
        if !self.ensure_bucket().await? {
            self.create_bucket().await?;
        }

        let key = generate_key(identifier)?;

        if let Err(e) = self
            .storage
            .put_object(&self.bucket, key.as_str(), payload.to_vec())
            .await
        {
            error!(bucket = %self.bucket, key = %key, error = %e, "Failed to upload object");
            return Err(StorageError::Upload(e).into());
        }
        info!(bucket = %self.bucket, key = %key, size = payload.len(), "Uploaded object to S3");

        self.apply_retention(&key).await;

        Ok(key)
    }

    /// `Ok(false)` means the bucket is missing and may be created. Any other
    /// provider error aborts the upload.
    pub async fn ensure_bucket(&self) -> Result<bool> {
        match self.storage.head_bucket(&self.bucket).await {
            Ok(()) => {
                info!(bucket = %self.bucket, "Bucket exists and is accessible");
                Ok(true)
            }
            Err(aws_sdk_s3::Error::NotFound(_)) => {
                info!(bucket = %self.bucket, "Bucket is available");
                Ok(false)
            }
            Err(e) => {
                error!(
                    bucket = %self.bucket,
                    error = %e,
                    "Bucket is not accessible or the check failed"
                );
                Err(StorageError::BucketAccess {
                    bucket: self.bucket.clone(),
                    source: e,
                }
                .into())
            }
        }
    }

    /// Creates the bucket and, when any retention policy is configured,
    /// enables the versioning that object locks depend on.
    pub async fn create_bucket(&self) -> Result<()> {
        if let Err(e) = self.storage.create_bucket(&self.bucket).await {
            error!(bucket = %self.bucket, error = %e, "Failed to create bucket");
            return Err(StorageError::BucketCreation {
                bucket: self.bucket.clone(),
                source: e,
            }
            .into());
        }
        info!(bucket = %self.bucket, "Created bucket");

        if self.retention.is_some() {
            if let Err(e) = self.storage.enable_versioning(&self.bucket).await {
                error!(bucket = %self.bucket, error = %e, "Failed to enable versioning for bucket");
                return Err(StorageError::Versioning {
                    bucket: self.bucket.clone(),
                    source: e,
                }
                .into());
            }
            info!(bucket = %self.bucket, "Enabled versioning for bucket");
        }

        Ok(())
    }

    /// Best effort: errors are logged and dropped.
    pub async fn apply_retention(&self, key: &UploadKey) {
        let Some(policy) = self.retention.as_ref().filter(|p| p.enabled) else {
            return;
        };

        match self
            .storage
            .put_object_retention(&self.bucket, key.as_str(), policy.retain_until)
            .await
        {
            Ok(()) => info!(
                bucket = %self.bucket,
                key = %key,
                retain_until = %policy.retain_until,
                "Applied retention lock"
            ),
            Err(e) => error!(
                bucket = %self.bucket,
                key = %key,
                error = %e,
                "Failed to apply retention policy"
            ),
        }
    }
}
