mod key;
mod s3_storage;
mod uploader;

pub use key::{generate_key, UploadKey, KEY_PREFIX_BYTES};
pub use s3_storage::S3Storage;
pub use uploader::Uploader;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The provider calls an [`Uploader`] is built from. Every method maps to a
/// single S3 request and surfaces the provider's own error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// `HeadBucket`. A missing bucket comes back as `aws_sdk_s3::Error::NotFound`.
    async fn head_bucket(&self, bucket: &str) -> Result<(), aws_sdk_s3::Error>;

    /// `CreateBucket` with a private ACL and object lock enabled.
    async fn create_bucket(&self, bucket: &str) -> Result<(), aws_sdk_s3::Error>;

    async fn enable_versioning(&self, bucket: &str) -> Result<(), aws_sdk_s3::Error>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<(), aws_sdk_s3::Error>;

    /// `PutObjectRetention` in compliance mode.
    async fn put_object_retention(
        &self,
        bucket: &str,
        key: &str,
        retain_until: DateTime<Utc>,
    ) -> Result<(), aws_sdk_s3::Error>;
}
