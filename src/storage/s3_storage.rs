use crate::config::{CredentialFiles, S3Settings};
use crate::prelude::*;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_runtime::env_config::file::{EnvConfigFileKind, EnvConfigFiles};
use aws_sdk_s3::primitives::{ByteStream, DateTime as S3DateTime};
use aws_sdk_s3::types::{
    BucketCannedAcl, BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration,
    ObjectLockRetention, ObjectLockRetentionMode, VersioningConfiguration,
};
use aws_sdk_s3::{config::Region, Client};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::ObjectStorage;

/// S3 rejects an explicit location constraint for its default region.
const DEFAULT_REGION: &str = "us-east-1";

pub struct S3Storage {
    client: Client,
    region: Option<String>,
}

impl S3Storage {
    /// Builds a client from the SDK's default chain, narrowed by whatever the
    /// settings pin down. Credential files are validated before the SDK loads.
    pub async fn new(settings: &S3Settings) -> Result<Self> {
        settings.validate()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(files) = settings.credentials.as_ref().filter(|c| !c.is_empty()) {
            loader = loader.profile_files(profile_files(files));
        }
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.endpoint_url.is_some())
            .build();
        let region = sdk_config.region().map(|r| r.as_ref().to_owned());
        info!(region = ?region, "Loaded S3 client configuration");

        Ok(Self::from_client(Client::from_conf(s3_config), region))
    }

    pub fn from_client(client: Client, region: Option<String>) -> Self {
        Self { client, region }
    }

    fn bucket_configuration(&self) -> Option<CreateBucketConfiguration> {
        self.region
            .as_deref()
            .filter(|region| *region != DEFAULT_REGION)
            .map(|region| {
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build()
            })
    }
}

/// Each named file replaces only its own default; the other kind keeps
/// loading from `~/.aws`.
fn profile_files(files: &CredentialFiles) -> EnvConfigFiles {
    let mut builder = EnvConfigFiles::builder()
        .include_default_config_file(files.config_file.is_none())
        .include_default_credentials_file(files.shared_credentials_file.is_none());
    if let Some(path) = &files.config_file {
        builder = builder.with_file(EnvConfigFileKind::Config, path);
    }
    if let Some(path) = &files.shared_credentials_file {
        builder = builder.with_file(EnvConfigFileKind::Credentials, path);
    }
    builder.build()
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn head_bucket(&self, bucket: &str) -> std::result::Result<(), aws_sdk_s3::Error> {
        self.client.head_bucket().bucket(bucket).send().await?;
        Ok(())
    }

    async fn create_bucket(&self, bucket: &str) -> std::result::Result<(), aws_sdk_s3::Error> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .acl(BucketCannedAcl::Private)
            .object_lock_enabled_for_bucket(true)
            .set_create_bucket_configuration(self.bucket_configuration())
            .send()
            .await?;
        debug!(bucket, "Created bucket");
        Ok(())
    }

    async fn enable_versioning(&self, bucket: &str) -> std::result::Result<(), aws_sdk_s3::Error> {
        self.client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await?;
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> std::result::Result<(), aws_sdk_s3::Error> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await?;
        Ok(())
    }

    async fn put_object_retention(
        &self,
        bucket: &str,
        key: &str,
        retain_until: DateTime<Utc>,
    ) -> std::result::Result<(), aws_sdk_s3::Error> {
        let retention = ObjectLockRetention::builder()
            .mode(ObjectLockRetentionMode::Compliance)
            .retain_until_date(S3DateTime::from_millis(retain_until.timestamp_millis()))
            .build();

        self.client
            .put_object_retention()
            .bucket(bucket)
            .key(key)
            .retention(retention)
            .send()
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(region: Option<&str>) -> S3Storage {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(region.map(|r| Region::new(r.to_owned())))
            .build();
        S3Storage::from_client(Client::from_conf(config), region.map(str::to_owned))
    }

    #[test]
    fn location_constraint_follows_region() {
        let configuration = storage(Some("eu-west-1")).bucket_configuration().unwrap();
        assert_eq!(
            configuration.location_constraint(),
            Some(&BucketLocationConstraint::EuWest1)
        );
    }

    #[test]
    fn default_region_sends_no_location_constraint() {
        assert!(storage(Some("us-east-1")).bucket_configuration().is_none());
        assert!(storage(None).bucket_configuration().is_none());
    }

    #[test]
    fn credentials_file_alone_keeps_default_config() {
        let files = profile_files(&CredentialFiles {
            config_file: None,
            shared_credentials_file: Some("/tmp/creds".into()),
        });
        let loaded = format!("{:?}", files);

        assert!(loaded.contains("Default(Config)"), "{}", loaded);
        assert!(!loaded.contains("Default(Credentials)"), "{}", loaded);
        assert!(loaded.contains("/tmp/creds"), "{}", loaded);
    }

    #[test]
    fn config_file_alone_keeps_default_credentials() {
        let files = profile_files(&CredentialFiles {
            config_file: Some("/tmp/aws-config".into()),
            shared_credentials_file: None,
        });
        let loaded = format!("{:?}", files);

        assert!(loaded.contains("Default(Credentials)"), "{}", loaded);
        assert!(!loaded.contains("Default(Config)"), "{}", loaded);
        assert!(loaded.contains("/tmp/aws-config"), "{}", loaded);
    }

    #[test]
    fn both_files_replace_both_defaults() {
        let files = profile_files(&CredentialFiles {
            config_file: Some("/tmp/aws-config".into()),
            shared_credentials_file: Some("/tmp/creds".into()),
        });
        let loaded = format!("{:?}", files);

        assert!(!loaded.contains("Default("), "{}", loaded);
    }

    #[tokio::test]
    async fn missing_credential_file_fails_before_loading() {
        let mut settings = S3Settings::new("bucket");
        settings.credentials = Some(CredentialFiles {
            config_file: Some("/nonexistent/aws/config".into()),
            shared_credentials_file: None,
        });

        assert!(S3Storage::new(&settings).await.is_err());
    }
}
