use crate::error::ConfigError;
use crate::prelude::*;
use chrono::{DateTime, Utc};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub s3: S3Settings,
}

/// Where and how objects are stored. Fixed for the lifetime of an uploader.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Settings {
    pub bucket: String,
    /// Falls back to the SDK's default region chain when unset.
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO and friends).
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub credentials: Option<CredentialFiles>,
    #[serde(default)]
    pub retention: Option<RetentionPolicy>,
}

/// Explicit AWS profile files handed to the SDK loader in place of the
/// `AWS_CONFIG_FILE` / `AWS_SHARED_CREDENTIALS_FILE` lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialFiles {
    #[serde(default)]
    pub config_file: Option<PathBuf>,
    #[serde(default)]
    pub shared_credentials_file: Option<PathBuf>,
}

/// Compliance-mode lock applied to every uploaded object.
///
/// A configured but disabled policy still turns on bucket versioning when the
/// bucket gets created; only the per-object lock is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetentionPolicy {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub retain_until: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl RetentionPolicy {
    pub fn new(enabled: bool, retain_until: DateTime<Utc>) -> Self {
        Self {
            enabled,
            retain_until,
        }
    }

    /// Enabled policy that expires `period` from now.
    pub fn for_duration(period: Duration) -> Result<Self> {
        let period = chrono::Duration::from_std(period)
            .map_err(|e| ConfigError::InvalidValue(format!("retention period: {}", e)))?;
        Ok(Self::new(true, Utc::now() + period))
    }
}

impl Settings {
    pub fn new() -> Result<Self> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::new("config/default", FileFormat::Toml).required(false))
            // Per-environment overrides, e.g. config/production.toml
            .add_source(File::new(&format!("config/{}", env), FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("BUCKET_DROP").separator("__"))
            .build()?;

        Self::finish(s)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let s = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(Environment::with_prefix("BUCKET_DROP").separator("__"))
            .build()?;

        Self::finish(s)
    }

    fn finish(s: Config) -> Result<Self> {
        let settings: Settings = s.try_deserialize()?;
        settings.s3.validate()?;
        Ok(settings)
    }
}

impl S3Settings {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: None,
            endpoint_url: None,
            credentials: None,
            retention: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::InvalidValue("s3.bucket must not be empty".into()).into());
        }
        if let Some(credentials) = &self.credentials {
            credentials.validate()?;
        }
        Ok(())
    }
}

impl CredentialFiles {
    pub fn is_empty(&self) -> bool {
        self.config_file.is_none() && self.shared_credentials_file.is_none()
    }

    /// Every named file must exist before the SDK is asked to read it.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.config_file, &self.shared_credentials_file]
            .into_iter()
            .flatten()
        {
            if !path.is_file() {
                return Err(ConfigError::CredentialFile(path.clone()).into());
            }
        }
        Ok(())
    }
}
