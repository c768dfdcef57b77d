use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage errors already name the bucket or carry the provider's message.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Configuration parsing error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Credential file not found: {}", .0.display())]
    CredentialFile(PathBuf),
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Cannot access bucket {bucket}: {source}")]
    BucketAccess {
        bucket: String,
        #[source]
        source: aws_sdk_s3::Error,
    },

    #[error("Failed to create bucket {bucket}: {source}")]
    BucketCreation {
        bucket: String,
        #[source]
        source: aws_sdk_s3::Error,
    },

    #[error("Failed to enable versioning on bucket {bucket}: {source}")]
    Versioning {
        bucket: String,
        #[source]
        source: aws_sdk_s3::Error,
    },

    /// The provider error from `PutObject`, passed through as-is.
    #[error(transparent)]
    Upload(aws_sdk_s3::Error),

    #[error("Failed to read from the OS random source: {0}")]
    Randomness(#[from] rand::Error),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(ConfigError::Parse(err))
    }
}

impl From<rand::Error> for Error {
    fn from(err: rand::Error) -> Self {
        Error::Storage(StorageError::Randomness(err))
    }
}
