use bucket_drop::config::Settings;
use bucket_drop::prelude::*;
use bucket_drop::storage::{S3Storage, Uploader};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info};

const DEMO_PAYLOAD: &str = "this is some data";
const DEMO_IDENTIFIER: &str = "file-id";

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    if let Err(e) = run().await {
        error!("Upload failed: {}", e);
        std::process::exit(1);
    }
}

/// `bucket_drop [identifier] [file]`; without a file the demo payload is sent.
async fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let identifier = args.next().unwrap_or_else(|| DEMO_IDENTIFIER.to_string());
    let payload = match args.next().map(PathBuf::from) {
        Some(path) => std::fs::read(path)?,
        None => DEMO_PAYLOAD.as_bytes().to_vec(),
    };

    let settings = Settings::new()?;
    info!(bucket = %settings.s3.bucket, "Starting bucket-drop upload");

    let storage = S3Storage::new(&settings.s3).await?;
    let uploader = Uploader::from_settings(storage, &settings.s3);

    let key = uploader.upload(&payload, &identifier).await?;
    info!(upload_id = %key, "Success!");
    Ok(())
}
