//! Media store — uploads binary artifacts and returns public URLs.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("upload failed: {0}")]
    Upload(String),
}

/// Upload capability for generated audio and images. Implementations must
/// be safe to call from concurrently running jobs.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, MediaError>;
}

/// S3 / MinIO-backed media store.
pub struct S3MediaStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3MediaStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, MediaError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        info!("Uploaded artifact to s3://{}/{}", self.bucket, key);
        Ok(format!("{}/{}/{}", self.public_base_url, self.bucket, key))
    }
}
