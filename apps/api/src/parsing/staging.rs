use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;
use uuid::Uuid;

use crate::parsing::UploadedFile;

/// The staging transport: turns uploaded bytes into a fetchable URL that the
/// parse attempt and the persisted record can reference.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn stage(&self, file: &UploadedFile) -> Result<String>;
}

/// S3-backed staging (MinIO locally, AWS in production).
pub struct S3FileStore {
    s3: aws_sdk_s3::Client,
    bucket: String,
    endpoint: String,
}

impl S3FileStore {
    pub fn new(s3: aws_sdk_s3::Client, bucket: String, endpoint: String) -> Self {
        Self {
            s3,
            bucket,
            endpoint,
        }
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn stage(&self, file: &UploadedFile) -> Result<String> {
        let key = format!("uploads/{}/{}", Uuid::new_v4(), file.filename);

        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(file.bytes.to_vec()))
            .content_type(&file.content_type)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Staged '{}' to s3://{}/{}", file.filename, self.bucket, key);

        Ok(format!("{}/{}/{}", self.endpoint, self.bucket, key))
    }
}
