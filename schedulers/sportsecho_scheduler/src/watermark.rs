use object_store::{aws::AmazonS3Builder, path::Path, ObjectStore, PutPayload};
use std::sync::Arc;
use tracing::debug;

use crate::error::WatermarkError;

/// Outcome of reading a watermark. Failures are reported, never raised, so a
/// broken bucket cannot take a cycle down, but callers still have to decide
/// what an absent value means.
#[derive(Debug)]
pub enum WatermarkRead {
    Value(String),
    Missing,
    Failed(object_store::Error),
}

/// Single-value cursor objects kept in one bucket, one key per sport.
#[derive(Clone)]
pub struct WatermarkStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl WatermarkStore {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// S3 bucket, credentials and region from the usual `AWS_*` variables.
    pub fn s3(bucket: &str) -> Result<Self, WatermarkError> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()?;
        Ok(Self::new(Arc::new(store), bucket))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Reads the object as text with its lines joined back together without
    /// separators, so `"2024-03-05\n"` reads as `"2024-03-05"`.
    pub async fn read(&self, key: &str) -> WatermarkRead {
        let location = Path::from(key);
        let bytes = match self.store.get(&location).await {
            Ok(result) => result.bytes().await,
            Err(e) => Err(e),
        };
        match bytes {
            Ok(bytes) => {
                let content: String = String::from_utf8_lossy(&bytes).lines().collect();
                if content.is_empty() {
                    WatermarkRead::Missing
                } else {
                    WatermarkRead::Value(content)
                }
            }
            Err(object_store::Error::NotFound { .. }) => WatermarkRead::Missing,
            Err(e) => WatermarkRead::Failed(e),
        }
    }

    /// Overwrites `key` with `content` encoded as UTF-8.
    pub async fn upload(&self, key: &str, content: &str) -> Result<(), WatermarkError> {
        let bytes = content.as_bytes().to_vec();
        debug!(
            "Uploading {} bytes to {}/{}",
            bytes.len(),
            self.bucket,
            key
        );
        self.store
            .put(&Path::from(key), PutPayload::from(bytes))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), WatermarkError> {
        self.store.delete(&Path::from(key)).await?;
        Ok(())
    }
}
