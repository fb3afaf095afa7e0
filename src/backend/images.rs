/**
 * Image Store
 *
 * Uploaded images are stored by an `ImageStore` and referenced by URL from
 * the records that own them. `LocalImageStore` writes files below a root
 * directory and serves them under a public base URL.
 */

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store every buffer in `bucket` and return their public URLs in order
    async fn upload(&self, bucket: &str, buffers: Vec<Vec<u8>>) -> BackendResult<Vec<String>>;
}

/// Filesystem-backed image store
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    base_url: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload(&self, bucket: &str, buffers: Vec<Vec<u8>>) -> BackendResult<Vec<String>> {
        if bucket.is_empty() || bucket.contains(['/', '\\', '.']) {
            return Err(BackendError::validation("bucket", "Invalid bucket name"));
        }

        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir).await?;

        let mut urls = Vec::with_capacity(buffers.len());
        for buffer in buffers {
            let file_name = format!("{}.{}", Uuid::new_v4(), sniff_extension(&buffer));
            tokio::fs::write(dir.join(&file_name), &buffer).await?;
            urls.push(format!("{}/{}/{}", self.base_url, bucket, file_name));
        }

        tracing::debug!("Stored {} image(s) in bucket {}", urls.len(), bucket);
        Ok(urls)
    }
}

/// File extension from the leading magic bytes
fn sniff_extension(buffer: &[u8]) -> &'static str {
    match buffer {
        [0xFF, 0xD8, 0xFF, ..] => "jpg",
        [0x89, b'P', b'N', b'G', ..] => "png",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "webp",
        _ => "bin",
    }
}
