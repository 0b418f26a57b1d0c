//! Product image hosting.
//!
//! Uploads arrive as temp files written by the multipart handlers. Whatever happens
//! to an upload, its temp file is removed; if any file in a batch fails, the images
//! already stored for that batch are destroyed again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::{fs, sync::Mutex};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::ProductImage,
};

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, path: &Path) -> AppResult<ProductImage>;
    async fn destroy(&self, storage_id: &str) -> AppResult<()>;
}

/// Stores images under a directory served statically at `base_url`.
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
    async fn upload(&self, path: &Path) -> AppResult<ProductImage> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_ascii_lowercase();
        let storage_id = format!("{}.{ext}", Uuid::new_v4());

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Upstream(format!("image store: {e}")))?;
        fs::copy(path, self.root.join(&storage_id))
            .await
            .map_err(|e| AppError::Upstream(format!("image store: {e}")))?;

        Ok(ProductImage {
            url: format!("{}/{}", self.base_url, storage_id),
            storage_id,
        })
    }

    async fn destroy(&self, storage_id: &str) -> AppResult<()> {
        // Ids are generated by `upload`; refuse anything that could escape the root.
        if storage_id.contains(['/', '\\']) || storage_id.contains("..") {
            return Err(AppError::validation(format!("invalid storage id '{storage_id}'")));
        }
        match fs::remove_file(self.root.join(storage_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Upstream(format!("image store: {e}"))),
        }
    }
}

/// In-memory store for tests. Optionally fails every upload after the first `n`.
#[derive(Clone, Default)]
pub struct MemoryImageStore {
    stored: Arc<Mutex<Vec<String>>>,
    destroyed: Arc<Mutex<Vec<String>>>,
    fail_after: Option<usize>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    pub async fn stored(&self) -> Vec<String> {
        self.stored.lock().await.clone()
    }

    pub async fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().await.clone()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(&self, path: &Path) -> AppResult<ProductImage> {
        let mut stored = self.stored.lock().await;
        if self.fail_after.is_some_and(|n| stored.len() >= n) {
            return Err(AppError::Upstream(format!("upload rejected: {}", path.display())));
        }
        let storage_id = format!("mem-{}", Uuid::new_v4());
        stored.push(storage_id.clone());
        Ok(ProductImage {
            url: format!("memory://{storage_id}"),
            storage_id,
        })
    }

    async fn destroy(&self, storage_id: &str) -> AppResult<()> {
        self.stored.lock().await.retain(|s| s != storage_id);
        self.destroyed.lock().await.push(storage_id.to_string());
        Ok(())
    }
}

/// Write an uploaded part to the temp directory.
pub async fn stash_upload(dir: &Path, file_name: &str, bytes: &[u8]) -> AppResult<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin");
    let path = dir.join(format!("{}.{ext}", Uuid::new_v4()));
    fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(path)
}

/// Remove temp files, ignoring ones that are already gone.
pub async fn discard(files: &[PathBuf]) {
    for file in files {
        if let Err(err) = fs::remove_file(file).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %err, path = %file.display(), "temp file cleanup failed");
            }
        }
    }
}

/// Destroy stored images, logging failures.
pub async fn destroy_all(store: &dyn ImageStore, images: &[ProductImage]) {
    for image in images {
        if let Err(err) = store.destroy(&image.storage_id).await {
            tracing::warn!(error = %err, storage_id = %image.storage_id, "image destroy failed");
        }
    }
}

/// Upload a batch of temp files. All temp files are removed; on failure the
/// images stored so far are destroyed and the error is returned.
pub async fn upload_all(store: &dyn ImageStore, files: &[PathBuf]) -> AppResult<Vec<ProductImage>> {
    let mut uploaded = Vec::with_capacity(files.len());
    let mut failure = None;

    for file in files {
        if failure.is_none() {
            match store.upload(file).await {
                Ok(image) => uploaded.push(image),
                Err(err) => failure = Some(err),
            }
        }
    }
    discard(files).await;

    match failure {
        None => Ok(uploaded),
        Some(err) => {
            tracing::warn!(error = %err, stored = uploaded.len(), "image upload failed, rolling back");
            destroy_all(store, &uploaded).await;
            Err(match err {
                AppError::Upstream(msg) => AppError::Upstream(msg),
                other => AppError::Upstream(other.to_string()),
            })
        }
    }
}
