use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AssetRef, AssetStore, StoreError};

/// Route prefix under which disk-backed assets are served statically.
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// Path-backed store: blobs live under the upload directory, refs are
/// `/uploads/{filename}` paths, and externalization prefixes the configured
/// base URL.
pub struct DiskStore {
    root: PathBuf,
    base_url: String,
}

impl DiskStore {
    pub fn new(root: PathBuf, base_url: String) -> Self {
        Self { root, base_url }
    }

    /// Resolve a ref to a path inside the upload directory. Refs carrying
    /// separators or parent components are rejected rather than resolved.
    fn path_for(&self, asset: &AssetRef) -> Result<PathBuf, StoreError> {
        let filename = asset
            .as_str()
            .strip_prefix(UPLOADS_PREFIX)
            .ok_or_else(|| StoreError::BadRef(asset.as_str().to_string()))?;
        if filename.is_empty() || filename.contains('/') || filename.contains("..") {
            return Err(StoreError::BadRef(asset.as_str().to_string()));
        }
        Ok(self.root.join(filename))
    }
}

#[async_trait]
impl AssetStore for DiskStore {
    async fn write(
        &self,
        bytes: Bytes,
        mime: &str,
        owner_id: Uuid,
        purpose: &str,
    ) -> Result<AssetRef, StoreError> {
        let ext = ext_from_mime(mime).unwrap_or("jpg");
        let filename = format!("{}_{}_{}.{}", owner_id, purpose, Uuid::new_v4(), ext);

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&filename), &bytes).await?;

        debug!(%filename, size = bytes.len(), "asset written");
        Ok(AssetRef::new(format!("{UPLOADS_PREFIX}{filename}")))
    }

    async fn read(&self, asset: &AssetRef) -> Result<(Bytes, String), StoreError> {
        let path = self.path_for(asset)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound,
            _ => StoreError::Io(e),
        })?;
        Ok((Bytes::from(bytes), mime_from_path(&path).to_string()))
    }

    fn externalize(&self, asset: &AssetRef) -> String {
        if asset.as_str().starts_with("http") {
            asset.as_str().to_string()
        } else {
            format!("{}{}", self.base_url, asset.as_str())
        }
    }

    async fn delete(&self, asset: &AssetRef) {
        let path = match self.path_for(asset) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, asset = asset.as_str(), "skipping delete of unresolvable asset");
                return;
            }
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %e, asset = asset.as_str(), "asset delete failed; continuing");
            }
        }
    }
}

fn ext_from_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn mime_from_path(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
