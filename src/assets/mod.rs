use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::{AppConfig, AssetBackend};

mod disk;
pub mod inline;

pub use disk::DiskStore;
pub use inline::InlineStore;

/// Opaque handle to a stored image. Only the store that issued it knows how
/// to resolve it; the rest of the system just moves it around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("asset not found")]
    NotFound,

    #[error("malformed asset ref: {0}")]
    BadRef(String),

    #[error("asset io: {0}")]
    Io(#[from] std::io::Error),
}

/// Persists raw image blobs and resolves refs back to bytes.
///
/// One implementation is chosen at startup from config and injected as a
/// trait object; path-backed and inline refs are never mixed within a
/// deployment.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store a blob and return the ref to persist on the project. Generated
    /// identifiers embed the owner id, a purpose tag, and a random component
    /// so concurrent writes never collide across users.
    async fn write(
        &self,
        bytes: Bytes,
        mime: &str,
        owner_id: Uuid,
        purpose: &str,
    ) -> Result<AssetRef, StoreError>;

    /// Resolve a ref back to `(bytes, mime)`.
    async fn read(&self, asset: &AssetRef) -> Result<(Bytes, String), StoreError>;

    /// The externally consumable form of a ref: a full URL for path-backed
    /// stores, the ref itself for inline stores.
    fn externalize(&self, asset: &AssetRef) -> String;

    /// Best-effort removal. A missing backing file is logged and swallowed;
    /// it must never abort the operation that owns the asset.
    async fn delete(&self, asset: &AssetRef);
}

pub fn from_config(config: &AppConfig) -> Arc<dyn AssetStore> {
    match config.asset_backend {
        AssetBackend::Disk => Arc::new(DiskStore::new(
            config.upload_dir.clone(),
            config.base_url.clone(),
        )),
        AssetBackend::Inline => Arc::new(InlineStore),
    }
}
