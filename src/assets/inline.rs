use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use super::{AssetRef, AssetStore, StoreError};

/// Inline store: the ref *is* the asset, a self-describing data URI. No
/// disk I/O, nothing to delete.
pub struct InlineStore;

/// `data:{mime};base64,{payload}`.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Split a data URI back into `(mime, bytes)`. Returns `None` for anything
/// that is not a base64 data URI.
pub fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let bytes = BASE64.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}

#[async_trait]
impl AssetStore for InlineStore {
    async fn write(
        &self,
        bytes: Bytes,
        mime: &str,
        owner_id: Uuid,
        _purpose: &str,
    ) -> Result<AssetRef, StoreError> {
        debug!(%owner_id, size = bytes.len(), "asset inlined");
        Ok(AssetRef::new(encode_data_uri(mime, &bytes)))
    }

    async fn read(&self, asset: &AssetRef) -> Result<(Bytes, String), StoreError> {
        let (mime, bytes) = parse_data_uri(asset.as_str())
            .ok_or_else(|| StoreError::BadRef(truncate_for_log(asset.as_str())))?;
        Ok((Bytes::from(bytes), mime))
    }

    fn externalize(&self, asset: &AssetRef) -> String {
        asset.as_str().to_string()
    }

    async fn delete(&self, _asset: &AssetRef) {}
}

// Data URIs can be megabytes; keep error messages readable.
fn truncate_for_log(s: &str) -> String {
    s.chars().take(64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_roundtrip() {
        let store = InlineStore;
        let asset = store
            .write(Bytes::from_static(b"pixels"), "image/png", Uuid::new_v4(), "original")
            .await
            .expect("write");
        assert!(asset.as_str().starts_with("data:image/png;base64,"));

        let (bytes, mime) = store.read(&asset).await.expect("read");
        assert_eq!(&bytes[..], b"pixels");
        assert_eq!(mime, "image/png");
    }

    #[tokio::test]
    async fn externalize_is_the_ref_itself() {
        let store = InlineStore;
        let asset = AssetRef::new(encode_data_uri("image/jpeg", b"x"));
        assert_eq!(store.externalize(&asset), asset.as_str());
    }

    #[tokio::test]
    async fn malformed_refs_error() {
        let store = InlineStore;
        for bad in ["/uploads/a.png", "data:image/png;base64,@@@", "data:image/png,raw"] {
            let err = store.read(&AssetRef::new(bad)).await.unwrap_err();
            assert!(matches!(err, StoreError::BadRef(_)), "ref {bad} passed");
        }
    }

    #[test]
    fn data_uri_helpers_roundtrip() {
        let uri = encode_data_uri("image/webp", b"\x00\xff\x10");
        let (mime, bytes) = parse_data_uri(&uri).expect("parse");
        assert_eq!(mime, "image/webp");
        assert_eq!(bytes, vec![0x00, 0xff, 0x10]);
    }
}
