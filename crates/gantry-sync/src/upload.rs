//! Content-addressed asset upload
//!
//! The prepare → create → commit protocol for syncing one local binary file
//! to a named remote asset slot. A file whose checksum already matches the
//! remote copy is never re-uploaded; a changed file replaces the stale remote
//! asset with exactly one delete followed by one create/commit cycle.

use std::path::Path;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use gantry_asc::UploadReservation;

use crate::error::{Result, SyncError};

/// A local binary asset, read and hashed once per upload attempt
#[derive(Debug, Clone)]
pub struct AssetFile {
    /// Base file name, the slot the asset is synced into
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Lowercase hex SHA-256 of the content; the asset's identity
    pub checksum: String,
    bytes: Vec<u8>,
}

impl AssetFile {
    /// Read and hash a file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| SyncError::AssetIo {
            path: path.to_path_buf(),
            source: e,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let checksum = format!("{:x}", Sha256::digest(&bytes));

        Ok(Self {
            name,
            size: bytes.len() as u64,
            checksum,
            bytes,
        })
    }

    /// The byte range one upload operation covers
    pub fn part(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        let end = offset.checked_add(length).filter(|end| *end <= self.size);
        match end {
            Some(end) => Ok(self.bytes[offset as usize..end as usize].to_vec()),
            None => Err(SyncError::PartOutOfRange {
                offset,
                length,
                size: self.size,
            }),
        }
    }
}

/// The remote side of the upload protocol, one implementation per asset kind
#[async_trait]
pub trait AssetUploader: Send + Sync {
    /// Decide whether an upload is needed for this name/checksum pair.
    ///
    /// Returns `false` when a remote asset with this name already carries the
    /// same checksum (upload skipped). An existing asset with a different
    /// checksum is deleted here before returning `true`.
    async fn prepare(&self, name: &str, checksum: &str) -> Result<bool>;

    /// Allocate a remote slot, returning its id and upload instructions
    async fn create(&self, name: &str, size: u64) -> Result<UploadReservation>;

    /// Transfer one part per the instruction
    async fn upload_part(&self, operation: &gantry_asc::UploadOperation, body: Vec<u8>)
        -> Result<()>;

    /// Finalize the upload so the remote side can verify integrity
    async fn commit(&self, id: &str, checksum: &str) -> Result<()>;
}

/// Result of one upload pipeline invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Remote copy already matched the local checksum; nothing transferred
    Skipped,
    /// The file was uploaded into a new remote slot
    Uploaded { id: String },
}

/// Sync one local file to its remote asset slot.
pub async fn upload(path: &Path, uploader: &dyn AssetUploader) -> Result<UploadOutcome> {
    let asset = AssetFile::load(path)?;

    if !uploader.prepare(&asset.name, &asset.checksum).await? {
        debug!(name = %asset.name, "remote asset unchanged, skipping upload");
        return Ok(UploadOutcome::Skipped);
    }

    let reservation = uploader.create(&asset.name, asset.size).await?;

    for operation in &reservation.operations {
        let offset = operation.offset.unwrap_or(0);
        let length = operation.length.unwrap_or(asset.size);
        let body = asset.part(offset, length)?;
        uploader.upload_part(operation, body).await?;
    }

    uploader.commit(&reservation.id, &asset.checksum).await?;

    info!(
        name = %asset.name,
        bytes = asset.size,
        parts = reservation.operations.len(),
        "uploaded asset"
    );
    Ok(UploadOutcome::Uploaded {
        id: reservation.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_asc::UploadOperation;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory remote side: name -> stored checksum.
    struct FakeUploader {
        existing: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
        parts: usize,
    }

    impl FakeUploader {
        fn new(existing: &[(&str, &str)]) -> Self {
            Self {
                existing: existing
                    .iter()
                    .map(|(n, c)| (n.to_string(), c.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
                parts: 1,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AssetUploader for FakeUploader {
        async fn prepare(&self, name: &str, checksum: &str) -> Result<bool> {
            match self.existing.get(name) {
                Some(stored) if stored == checksum => Ok(false),
                Some(_) => {
                    self.calls.lock().unwrap().push(format!("delete {name}"));
                    Ok(true)
                }
                None => Ok(true),
            }
        }

        async fn create(&self, name: &str, size: u64) -> Result<UploadReservation> {
            self.calls.lock().unwrap().push(format!("create {name}"));
            let chunk = size / self.parts as u64;
            let operations = (0..self.parts)
                .map(|i| {
                    let offset = i as u64 * chunk;
                    let length = if i == self.parts - 1 {
                        size - offset
                    } else {
                        chunk
                    };
                    serde_json::from_value::<UploadOperation>(serde_json::json!({
                        "method": "PUT",
                        "url": format!("https://upload.example/{i}"),
                        "offset": offset,
                        "length": length,
                    }))
                    .unwrap()
                })
                .collect();
            Ok(UploadReservation {
                id: "slot-1".to_string(),
                operations,
            })
        }

        async fn upload_part(&self, operation: &UploadOperation, body: Vec<u8>) -> Result<()> {
            self.calls.lock().unwrap().push(format!(
                "part {} {}",
                operation.offset.unwrap_or(0),
                body.len()
            ));
            Ok(())
        }

        async fn commit(&self, id: &str, checksum: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("commit {id} {checksum}"));
            Ok(())
        }
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_unchanged_file_skips_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "one.png", b"pixels");
        let checksum = AssetFile::load(&path).unwrap().checksum;

        let uploader = FakeUploader::new(&[("one.png", checksum.as_str())]);
        let outcome = upload(&path, &uploader).await.unwrap();

        assert_eq!(outcome, UploadOutcome::Skipped);
        // zero delete, create, part, or commit calls
        assert!(uploader.calls().is_empty());
    }

    #[tokio::test]
    async fn test_changed_file_deletes_then_recreates_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "one.png", b"new pixels");

        let uploader = FakeUploader::new(&[("one.png", "stale-checksum")]);
        let outcome = upload(&path, &uploader).await.unwrap();

        assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
        let calls = uploader.calls();
        assert_eq!(calls[0], "delete one.png");
        assert_eq!(calls[1], "create one.png");
        assert_eq!(calls.iter().filter(|c| c.starts_with("delete")).count(), 1);
        assert_eq!(calls.iter().filter(|c| c.starts_with("commit")).count(), 1);
    }

    #[tokio::test]
    async fn test_new_file_uploads_without_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "two.png", b"fresh");

        let uploader = FakeUploader::new(&[]);
        let outcome = upload(&path, &uploader).await.unwrap();

        assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
        let calls = uploader.calls();
        assert!(calls.iter().all(|c| !c.starts_with("delete")));
        assert_eq!(calls.last().unwrap(), &format!(
            "commit slot-1 {}",
            AssetFile::load(&path).unwrap().checksum
        ));
    }

    #[tokio::test]
    async fn test_multi_part_upload_covers_file_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "big.mov", &[7u8; 100]);

        let mut uploader = FakeUploader::new(&[]);
        uploader.parts = 3;
        upload(&path, &uploader).await.unwrap();

        let parts: Vec<_> = uploader
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("part"))
            .collect();
        assert_eq!(parts, vec!["part 0 33", "part 33 33", "part 66 34"]);
    }

    #[tokio::test]
    async fn test_part_out_of_range_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "small.png", b"abc");
        let asset = AssetFile::load(&path).unwrap();

        assert!(asset.part(0, 3).is_ok());
        assert!(matches!(
            asset.part(2, 5),
            Err(SyncError::PartOutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_asset_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = FakeUploader::new(&[]);
        let err = upload(&dir.path().join("absent.png"), &uploader)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::AssetIo { .. }));
    }
}
