//! In-memory blob storage.
//!
//! Objects are keyed by the same path layout the hosted storage uses:
//! `{kind}/{user_id}/{record_id}/{uuid}.{ext}`.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use uuid::Uuid;

use crate::domain::models::expense::{AttachmentUpload, BlobRef};
use crate::storage::traits::{AttachmentKind, BlobStorage, StorageError};

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an object exists at the given path.
    pub fn contains(&self, storage_path: &str) -> bool {
        self.objects
            .lock()
            .expect("blob lock poisoned")
            .contains_key(storage_path)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().expect("blob lock poisoned").len()
    }
}

impl BlobStorage for MemoryBlobStore {
    fn upload(
        &self,
        user_id: &str,
        kind: AttachmentKind,
        record_id: &str,
        file: &AttachmentUpload,
    ) -> Result<BlobRef, StorageError> {
        let extension = file
            .file_name
            .rsplit('.')
            .next()
            .filter(|ext| !ext.is_empty() && ext.len() < file.file_name.len())
            .unwrap_or("bin");
        let storage_path = format!(
            "{}/{}/{}/{}.{}",
            kind.path_prefix(),
            user_id,
            record_id,
            Uuid::new_v4(),
            extension
        );
        self.objects
            .lock()
            .expect("blob lock poisoned")
            .insert(storage_path.clone(), file.bytes.clone());
        debug!("stored blob at {}", storage_path);
        Ok(BlobRef {
            url: format!("memory://{}", storage_path),
            storage_path,
        })
    }

    fn delete(&self, storage_path: &str) -> Result<(), StorageError> {
        // Deleting a missing object is success by contract.
        self.objects
            .lock()
            .expect("blob lock poisoned")
            .remove(storage_path);
        Ok(())
    }
}
