//! Request-handler business logic.
//!
//! [`InventoryService`] validates inputs, coordinates the repository with the
//! photo store and decides the outcome of each operation. The repository sits
//! behind one mutex: every operation that mutates it holds the lock from its
//! first read to its final persist, so concurrent requests never interleave
//! their writes.

use inventory_store::{
    InventoryRecord, InventoryRepository, PhotoStore, PhotoUpload, RecordId, StoreError,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::ServerError;

/// Fields accepted by a registration request.
#[derive(Debug, Default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo: Option<PhotoUpload>,
}

/// Fields accepted by an update request. Absent or empty fields are left alone.
#[derive(Debug, Default, serde::Deserialize)]
pub struct UpdateRequest {
    #[serde(default, alias = "inventory_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Photo bytes ready to be served.
#[derive(Debug)]
pub struct Photo {
    pub data: Vec<u8>,
    pub content_type: &'static str,
}

pub struct InventoryService {
    repo: Mutex<InventoryRepository>,
    photos: PhotoStore,
}

impl InventoryService {
    pub fn new(repo: InventoryRepository, photos: PhotoStore) -> Self {
        Self {
            repo: Mutex::new(repo),
            photos,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<InventoryRecord, ServerError> {
        let name = req.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(ServerError::Validation("inventory_name is required".to_string()));
        }

        let mut repo = self.repo.lock().await;

        let photo_ref = match &req.photo {
            Some(upload) => Some(self.photos.save(upload).await?),
            None => None,
        };

        match repo.create(&name, req.description.as_deref(), photo_ref.clone()) {
            Ok(record) => Ok(record),
            Err(e) => {
                // no orphaned upload on a failed registration
                if let Some(reference) = &photo_ref {
                    if let Err(cleanup) = self.photos.delete(reference).await {
                        warn!(error = %cleanup, reference = %reference, "Failed to remove orphaned photo");
                    }
                }
                Err(e.into())
            }
        }
    }

    pub async fn list(&self) -> Vec<InventoryRecord> {
        self.repo.lock().await.list().to_vec()
    }

    pub async fn get(&self, id: &RecordId) -> Result<InventoryRecord, ServerError> {
        Ok(self.repo.lock().await.get(id)?.clone())
    }

    pub async fn update(
        &self,
        id: &RecordId,
        req: UpdateRequest,
    ) -> Result<InventoryRecord, ServerError> {
        let mut repo = self.repo.lock().await;
        Ok(repo.update(id, req.name.as_deref(), req.description.as_deref())?)
    }

    pub async fn photo(&self, id: &RecordId) -> Result<Photo, ServerError> {
        let reference = {
            let repo = self.repo.lock().await;
            repo.get(id)?.photo_reference.clone()
        };
        let reference = reference
            .ok_or_else(|| ServerError::NotFound(format!("Inventory item {id} has no photo")))?;

        let data = self.photos.read(&reference).await?;
        Ok(Photo {
            data,
            content_type: PhotoStore::content_type(&reference),
        })
    }

    /// Store a new photo for `id` and drop the previous one.
    ///
    /// The old file is removed only after the new one is stored and the
    /// record points at it.
    pub async fn replace_photo(
        &self,
        id: &RecordId,
        upload: PhotoUpload,
    ) -> Result<InventoryRecord, ServerError> {
        let mut repo = self.repo.lock().await;
        let previous = repo.get(id)?.photo_reference.clone();

        let reference = self.photos.save(&upload).await?;

        let record = match repo.set_photo_reference(id, Some(reference.clone())) {
            Ok(record) => record,
            Err(e) => {
                if let Err(cleanup) = self.photos.delete(&reference).await {
                    warn!(error = %cleanup, reference = %reference, "Failed to remove unused photo");
                }
                return Err(e.into());
            }
        };

        if let Some(old) = previous {
            if let Err(e) = self.photos.delete(&old).await {
                warn!(error = %e, reference = %old, "Failed to remove replaced photo");
            }
        }

        info!(id = %id, "Replaced photo");
        Ok(record)
    }

    /// Look a record up by id. With `must_have_photo`, a record without a
    /// photo is reported exactly like an unknown id.
    pub async fn search(
        &self,
        id: &RecordId,
        must_have_photo: bool,
    ) -> Result<InventoryRecord, ServerError> {
        let repo = self.repo.lock().await;
        match repo.get(id) {
            Ok(record) if !must_have_photo || record.has_photo() => Ok(record.clone()),
            _ => Err(ServerError::NotFound(format!("Inventory item {id} not found"))),
        }
    }

    pub async fn delete(&self, id: &RecordId) -> Result<InventoryRecord, ServerError> {
        let mut repo = self.repo.lock().await;

        // photo first; a failure here leaves the record untouched
        let photo_ref = repo.get(id)?.photo_reference.clone();
        if let Some(reference) = &photo_ref {
            match self.photos.delete(reference).await {
                Ok(()) => {}
                Err(StoreError::InvalidReference(_)) => {
                    warn!(id = %id, reference = %reference, "Dropping unresolvable photo reference");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(repo.delete(id)?)
    }
}
