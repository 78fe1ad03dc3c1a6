//! The in-memory inventory collection and its on-disk mirror.
//!
//! [`InventoryRepository`] owns an ordered `Vec` of records (insertion order,
//! append on create) and a [`Persistence`] port. Every mutation rewrites the
//! whole collection through the port before returning; if that write fails
//! the in-memory state is rolled back so memory and disk never disagree.

use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::models::{InventoryRecord, PhotoRef, RecordId};
use crate::persistence::Persistence;

pub struct InventoryRepository {
    records: Vec<InventoryRecord>,
    persistence: Box<dyn Persistence>,
}

impl InventoryRepository {
    /// Load the persisted collection.
    ///
    /// Never fails: an unreadable or malformed file is logged and the
    /// repository starts with an empty collection.
    pub fn load(persistence: impl Persistence + 'static) -> Self {
        let records = match persistence.load() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Failed to load inventory, starting with an empty collection");
                Vec::new()
            }
        };

        info!(count = records.len(), "Inventory repository loaded");

        Self {
            records,
            persistence: Box::new(persistence),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Register a new record and persist it.
    pub fn create(
        &mut self,
        name: &str,
        description: Option<&str>,
        photo_reference: Option<PhotoRef>,
    ) -> Result<InventoryRecord> {
        if name.trim().is_empty() {
            return Err(StoreError::Validation("name is required".to_string()));
        }

        let record = InventoryRecord {
            id: self.fresh_id(),
            name: name.to_string(),
            description: non_empty(description).map(str::to_string),
            photo_reference,
        };

        let snapshot = self.records.clone();
        self.records.push(record.clone());
        self.commit(snapshot)?;

        info!(id = %record.id, name = %record.name, "Created inventory record");
        Ok(record)
    }

    pub fn get(&self, id: &RecordId) -> Result<&InventoryRecord> {
        self.records
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::RecordNotFound(id.clone()))
    }

    /// All records in insertion order.
    pub fn list(&self) -> &[InventoryRecord] {
        &self.records
    }

    /// Partial update: only fields that are present and non-empty overwrite
    /// the stored value.
    pub fn update(
        &mut self,
        id: &RecordId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<InventoryRecord> {
        let idx = self.position(id)?;
        let snapshot = self.records.clone();

        let record = &mut self.records[idx];
        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            record.name = name.to_string();
        }
        if let Some(description) = non_empty(description) {
            record.description = Some(description.to_string());
        }
        let updated = record.clone();

        self.commit(snapshot)?;
        info!(id = %id, "Updated inventory record");
        Ok(updated)
    }

    pub fn set_photo_reference(
        &mut self,
        id: &RecordId,
        reference: Option<PhotoRef>,
    ) -> Result<InventoryRecord> {
        let idx = self.position(id)?;
        let snapshot = self.records.clone();

        self.records[idx].photo_reference = reference;
        let updated = self.records[idx].clone();

        self.commit(snapshot)?;
        info!(id = %id, has_photo = updated.has_photo(), "Set photo reference");
        Ok(updated)
    }

    pub fn delete(&mut self, id: &RecordId) -> Result<InventoryRecord> {
        let idx = self.position(id)?;
        let snapshot = self.records.clone();

        let removed = self.records.remove(idx);

        self.commit(snapshot)?;
        info!(id = %id, "Deleted inventory record");
        Ok(removed)
    }

    fn position(&self, id: &RecordId) -> Result<usize> {
        self.records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::RecordNotFound(id.clone()))
    }

    // ids loaded from disk may come from anywhere, so re-draw on a clash
    fn fresh_id(&self) -> RecordId {
        loop {
            let id = RecordId::generate();
            if !self.records.iter().any(|r| r.id == id) {
                return id;
            }
        }
    }

    // Synchronous on purpose: the caller holds the repository lock for the
    // whole mutate-then-persist step, and the file is one small JSON array.
    fn commit(&mut self, snapshot: Vec<InventoryRecord>) -> Result<()> {
        if let Err(e) = self.persistence.save(&self.records) {
            warn!(error = %e, "Failed to persist inventory, rolling back");
            self.records = snapshot;
            return Err(e);
        }
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
