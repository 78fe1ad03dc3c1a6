//! Test doubles for code built on top of the store.
//!
//! Enabled for this crate's own tests and, for dependents, through the
//! `test-util` feature.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::models::InventoryRecord;
use crate::persistence::Persistence;

/// In-memory persistence whose saves can be switched to fail.
///
/// Clones share the switch, so a test keeps one clone and hands the other to
/// the repository.
#[derive(Debug, Clone, Default)]
pub struct FlakyPersistence {
    failing: Arc<AtomicBool>,
}

impl FlakyPersistence {
    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Persistence for FlakyPersistence {
    fn load(&self) -> Result<Vec<InventoryRecord>> {
        Ok(Vec::new())
    }

    fn save(&self, _records: &[InventoryRecord]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("disk full").into());
        }
        Ok(())
    }
}
