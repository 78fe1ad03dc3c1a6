//! # inventory-store
//!
//! On-disk storage for the inventory service.
//!
//! The crate owns two pieces of state:
//! - the **inventory collection**, held in memory by an
//!   [`InventoryRepository`] and mirrored to a single JSON file after every
//!   mutation through a [`Persistence`] port;
//! - the **photo directory**, managed by a [`PhotoStore`] that hands out
//!   opaque [`PhotoRef`] tokens for the files it writes.
//!
//! Neither type does any locking of its own. Callers that share a repository
//! across tasks must wrap it in a single mutex so that mutate-then-persist
//! runs as one critical section.

pub mod models;
pub mod persistence;
pub mod photos;
pub mod repository;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

mod error;

pub use error::{Result, StoreError};
pub use models::*;
pub use persistence::{JsonFile, Persistence};
pub use photos::PhotoStore;
pub use repository::InventoryRepository;
