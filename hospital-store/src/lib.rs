pub mod error;
pub mod sqlite_store;

pub use error::{Result, StoreError};
pub use sqlite_store::{SqliteStore, StoreCounts, TenantSeed};
