//! # authgate-db-memory
//!
//! In-memory user directory for authgate, backed by [`dashmap`].
//!
//! Every [`UserStorage`] operation locks only the shard holding the affected
//! user, so refresh-record mutations are atomic per user while unrelated
//! users proceed in parallel. Data does not survive a restart.
//!
//! ```ignore
//! use authgate_db_memory::create_user_storage;
//!
//! let store = create_user_storage();
//! let accounts = AccountService::new(config, store);
//! ```

use std::sync::Arc;

use authgate_auth::UserStorage;

mod storage;

pub use storage::InMemoryUserStorage;

/// Creates an empty in-memory directory as a shared trait object.
#[must_use]
pub fn create_user_storage() -> Arc<dyn UserStorage> {
    Arc::new(InMemoryUserStorage::new())
}
