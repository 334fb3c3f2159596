//! Step state storage and the persistence seam behind it.
//!
//! [`StepStateStore`] owns the mutable per-step state of a cycle and writes
//! every change through to a [`KeyValueStore`]. Two stores ship with the
//! crate: the SQLite [`Database`](crate::db::Database) and the in-memory
//! [`MemoryStore`] used by tests.

pub mod memory;
pub mod snapshot;
pub mod state_store;

pub use memory::MemoryStore;
pub use snapshot::{keys, read_snapshot, write_snapshot};
pub use state_store::StepStateStore;

use crate::error::Result;

/// String key/value persistence addressed by the fixed keys in [`keys`].
pub trait KeyValueStore: Send {
    /// Reads a value; `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes or replaces a value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Deletes a value. Deleting a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}
