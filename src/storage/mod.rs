//! Key-value persistence for serialized collections.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Key for the roster.
pub const KEY_STAFF: &str = "bo_staff";
/// Key for the presence set.
pub const KEY_CHECKS: &str = "bo_checks";
/// Key for rotation history.
pub const KEY_HISTORY: &str = "bo_history";
/// Key for the most recently generated rotation.
pub const KEY_LAST_ORDER: &str = "bo_lastOrder";

/// String-keyed blob storage.
pub trait KeyValueStore {
    /// Read a value; `None` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Missing keys are not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}
