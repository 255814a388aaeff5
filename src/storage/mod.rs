//! Durable key-value backends for persisted client state.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::errors::Error;

/// Minimal string key-value storage, the equivalent of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Writes every entry as one batch; readers observe all of them or none.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), Error>;

    fn remove_many(&self, keys: &[&str]) -> Result<(), Error>;
}
