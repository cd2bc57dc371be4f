use crate::fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[must_use]
pub enum ResetKind {
    Soft,
    Hard,
}

pub trait Reset {
    fn reset(&mut self, _kind: ResetKind) {}
}

/// Battery-backed storage that outlives the emulation session.
pub trait Sram {
    /// Persist storage next to `path`.
    ///
    /// # Errors
    ///
    /// If the file can not be created or encoded, then an error is returned.
    fn save(&self, path: impl AsRef<Path>) -> fs::Result<()>;

    /// Replace storage with the contents previously saved next to `path`.
    ///
    /// # Errors
    ///
    /// If the file is missing, has an invalid header, or does not fit the storage, then an error
    /// is returned.
    fn load(&mut self, path: impl AsRef<Path>) -> fs::Result<()>;
}
