//! Error handling.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Error {
    #[error("no eeprom entry for serial {serial:?} (checksum: ${checksum:04X})")]
    NotFound { serial: String, checksum: u16 },
    #[error("eeprom type `{index}` is out of range (database has {len} entries)")]
    OutOfRange { index: usize, len: usize },
    #[error("eeprom data size mismatch (expected {expected} bytes, found: {found})")]
    SizeMismatch { expected: usize, found: usize },
}

impl Error {
    pub fn not_found(serial: &[u8], checksum: u16) -> Self {
        Self::NotFound {
            serial: String::from_utf8_lossy(serial).into_owned(),
            checksum,
        }
    }
}
