//! Battery save files.
//!
//! A save file starts with the 8-byte magic `SEEPROM\x1a` and an ASCII format version, followed
//! by a deflate stream of the `bincode` encoded cell contents.

use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{create_dir_all, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

const SAVE_FILE_MAGIC: [u8; 8] = *b"SEEPROM\x1a";
const SAVE_VERSION: u8 = b'1';
const HEADER_LEN: usize = SAVE_FILE_MAGIC.len() + 1;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[must_use]
pub enum Error {
    #[error("not an eeprom save: {0}")]
    InvalidHeader(String),
    #[error("eeprom save is corrupt: {0}")]
    Corrupt(#[from] bincode::Error),
    #[error("eeprom save path {0:?} has no parent directory")]
    InvalidPath(PathBuf),
    #[error("{context}: {source}")]
    Io { source: io::Error, context: String },
    /// The save was read but doesn't fit the attached chip.
    #[error("eeprom save does not match the attached chip: {0}")]
    Chip(#[from] crate::error::Error),
}

impl Error {
    pub fn io(source: io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }
}

pub(crate) fn write_header(f: &mut impl Write) -> io::Result<()> {
    let mut header = [0u8; HEADER_LEN];
    header[..SAVE_FILE_MAGIC.len()].copy_from_slice(&SAVE_FILE_MAGIC);
    header[SAVE_FILE_MAGIC.len()] = SAVE_VERSION;
    f.write_all(&header)
}

pub(crate) fn validate_header(f: &mut impl Read) -> Result<()> {
    let mut header = [0u8; HEADER_LEN];
    f.read_exact(&mut header)
        .map_err(|_| Error::InvalidHeader(String::from("file is shorter than the header")))?;
    let (magic, version) = header.split_at(SAVE_FILE_MAGIC.len());
    if magic != SAVE_FILE_MAGIC {
        return Err(Error::InvalidHeader(format!("unrecognized magic {magic:02X?}")));
    }
    if version != [SAVE_VERSION] {
        return Err(Error::InvalidHeader(format!(
            "unsupported format version {:?}",
            String::from_utf8_lossy(version)
        )));
    }
    Ok(())
}

fn writer(path: &Path) -> Result<impl Write> {
    let directory = path
        .parent()
        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
    if !directory.as_os_str().is_empty() && !directory.exists() {
        create_dir_all(directory)
            .map_err(|err| Error::io(err, format!("failed to create directory {directory:?}")))?;
    }
    File::create(path)
        .map(BufWriter::new)
        .map_err(|err| Error::io(err, format!("failed to create eeprom save {path:?}")))
}

fn reader(path: &Path) -> Result<impl Read> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| Error::io(err, format!("failed to open eeprom save {path:?}")))
}

/// Serialize `value` into a save file at `path`, creating parent directories as needed.
///
/// # Errors
///
/// If the value can not be serialized or the file can not be written, then an error is returned.
pub fn save<T>(path: impl AsRef<Path>, value: &T) -> Result<()>
where
    T: ?Sized + Serialize,
{
    let path = path.as_ref();
    let data = bincode::serialize(value)?;
    let mut writer = writer(path)?;
    write_header(&mut writer)
        .map_err(|err| Error::io(err, format!("failed to write header to {path:?}")))?;
    let mut encoder = DeflateEncoder::new(&mut writer, Compression::default());
    encoder
        .write_all(&data)
        .and_then(|()| encoder.finish().map(drop))
        .map_err(|err| Error::io(err, format!("failed to compress eeprom data to {path:?}")))?;
    writer
        .flush()
        .map_err(|err| Error::io(err, format!("failed to flush {path:?}")))
}

/// Deserialize a value from the save file at `path`.
///
/// # Errors
///
/// If the file can not be read, has an invalid header, or does not decode, then an error is
/// returned.
pub fn load<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let mut reader = reader(path)?;
    validate_header(&mut reader)?;
    let mut data = vec![];
    DeflateDecoder::new(reader)
        .read_to_end(&mut data)
        .map_err(|err| Error::io(err, format!("failed to decompress eeprom data from {path:?}")))?;
    Ok(bincode::deserialize(&data)?)
}
