//! Run outcome serialization using `MessagePack`.
//!
//! A [`RunOutcome`] holds the final fact store (templates included), the
//! emitted output, and the firing log. Snapshots are written with named
//! fields so they survive field reordering.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use salience_engine::RunOutcome;
use salience_foundation::{Error, ErrorKind, Result};

/// Serializes a run outcome to `MessagePack` bytes.
///
/// # Errors
/// Returns `SerializationError` if encoding fails.
pub fn to_bytes(outcome: &RunOutcome) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(outcome)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))
}

/// Deserializes a run outcome from `MessagePack` bytes.
///
/// # Errors
/// Returns `SerializationError` if the bytes are not a valid snapshot.
pub fn from_bytes(bytes: &[u8]) -> Result<RunOutcome> {
    rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))
}

fn io_error(action: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::new(ErrorKind::IoError(format!(
        "failed to {action} '{}': {e}",
        path.display()
    )))
}

/// Saves a run outcome to a file, replacing any existing content.
///
/// # Errors
/// Returns `IoError` if the file cannot be written, or
/// `SerializationError` if encoding fails.
pub fn save_to_file<P: AsRef<Path>>(outcome: &RunOutcome, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(outcome)?;

    let file = File::create(path).map_err(|e| io_error("create", path, &e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .map_err(|e| io_error("write to", path, &e))?;
    writer.flush().map_err(|e| io_error("flush", path, &e))?;

    log::debug!("saved snapshot of {} fact(s) to {}", outcome.facts.len(), path.display());
    Ok(())
}

/// Loads a run outcome from a file.
///
/// # Errors
/// Returns `IoError` if the file cannot be read, or `SerializationError`
/// if its content is not a valid snapshot.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<RunOutcome> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_error("open", path, &e))?;

    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| io_error("read", path, &e))?;

    from_bytes(&bytes)
}
