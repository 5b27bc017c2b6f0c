use crate::input::Input;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Filename prefix for persisted crashing inputs.
const CRASH_FILE_PREFIX: &str = "crash_";

/// Errors that can arise while persisting a crashing input.
///
/// Archive failures are recoverable per iteration: the worker logs them and
/// moves on, they never terminate the campaign.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive directory could not be created or written.
    #[error("crash archive I/O error: {0}")]
    Io(String),
}

/// Persists distinct crashing inputs, deduplicated by content hash.
///
/// Each record is an exact copy of the crashing input stored as
/// `crash_<hex-sha256>` in the output directory, so a record's name always
/// encodes the digest of its own contents and recording is idempotent.
///
/// Safe for concurrent workers: distinct digests land in distinct files, and
/// two workers racing on the same digest write identical bytes, so
/// last-writer-wins is harmless.
#[derive(Debug)]
pub struct CrashArchive {
    directory: PathBuf,
}

impl CrashArchive {
    /// Opens the archive at `directory`, creating it if missing.
    pub fn new(directory: PathBuf) -> Result<Self, ArchiveError> {
        if !directory.exists() {
            fs::create_dir_all(&directory).map_err(|e| {
                ArchiveError::Io(format!(
                    "failed to create crash directory {directory:?}: {e}"
                ))
            })?;
        } else if !directory.is_dir() {
            return Err(ArchiveError::Io(format!(
                "crash path {directory:?} exists but is not a directory"
            )));
        }
        Ok(Self { directory })
    }

    /// Persists `candidate` unless a record with the same content digest
    /// already exists. Returns whether a new record was written.
    pub fn record<I: Input>(&self, candidate: &I) -> Result<bool, ArchiveError> {
        let digest = hex_sha256(candidate.as_bytes());
        let path = self.directory.join(format!("{CRASH_FILE_PREFIX}{digest}"));
        if path.exists() {
            return Ok(false);
        }
        fs::write(&path, candidate.as_bytes())
            .map_err(|e| ArchiveError::Io(format!("failed to write {path:?}: {e}")))?;
        Ok(true)
    }

    /// Directory this archive writes into.
    pub fn directory(&self) -> &std::path::Path {
        &self.directory
    }
}

/// Hex-encoded SHA-256 digest of `bytes`.
pub fn hex_sha256(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
