//! Linux procfs command line source.
//!
//! The kernel stores `argv` as discrete NUL-terminated strings, so this
//! strategy is lossless.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use super::ArgvError;

/// Location of the command line pseudo-file for `pid`.
#[must_use]
pub fn cmdline_path(pid: u32) -> PathBuf {
    PathBuf::from(format!("/proc/{pid}/cmdline"))
}

/// Reads and splits the command line stored at `path`.
pub fn read(path: &Path) -> Result<Vec<OsString>, ArgvError> {
    let blob = fs::read(path).map_err(|source| ArgvError::ReadProcTable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(split_cmdline(&blob))
}

/// Splits a NUL-separated command line blob into tokens.
///
/// Only the terminating NUL is dropped; adjacent NULs inside the blob denote
/// empty arguments and are preserved as empty tokens.
#[must_use]
pub fn split_cmdline(blob: &[u8]) -> Vec<OsString> {
    if blob.is_empty() {
        return Vec::new();
    }
    let body = blob.strip_suffix(&[0]).unwrap_or(blob);
    body.split(|byte| *byte == 0)
        .map(|token| OsStr::from_bytes(token).to_os_string())
        .collect()
}
