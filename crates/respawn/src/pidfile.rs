//! Pid file persistence shared by the launcher and the probe.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Permission bits of a freshly created pid file.
pub(crate) const PID_FILE_MODE: u32 = 0o644;

/// Errors raised while reading a pid file.
#[derive(Debug, Error)]
pub enum PidFileError {
    /// The pid file exists but could not be read.
    #[error("failed to read pid file '{path}': {source}")]
    Read {
        /// Pid file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The pid file does not hold a decimal number.
    #[error("pid file '{path}' holds '{content}', not a process id")]
    Parse {
        /// Pid file path.
        path: PathBuf,
        /// Trimmed file content.
        content: String,
    },
    /// The number cannot name a single process.
    #[error("pid file '{path}' names pid {pid}, which cannot address one process")]
    OutOfRange {
        /// Pid file path.
        path: PathBuf,
        /// Parsed value.
        pid: u64,
    },
}

/// Records `pid` at `path` as bare decimal text, replacing any old content.
pub(crate) fn write_pid(path: &Path, pid: u32) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(PID_FILE_MODE)
        .open(path)?;
    write!(file, "{pid}")?;
    file.sync_all()
}

/// Reads the pid recorded at `path`.
///
/// A missing file yields `Ok(None)`. Surrounding whitespace is tolerated.
/// Zero and values beyond `i32::MAX` are rejected because `kill` would
/// interpret them as process groups.
pub(crate) fn read_pid(path: &Path) -> Result<Option<u32>, PidFileError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PidFileError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let trimmed = content.trim();
    let pid = trimmed.parse::<u64>().map_err(|_| PidFileError::Parse {
        path: path.to_path_buf(),
        content: trimmed.to_owned(),
    })?;
    match u32::try_from(pid) {
        Ok(valid) if valid != 0 && i32::try_from(valid).is_ok() => Ok(Some(valid)),
        _ => Err(PidFileError::OutOfRange {
            path: path.to_path_buf(),
            pid,
        }),
    }
}
