//! Command line rebuilt from a runtime's self-description.
//!
//! Managed runtimes report their startup flags and the "logical command"
//! (archive or entry point followed by program arguments) as loosely
//! delimited text. Token boundaries at internal whitespace are already gone,
//! so the rebuild here is lossy: a flag value that itself begins with `-`
//! cannot be told apart from the next flag.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::ArgvError;

/// Prefix marking the start of a new runtime flag.
pub const FLAG_PREFIX: &str = "-";

/// Separator used when gluing split flag fragments back together.
pub const ESCAPED_SPACE: &str = "\\ ";

/// Suffix identifying an archive entry point.
pub const ARCHIVE_SUFFIX: &str = ".jar";

/// How the runtime locates the program it executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeKind {
    /// A virtual machine that loads an archive or a class by name.
    Managed {
        /// Class path the runtime was started with.
        class_path: String,
    },
    /// A native executable; the command consists only of program arguments.
    Native,
}

/// What a runtime reports about its own invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeReport {
    launcher: PathBuf,
    flags: Vec<String>,
    command: String,
    kind: RuntimeKind,
    program_args: Option<Vec<OsString>>,
}

impl RuntimeReport {
    /// Describes a managed runtime.
    ///
    /// `flags` are the runtime's input arguments as reported, `command` the
    /// whitespace-delimited logical command.
    #[must_use]
    pub fn managed(
        launcher: impl Into<PathBuf>,
        flags: Vec<String>,
        command: impl Into<String>,
        class_path: impl Into<String>,
    ) -> Self {
        Self {
            launcher: launcher.into(),
            flags,
            command: command.into(),
            kind: RuntimeKind::Managed {
                class_path: class_path.into(),
            },
            program_args: None,
        }
    }

    /// Describes the running native executable.
    ///
    /// The exact program arguments are known here, so they are captured as
    /// the supplied program arguments and the lossy command text is kept for
    /// logging only.
    pub fn native() -> Result<Self, ArgvError> {
        let launcher = env::current_exe().map_err(|source| ArgvError::CurrentExe { source })?;
        let args: Vec<OsString> = env::args_os().skip(1).collect();
        let command = args
            .iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(Self {
            launcher,
            flags: Vec::new(),
            command,
            kind: RuntimeKind::Native,
            program_args: Some(args),
        })
    }

    /// Replaces the split tail of the logical command with `args`.
    #[must_use]
    pub fn with_program_args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program_args: Some(args.into_iter().map(Into::into).collect()),
            ..self
        }
    }

    /// Runtime binary that starts the program.
    #[must_use]
    pub fn launcher(&self) -> &Path {
        &self.launcher
    }

    /// Logical command as reported.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Rebuilds the command line, launcher first.
    #[must_use]
    pub fn reconstruct(&self) -> Vec<OsString> {
        let mut argv = vec![self.launcher.clone().into_os_string()];
        argv.extend(rejoin_flags(&self.flags).into_iter().map(OsString::from));

        let mut words = self.command.split_whitespace();
        if let RuntimeKind::Managed { class_path } = &self.kind {
            let head = words.next().unwrap_or_default();
            if head.ends_with(ARCHIVE_SUFFIX) {
                argv.push(OsString::from("-jar"));
            } else {
                argv.push(OsString::from("-cp"));
                argv.push(OsString::from(class_path.replace(' ', ESCAPED_SPACE)));
            }
            argv.push(OsString::from(head));
        }

        let tail = self
            .program_args
            .clone()
            .unwrap_or_else(|| words.map(OsString::from).collect());
        argv.extend(tail);
        argv
    }
}

/// Regroups loosely split runtime flags.
///
/// Each fragment starting with [`FLAG_PREFIX`] opens a new flag; any other
/// fragment is glued to the open flag with [`ESCAPED_SPACE`]. Fragments
/// before the first flag form a flag of their own.
#[must_use]
pub fn rejoin_flags<S: AsRef<str>>(fragments: &[S]) -> Vec<String> {
    let mut flags = Vec::new();
    let mut current: Option<String> = None;
    for fragment in fragments.iter().map(AsRef::as_ref) {
        if fragment.starts_with(FLAG_PREFIX) {
            flags.extend(current.replace(fragment.to_owned()));
        } else {
            let flag = current.get_or_insert_with(String::new);
            if !flag.is_empty() {
                flag.push_str(ESCAPED_SPACE);
            }
            flag.push_str(fragment);
        }
    }
    flags.extend(current);
    flags
}
