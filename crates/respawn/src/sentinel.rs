//! Role detection through a process-wide environment marker.
//!
//! The launcher sets [`SENTINEL_KEY`] to [`SENTINEL_MARKER`] in the
//! environment of the process it spawns. The marker is inherited by anything
//! that process launches in turn and is never cleared.

use std::env;
use std::ffi::{OsStr, OsString};

/// Environment entry naming the launcher role of the current process.
pub const SENTINEL_KEY: &str = "RESPAWN_LAUNCHER_ROLE";

/// Value identifying a relaunched daemon instance.
pub const SENTINEL_MARKER: &str = "daemon";

/// Returns true when this process was spawned by the launcher.
#[must_use]
pub fn is_relaunched_instance() -> bool {
    is_marker(env::var_os(SENTINEL_KEY).as_deref())
}

/// Returns true only for an exact match of [`SENTINEL_MARKER`].
#[must_use]
pub fn is_marker(value: Option<&OsStr>) -> bool {
    value == Some(OsStr::new(SENTINEL_MARKER))
}

/// Environment entry injected into the spawned child.
pub(crate) fn sentinel_entry() -> (OsString, OsString) {
    (OsString::from(SENTINEL_KEY), OsString::from(SENTINEL_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, false)]
    #[case(Some(""), false)]
    #[case(Some("Daemon"), false)]
    #[case(Some("daemon "), false)]
    #[case(Some("parent"), false)]
    #[case(Some("daemon"), true)]
    fn only_exact_marker_matches(#[case] value: Option<&str>, #[case] expected: bool) {
        assert_eq!(is_marker(value.map(OsStr::new)), expected);
    }

    #[test]
    fn injected_entry_satisfies_detection() {
        let (key, value) = sentinel_entry();
        assert_eq!(key, SENTINEL_KEY);
        assert!(is_marker(Some(value.as_os_str())));
    }
}
