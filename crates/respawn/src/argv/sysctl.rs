//! macOS `KERN_PROCARGS2` command line source.
//!
//! The kernel returns one buffer laid out as:
//!
//! ```text
//! argc: i32 (native endian)
//! exec_path\0
//! \0\0...            padding up to the first argument
//! arg0\0 arg1\0 ...  exactly argc strings
//! environment...     ignored
//! ```
//!
//! [`parse_procargs`] decodes that layout and is platform independent so it
//! can be exercised against captured buffers anywhere.

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

use super::ArgvError;

/// Queries the kernel for the command line of `pid`.
#[cfg(target_os = "macos")]
pub fn query(pid: u32) -> Result<Vec<OsString>, ArgvError> {
    use std::io;
    use std::ptr;

    let raw_pid = libc::c_int::try_from(pid).map_err(|_| ArgvError::MalformedProcArgs {
        reason: "pid does not fit a C int",
    })?;
    let mut mib = [libc::CTL_KERN, libc::KERN_PROCARGS2, raw_pid];
    let mut size: libc::size_t = 0;

    // SAFETY: a null output buffer asks the kernel for the required size only.
    let probe_status = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            3,
            ptr::null_mut(),
            &raw mut size,
            ptr::null_mut(),
            0,
        )
    };
    if probe_status != 0 {
        return Err(ArgvError::Sysctl {
            source: io::Error::last_os_error(),
        });
    }

    let mut buffer = vec![0_u8; size];
    // SAFETY: `buffer` holds `size` writable bytes and `size` is updated to
    // the length the kernel actually wrote.
    let fill_status = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            3,
            buffer.as_mut_ptr().cast(),
            &raw mut size,
            ptr::null_mut(),
            0,
        )
    };
    if fill_status != 0 {
        return Err(ArgvError::Sysctl {
            source: io::Error::last_os_error(),
        });
    }
    buffer.truncate(size);
    parse_procargs(&buffer)
}

/// Queries the kernel for the command line of `pid`.
#[cfg(not(target_os = "macos"))]
pub fn query(_pid: u32) -> Result<Vec<OsString>, ArgvError> {
    Err(ArgvError::UnsupportedPlatform {
        os: std::env::consts::OS,
    })
}

/// Decodes a `KERN_PROCARGS2` buffer into argument tokens.
pub fn parse_procargs(buffer: &[u8]) -> Result<Vec<OsString>, ArgvError> {
    let (count_bytes, rest) =
        buffer
            .split_first_chunk::<4>()
            .ok_or(ArgvError::MalformedProcArgs {
                reason: "buffer shorter than the argument count",
            })?;
    #[expect(
        clippy::host_endian_bytes,
        reason = "the kernel writes argc in host byte order"
    )]
    let raw_count = i32::from_ne_bytes(*count_bytes);
    let argc = usize::try_from(raw_count).map_err(|_| ArgvError::MalformedProcArgs {
        reason: "negative argument count",
    })?;

    let path_end = rest
        .iter()
        .position(|byte| *byte == 0)
        .ok_or(ArgvError::MalformedProcArgs {
            reason: "unterminated executable path",
        })?;
    let after_path = rest.get(path_end..).unwrap_or_default();
    let args_start = after_path
        .iter()
        .position(|byte| *byte != 0)
        .unwrap_or(after_path.len());
    let mut cursor = after_path.get(args_start..).unwrap_or_default();

    let mut argv = Vec::with_capacity(argc);
    for _ in 0..argc {
        let end = cursor
            .iter()
            .position(|byte| *byte == 0)
            .ok_or(ArgvError::MalformedProcArgs {
                reason: "fewer arguments than the declared count",
            })?;
        let token = cursor.get(..end).unwrap_or_default();
        argv.push(OsStr::from_bytes(token).to_os_string());
        cursor = cursor.get(end + 1..).unwrap_or_default();
    }
    Ok(argv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[expect(
        clippy::host_endian_bytes,
        reason = "fixtures mirror the kernel's host byte order"
    )]
    fn buffer(argc: i32, body: &[u8]) -> Vec<u8> {
        let mut bytes = argc.to_ne_bytes().to_vec();
        bytes.extend_from_slice(body);
        bytes
    }

    fn tokens(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[test]
    fn skips_padding_before_first_argument() {
        let blob = buffer(
            3,
            b"/Applications/App.app/Contents/MacOS/app\0\0\0\0app\0--serve\0with space\0HOME=/Users/me\0",
        );
        assert_eq!(
            parse_procargs(&blob).expect("parse"),
            tokens(&["app", "--serve", "with space"])
        );
    }

    #[test]
    fn ignores_environment_after_declared_arguments() {
        let blob = buffer(1, b"/bin/app\0/bin/app\0PATH=/bin\0");
        assert_eq!(parse_procargs(&blob).expect("parse"), tokens(&["/bin/app"]));
    }

    #[test]
    fn zero_arguments_yield_empty_list() {
        let blob = buffer(0, b"/bin/app\0\0\0");
        assert!(parse_procargs(&blob).expect("parse").is_empty());
    }

    #[rstest]
    #[case::short_count(vec![1, 0])]
    #[case::negative_count(buffer(-1, b"/bin/app\0app\0"))]
    #[case::unterminated_path(buffer(1, b"/bin/app"))]
    #[case::missing_arguments(buffer(3, b"/bin/app\0\0app\0only-two\0"))]
    fn rejects_malformed_buffers(#[case] blob: Vec<u8>) {
        let error = parse_procargs(&blob).expect_err("malformed buffer");
        assert!(matches!(error, ArgvError::MalformedProcArgs { .. }));
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn own_command_line_matches_args_os() {
        let argv = query(std::process::id()).expect("sysctl");
        let expected: Vec<OsString> = std::env::args_os().collect();
        assert_eq!(argv, expected);
    }
}
