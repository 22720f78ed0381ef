//! Shared helpers for backends that shell out to system tools.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::warn;

use crate::error::LookupError;

/// Poll interval while waiting on a child process.
const WAIT_POLL: Duration = Duration::from_millis(20);

/// `CREATE_NO_WINDOW`: the child gets its own hidden console, so code page
/// changes made inside it do not leak into the caller's terminal.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// PowerShell statement that makes redirected output UTF-8.
pub const POWERSHELL_UTF8: &str = "[Console]::OutputEncoding = [Text.Encoding]::UTF8; ";

/// UTF-8 console code page.
pub const UTF8_CODE_PAGE: &str = "65001";

// ---------------------------------------------------------------------------
// Command execution
// ---------------------------------------------------------------------------

/// Check if a command exists on `PATH`.
pub fn command_exists(name: &str) -> bool {
    let probe = if cfg!(windows) { "where" } else { "which" };
    Command::new(probe)
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Whether `program` is an existing path or a command on `PATH`.
pub fn program_available(program: &str) -> bool {
    std::path::Path::new(program).exists() || command_exists(program)
}

/// Run a command and return its stdout as a `String`.
///
/// The child is killed if it is still running after `timeout`. Stdout is
/// drained on a separate thread so a chatty child cannot block on a full pipe.
pub fn run_command(program: &str, args: &[&str], timeout: Duration) -> Result<String, LookupError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    let mut child = cmd
        .spawn()
        .map_err(|source| LookupError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let mut stdout = child.stdout.take();
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(out) = stdout.as_mut() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LookupError::Timeout {
                    program: program.to_string(),
                    after: timeout,
                });
            }
            Ok(None) => thread::sleep(WAIT_POLL),
            Err(source) => {
                let _ = child.kill();
                return Err(LookupError::Spawn {
                    program: program.to_string(),
                    source,
                });
            }
        }
    };

    let bytes = reader.join().unwrap_or_default();
    if !status.success() {
        return Err(LookupError::Exit {
            program: program.to_string(),
            code: status.code(),
        });
    }

    Ok(decode_output(program, bytes))
}

/// Decode captured stdout as UTF-8.
///
/// Callers ask the child for UTF-8 (see [`POWERSHELL_UTF8`] and
/// [`utf8_console_command`]). Anything else is logged and decoded lossily.
pub fn decode_output(program: &str, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            warn!("`{program}` wrote non-UTF-8 output; undecodable bytes replaced");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Prefix a PowerShell script so its redirected output is UTF-8.
pub fn utf8_powershell(script: &str) -> String {
    format!("{POWERSHELL_UTF8}{script}")
}

/// `cmd` invocation that switches the console to UTF-8 before running
/// `program args...`.
///
/// Console tools such as pnputil write redirected output in the OEM code
/// page otherwise. Arguments must not contain cmd metacharacters.
pub fn utf8_console_command(program: &str, args: &[&str]) -> (String, Vec<String>) {
    let mut cmd_args: Vec<String> = ["/D", "/C", "chcp", UTF8_CODE_PAGE, ">nul", "&", program]
        .iter()
        .map(|s| s.to_string())
        .collect();
    cmd_args.extend(args.iter().map(|a| a.to_string()));
    ("cmd".to_string(), cmd_args)
}

/// Whether `arg` is safe to splice into a `cmd /C` line.
pub fn is_plain_arg(arg: &str) -> bool {
    !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

// ---------------------------------------------------------------------------
// Quoting
// ---------------------------------------------------------------------------

/// Escape a value for use inside a single-quoted WQL string literal.
pub fn wql_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Quote a value as a PowerShell single-quoted string.
pub fn ps_single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// PowerShell literal for the CIM filter `<property> = '<value>'`.
pub fn cim_filter(property: &str, value: &str) -> String {
    ps_single_quote(&format!("{property} = '{}'", wql_escape(value)))
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Normalize a driver date to `yyyy/MM/dd`.
///
/// Accepts a DMTF datetime (`20230115000000.000000-000`), ISO-like
/// `yyyy-MM-dd...`, or an already formatted `yyyy/MM/dd`. Anything else is
/// returned trimmed and unchanged.
pub fn normalize_driver_date(raw: &str) -> String {
    let s = raw.trim();
    let bytes = s.as_bytes();

    if bytes.len() >= 8 && bytes[..8].iter().all(u8::is_ascii_digit) {
        return format!("{}/{}/{}", &s[0..4], &s[4..6], &s[6..8]);
    }

    if bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && (bytes[4] == b'-' || bytes[4] == b'/')
        && bytes[7] == bytes[4]
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[8..10].iter().all(u8::is_ascii_digit)
    {
        return format!("{}/{}/{}", &s[0..4], &s[5..7], &s[8..10]);
    }

    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wql_escape_backslash_and_quote() {
        assert_eq!(wql_escape(r"PCI\VEN_8086"), r"PCI\\VEN_8086");
        assert_eq!(wql_escape("it's"), r"it\'s");
        assert_eq!(wql_escape(""), "");
    }

    #[test]
    fn ps_single_quote_doubles_quotes() {
        assert_eq!(ps_single_quote("abc"), "'abc'");
        assert_eq!(ps_single_quote("a'b"), "'a''b'");
    }

    #[test]
    fn cim_filter_composes_both_escapes() {
        assert_eq!(
            cim_filter("DeviceID", r"USB\VID_1'2"),
            r"'DeviceID = ''USB\\VID_1\''2'''"
        );
    }

    #[test]
    fn normalize_dmtf_date() {
        assert_eq!(normalize_driver_date("20230115000000.000000-000"), "2023/01/15");
        assert_eq!(normalize_driver_date("20060621"), "2006/06/21");
    }

    #[test]
    fn normalize_iso_and_formatted_dates() {
        assert_eq!(normalize_driver_date("2021-06-03T00:00:00"), "2021/06/03");
        assert_eq!(normalize_driver_date(" 2021/06/03 "), "2021/06/03");
    }

    #[test]
    fn normalize_leaves_unrecognised_text() {
        assert_eq!(normalize_driver_date("June 2021"), "June 2021");
        assert_eq!(normalize_driver_date("2021-6-3"), "2021-6-3");
    }

    #[test]
    fn run_command_missing_program_is_spawn_error() {
        let err = run_command(
            "drivercheck-definitely-not-a-program",
            &[],
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, LookupError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn run_command_captures_stdout() {
        let out = run_command("sh", &["-c", "echo hello"], Duration::from_secs(5)).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn run_command_reports_exit_code() {
        let err = run_command("sh", &["-c", "exit 3"], Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, LookupError::Exit { code: Some(3), .. }));
    }

    /// "インスタンス ID:    X\\1" as Shift_JIS (code page 932).
    const CP932_INSTANCE_LINE: &[u8] = &[
        0x83, 0x43, 0x83, 0x93, 0x83, 0x58, 0x83, 0x5E, 0x83, 0x93, 0x83, 0x58, b' ', b'I', b'D',
        b':', b' ', b' ', b' ', b' ', b'X', b'\\', b'1', b'\n',
    ];

    #[test]
    fn oem_code_page_output_is_not_silently_trusted() {
        let text = decode_output("pnputil", CP932_INSTANCE_LINE.to_vec());
        assert!(text.contains('\u{FFFD}'));
        assert!(text.ends_with("ID:    X\\1\n"));
    }

    #[test]
    fn utf8_output_decodes_cleanly() {
        let bytes = "インスタンス ID:    X\\1\n".as_bytes().to_vec();
        assert_eq!(decode_output("pnputil", bytes), "インスタンス ID:    X\\1\n");
    }

    #[test]
    fn console_command_switches_to_utf8_first() {
        let (program, args) = utf8_console_command(r"C:\Windows\System32\pnputil.exe", &["/enum-devices"]);
        assert_eq!(program, "cmd");
        assert_eq!(
            args,
            ["/D", "/C", "chcp", "65001", ">nul", "&", r"C:\Windows\System32\pnputil.exe", "/enum-devices"]
        );
    }

    #[test]
    fn powershell_scripts_get_utf8_prefix() {
        let script = utf8_powershell("Get-Date");
        assert!(script.starts_with("[Console]::OutputEncoding = [Text.Encoding]::UTF8;"));
        assert!(script.ends_with("Get-Date"));
    }

    #[test]
    fn plain_args() {
        assert!(is_plain_arg("AudioEndpoint"));
        assert!(is_plain_arg("Net"));
        for bad in ["", "Media&calc", "Net|more", "a b", "x>y", "\"q\""] {
            assert!(!is_plain_arg(bad), "{bad:?}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn run_command_decodes_raw_bytes() {
        let out = run_command("printf", &["\\203\\103ID: X\\n"], Duration::from_secs(5)).unwrap();
        assert!(out.contains('\u{FFFD}'));
        assert!(out.contains("ID: X"));
    }

    #[cfg(unix)]
    #[test]
    fn run_command_kills_on_timeout() {
        let start = Instant::now();
        let err = run_command("sleep", &["5"], Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, LookupError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
