use std::process::Command;

/// Optional updates page; driver updates are listed there.
const OPTIONAL_UPDATES_URI: &str = "ms-settings:windowsupdate-optionalupdates";
/// Main Windows Update page, for systems without the optional updates page.
const WINDOWS_UPDATE_URI: &str = "ms-settings:windowsupdate";
/// First Windows 10 build (version 2004) with the optional updates page.
const OPTIONAL_UPDATES_MIN_BUILD: u32 = 19041;

pub fn run() {
    super::require_windows("opening Windows Update settings");

    let build = windows_build();
    log::debug!("windows build: {build:?}");

    // `start` exits 0 even for a page the Settings app does not know, so the
    // page is picked from the OS build; the fallback only covers launch errors.
    for uri in settings_uris(build) {
        match open_uri(uri) {
            Ok(()) => {
                println!("Opened {uri}");
                return;
            }
            Err(e) => log::warn!("could not open {uri}: {e}"),
        }
    }
    eprintln!("Error: could not open Windows Update settings.");
    std::process::exit(1);
}

/// Pages to try, best first.
fn settings_uris(build: Option<u32>) -> Vec<&'static str> {
    match build {
        Some(b) if b < OPTIONAL_UPDATES_MIN_BUILD => vec![WINDOWS_UPDATE_URI],
        _ => vec![OPTIONAL_UPDATES_URI, WINDOWS_UPDATE_URI],
    }
}

fn windows_build() -> Option<u32> {
    let output = Command::new("cmd").args(["/C", "ver"]).output().ok()?;
    parse_windows_build(&String::from_utf8_lossy(&output.stdout))
}

/// Build number from `ver` output: `Microsoft Windows [Version 10.0.19045.3570]`.
fn parse_windows_build(ver: &str) -> Option<u32> {
    let start = ver.find('[')? + 1;
    let end = start + ver[start..].find(']')?;
    let version = ver[start..end].split_whitespace().last()?;
    version.split('.').nth(2)?.parse().ok()
}

fn open_uri(uri: &str) -> std::io::Result<()> {
    // `start` is a cmd builtin; the empty string is the window title.
    let status = Command::new("cmd").args(["/C", "start", "", uri]).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("cmd exited with {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ver_output() {
        assert_eq!(
            parse_windows_build("\r\nMicrosoft Windows [Version 10.0.19045.3570]\r\n"),
            Some(19045)
        );
        assert_eq!(
            parse_windows_build("Microsoft Windows [バージョン 10.0.22631.4317]"),
            Some(22631)
        );
        assert_eq!(parse_windows_build("garbage"), None);
        assert_eq!(parse_windows_build("[Version 10.0]"), None);
    }

    #[test]
    fn old_builds_skip_the_optional_page() {
        assert_eq!(settings_uris(Some(18363)), vec![WINDOWS_UPDATE_URI]);
    }

    #[test]
    fn new_builds_try_optional_page_first() {
        assert_eq!(
            settings_uris(Some(22631)),
            vec![OPTIONAL_UPDATES_URI, WINDOWS_UPDATE_URI]
        );
        assert_eq!(settings_uris(None)[0], OPTIONAL_UPDATES_URI);
    }
}
