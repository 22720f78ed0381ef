pub mod categories;
pub mod rescan;
pub mod scan;
pub mod settings;
pub mod updates;

use std::path::Path;

use drivercheck_core::{CancelToken, DeviceCategory, DeviceInventoryService, InventoryConfig};

/// Options shared by every subcommand.
pub struct GlobalOptions<'a> {
    pub config_path: Option<&'a str>,
    pub workers: Option<usize>,
    pub timeout_sec: Option<f64>,
}

/// Load the config file (if any) and apply command-line overrides.
/// Exits on a bad file or a bad override.
pub fn load_config(opts: &GlobalOptions) -> InventoryConfig {
    let config = match opts.config_path {
        Some(path) => match InventoryConfig::load(Path::new(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => InventoryConfig::default(),
    };
    match apply_overrides(config, opts.workers, opts.timeout_sec) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn apply_overrides(
    mut config: InventoryConfig,
    workers: Option<usize>,
    timeout_sec: Option<f64>,
) -> Result<InventoryConfig, String> {
    if let Some(w) = workers {
        if w == 0 {
            return Err("--workers must be at least 1".to_string());
        }
        config.workers = w;
    }
    if let Some(t) = timeout_sec {
        if !t.is_finite() || t <= 0.0 {
            return Err(format!("--timeout-sec must be positive, got {t}"));
        }
        config.command_timeout_secs = t;
    }
    Ok(config)
}

pub fn make_service(config: &InventoryConfig) -> DeviceInventoryService {
    let service = DeviceInventoryService::from_config(config);
    log::debug!(
        "{} worker(s), {:.1}s command timeout",
        service.workers(),
        config.command_timeout_secs
    );
    service
}

/// Class filters selected on the command line.
#[derive(Debug, PartialEq)]
pub struct FilterSelection {
    /// Category label, when the filters came from one.
    pub category: Option<String>,
    pub classes: Vec<String>,
}

/// Resolve `--category` / `--classes` into class filters.
///
/// With neither flag, every class of every known category is scanned.
pub fn resolve_filters(
    categories: &[DeviceCategory],
    category: Option<&str>,
    classes: Option<&str>,
) -> Result<FilterSelection, String> {
    if let Some(list) = classes {
        let classes: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if classes.is_empty() {
            return Err(format!("no device classes in {list:?}"));
        }
        return Ok(FilterSelection {
            category: None,
            classes,
        });
    }

    if let Some(name) = category {
        let Some(found) = DeviceCategory::find(categories, name) else {
            let known: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
            return Err(format!(
                "unknown category '{name}' (known: {})",
                known.join(", ")
            ));
        };
        return Ok(FilterSelection {
            category: Some(found.name.clone()),
            classes: found.classes.clone(),
        });
    }

    let mut classes: Vec<String> = Vec::new();
    for c in categories.iter().flat_map(|c| c.classes.iter()) {
        if !classes.contains(c) {
            classes.push(c.clone());
        }
    }
    Ok(FilterSelection {
        category: None,
        classes,
    })
}

/// Token that is cancelled on Ctrl+C.
pub fn cancel_on_ctrlc() -> CancelToken {
    let token = CancelToken::new();
    let t = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if !t.is_cancelled() {
            eprintln!("\nStopping after in-flight lookups finish...");
        }
        t.cancel();
    }) {
        log::warn!("could not install Ctrl+C handler: {e}");
    }
    token
}

/// Exit unless running on Windows.
pub fn require_windows(what: &str) {
    if !cfg!(windows) {
        eprintln!("Error: {what} is only available on Windows.");
        std::process::exit(1);
    }
}
