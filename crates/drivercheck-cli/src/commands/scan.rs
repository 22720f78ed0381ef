use std::path::Path;
use std::time::Instant;

use drivercheck_core::{
    DeviceRecord, DeviceStatistics, InventoryConfig, InventoryReport,
    Recommendation, needs_attention,
};

/// Which part of the scan result to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Every device, problems, statistics, updates and recommendations.
    Full,
    /// Only devices that need attention.
    Problems,
    /// Only the statistics tables.
    Stats,
}

pub struct ScanCommandConfig<'a> {
    pub view: View,
    pub category: Option<&'a str>,
    pub classes: Option<&'a str>,
    pub json: bool,
    pub output_path: Option<&'a str>,
    pub include_updates: bool,
}

pub fn run(config: &InventoryConfig, cmd: ScanCommandConfig) {
    let selection = match super::resolve_filters(&config.categories(), cmd.category, cmd.classes) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let service = super::make_service(config);
    let cancel = super::cancel_on_ctrlc();

    if !cmd.json {
        match &selection.category {
            Some(name) => println!(
                "Scanning {name} devices ({})...",
                selection.classes.join(", ")
            ),
            None => println!("Scanning device classes: {}...", selection.classes.join(", ")),
        }
    }

    let t0 = Instant::now();
    let outcome = match service.scan(&selection.classes, &cancel) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let elapsed = t0.elapsed().as_secs_f64();

    let updates = (cmd.include_updates && cmd.view == View::Full && !cancel.is_cancelled())
        .then(|| service.pending_updates());
    let report = InventoryReport::build(
        &service,
        selection.category.as_deref(),
        &selection.classes,
        outcome,
        updates,
    );

    if let Some(path) = cmd.output_path {
        match report.write_json(Path::new(path)) {
            Ok(()) => {
                if !cmd.json {
                    println!("Report written to {path}");
                }
            }
            Err(e) => eprintln!("Failed to write {path}: {e}"),
        }
    }

    if cmd.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!(
        "Found {} device(s), {} need attention [{elapsed:.1}s]",
        report.devices.len(),
        report.problems.len()
    );
    if report.cancelled {
        println!("(scan cancelled, results are partial)");
    }

    match cmd.view {
        View::Full => print_full(&report),
        View::Problems => print_devices(&report.problems),
        View::Stats => print_statistics(&report.statistics),
    }
}

fn print_full(report: &InventoryReport) {
    print_devices(&report.devices);
    print_statistics(&report.statistics);

    if let Some(updates) = &report.updates {
        println!("\nPending driver updates:");
        if updates.is_empty() {
            println!("  (none)");
        }
        for title in updates {
            println!("  - {title}");
        }
    }

    print_recommendations(&report.recommendations);
}

fn print_devices(devices: &[DeviceRecord]) {
    if devices.is_empty() {
        println!("\n  (no devices)");
        return;
    }
    println!();
    for d in devices {
        let reasons = d.attention_reasons();
        if reasons.is_empty() {
            println!("  \u{2705} {:<40} {}", d.name, d.status_display());
        } else {
            println!("  \u{26A0}\u{FE0F} {:<40} {}", d.name, reasons.join("; "));
        }
        println!("       {:<14} {}", "Device ID:", d.device_id);
        println!("       {:<14} {}", "Class:", d.device_class);
        println!("       {:<14} {}", "Manufacturer:", d.manufacturer);
        println!("       {:<14} {}", "Status:", d.status);
        println!(
            "       {:<14} {} ({})",
            "Driver:", d.driver_version, d.driver_date
        );
    }
}

fn print_statistics(stats: &DeviceStatistics) {
    println!("\nStatistics ({} device(s)):", stats.total());
    for (title, map) in [
        ("By class", &stats.class_count),
        ("By status", &stats.status_count),
        ("By manufacturer", &stats.manufacturer_count),
    ] {
        println!("  {title}:");
        for (key, count) in DeviceStatistics::sorted(map) {
            println!("    {key:<36} {count:>4}");
        }
    }
}

fn print_recommendations(recommendations: &[Recommendation]) {
    println!("\nRecommendations:");
    for r in recommendations {
        match r {
            Recommendation::NoActionNeeded => {
                println!("  All devices are working normally. No action needed.");
            }
            Recommendation::FixProblemDevices { count, steps } => {
                println!("  {count} device(s) need attention. Manual update steps:");
                for (i, step) in steps.iter().enumerate() {
                    println!("    {}. {step}", i + 1);
                }
            }
            Recommendation::InstallAvailableUpdates { titles } => {
                println!(
                    "  {} driver update(s) available in Windows Update.",
                    titles.len()
                );
            }
            Recommendation::GeneralGuidance { tips } => {
                println!("  Where to get drivers:");
                for tip in tips {
                    println!("    - {tip}");
                }
            }
        }
    }
    if needs_attention(recommendations) {
        println!("\nRun `drivercheck settings` to open Windows Update optional updates.");
    }
}
