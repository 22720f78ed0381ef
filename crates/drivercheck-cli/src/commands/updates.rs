use std::time::Instant;

use drivercheck_core::InventoryConfig;

pub fn run(config: &InventoryConfig, json: bool) {
    let service = super::make_service(config);
    if !json {
        println!("Searching Windows Update for driver updates (this can take a few minutes)...");
    }

    let t0 = Instant::now();
    let titles = service.pending_updates();

    if json {
        match serde_json::to_string_pretty(&titles) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!(
        "Found {} pending driver update(s) [{:.1}s]\n",
        titles.len(),
        t0.elapsed().as_secs_f64()
    );
    for title in &titles {
        println!("  - {title}");
    }
    if titles.is_empty() {
        println!("  (none)");
    }
}
