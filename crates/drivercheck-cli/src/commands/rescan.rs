use drivercheck_core::InventoryConfig;
use drivercheck_core::sources::helpers::run_command;
use drivercheck_core::sources::pnputil::PNPUTIL_EXE;

pub fn run(config: &InventoryConfig) {
    super::require_windows("rescanning hardware");

    println!("Scanning for hardware changes...");
    match run_command(PNPUTIL_EXE, &["/scan-devices"], config.command_timeout()) {
        Ok(output) => {
            let output = output.trim();
            if !output.is_empty() {
                println!("{output}");
            }
            println!("Hardware rescan complete. Run `drivercheck scan` to see the result.");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
