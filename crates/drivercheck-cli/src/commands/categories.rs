use drivercheck_core::InventoryConfig;

pub fn run(config: &InventoryConfig) {
    let categories = config.categories();
    println!("{} device categories:\n", categories.len());
    for c in &categories {
        println!("  {:<20} {}", c.name, c.classes.join(", "));
    }
    println!("\nUse `drivercheck scan --category <NAME>` to scan one category.");
}
