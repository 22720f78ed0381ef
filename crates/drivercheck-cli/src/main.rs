//! CLI for drivercheck — find devices with broken or missing drivers.

mod commands;

use clap::{ArgAction, Args, Parser, Subcommand};

use commands::scan::{ScanCommandConfig, View};

#[derive(Parser)]
#[command(name = "drivercheck")]
#[command(about = "drivercheck — find devices with broken or missing drivers")]
#[command(version = drivercheck_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file (workers, timeout, extra labels and categories)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Number of parallel device lookups
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Timeout for each external command in seconds
    #[arg(long, global = true)]
    timeout_sec: Option<f64>,

    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

/// Which devices to scan.
#[derive(Args)]
struct FilterArgs {
    /// Device category preset (see `categories`)
    #[arg(long, conflicts_with = "classes")]
    category: Option<String>,

    /// Comma-separated device setup classes, e.g. "Media,AudioEndpoint"
    #[arg(long)]
    classes: Option<String>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Also write the JSON report to this path
    #[arg(long)]
    output: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List device categories and the setup classes they cover
    Categories,

    /// Scan devices: drivers, problems, statistics, updates and recommendations
    Scan {
        #[command(flatten)]
        filter: FilterArgs,

        /// Skip the Windows Update search
        #[arg(long)]
        no_updates: bool,
    },

    /// Show only devices that need attention
    Problems {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show device counts by class, status and manufacturer
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List pending driver updates from Windows Update
    Updates {
        /// Print titles as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Open the Windows Update optional updates page
    Settings,

    /// Ask Windows to rescan for hardware changes
    Rescan,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn scan_config(view: View, filter: &FilterArgs, include_updates: bool) -> ScanCommandConfig<'_> {
    ScanCommandConfig {
        view,
        category: filter.category.as_deref(),
        classes: filter.classes.as_deref(),
        json: filter.json,
        output_path: filter.output.as_deref(),
        include_updates,
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = commands::load_config(&commands::GlobalOptions {
        config_path: cli.config.as_deref(),
        workers: cli.workers,
        timeout_sec: cli.timeout_sec,
    });

    match cli.command {
        Commands::Categories => commands::categories::run(&config),
        Commands::Scan { filter, no_updates } => {
            commands::scan::run(&config, scan_config(View::Full, &filter, !no_updates))
        }
        Commands::Problems { filter } => {
            commands::scan::run(&config, scan_config(View::Problems, &filter, false))
        }
        Commands::Stats { filter } => {
            commands::scan::run(&config, scan_config(View::Stats, &filter, false))
        }
        Commands::Updates { json } => commands::updates::run(&config, json),
        Commands::Settings => commands::settings::run(),
        Commands::Rescan => commands::rescan::run(&config),
    }
}
