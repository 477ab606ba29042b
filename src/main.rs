use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hardsnap::cli::{
    handle_backup_command, handle_clean_command, handle_list_command, BackupArgs, CleanArgs,
    ListArgs,
};
use hardsnap::config::{
    paths::HardsnapPaths,
    settings::{default_retention, Settings},
};
use hardsnap::models::IntervalRule;

#[derive(Parser)]
#[command(
    name = "hardsnap",
    version,
    about = "Hardlink-deduplicated snapshot backups",
    long_about = "hardsnap writes complete, timestamped snapshots of a directory with rsync. \
                  Unchanged files are hardlinked to the previous snapshot, and old snapshots \
                  are thinned out by hourly, daily, weekly, monthly and yearly retention rules."
)]
struct Cli {
    /// Show rsync output and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new snapshot and clean up old ones
    Backup(BackupArgs),

    /// Remove snapshots not covered by the retention rules
    Clean(CleanArgs),

    /// List the snapshots of a storage
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show current configuration and paths
    Config {
        /// Write the settings file with the current values
        #[arg(long)]
        init: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn join_rules(rules: &[IntervalRule]) -> String {
    rules.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(",")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let paths = HardsnapPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Commands::Backup(args) => handle_backup_command(&settings, args, cli.verbose)?,
        Commands::Clean(args) => handle_clean_command(&settings, args)?,
        Commands::List(args) => handle_list_command(&settings, args)?,
        Commands::Config { init } => {
            if init {
                settings.save(&paths)?;
                println!("Settings written to {}", paths.settings_file().display());
                println!();
            }
            println!("hardsnap Configuration");
            println!("======================");
            println!("Config directory: {}", paths.config_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            if !paths.is_initialized() {
                println!("                  (not written yet, using defaults)");
            }
            println!();
            println!("Settings:");
            match &settings.ssh_key {
                Some(key) => println!("  SSH key:         {}", key.display()),
                None => println!("  SSH key:         (none)"),
            }
            println!("  rsync arguments: {}", settings.rsync_args);
            match &settings.move_record {
                Some(record) => println!("  Move record:     {}", record),
                None => println!("  Move record:     (none)"),
            }
            println!("  Only if changed: {}", settings.only_if_changed);
            match &settings.retention {
                Some(rules) => println!("  Retention:       {}", join_rules(rules)),
                None => println!(
                    "  Retention:       (none, clean uses {})",
                    join_rules(&default_retention())
                ),
            }
        }
    }

    Ok(())
}
