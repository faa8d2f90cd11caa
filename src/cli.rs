// CLI module - command-line argument parsing and handlers
//
// Provides subcommands for configuration management:
// - config --show: Display effective configuration
// - config --reset: Regenerate config file with defaults
// - config --path: Show config file path
// Top-level flags override the loaded config for one run.

use crate::config::{Config, VERSION};
use crate::events::BusTrace;
use clap::{Parser, Subcommand};
use std::io::Write;

/// Tile-world demo for the delve framework
#[derive(Parser)]
#[command(name = "delve-demo")]
#[command(version = VERSION)]
#[command(about = "Tile-world demo for the delve UI framework", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log every bus publish
    #[arg(long)]
    pub trace_events: bool,

    /// Override the frame budget in milliseconds
    #[arg(long, value_name = "MS")]
    pub tick_ms: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Flags that override the loaded config for this run.
pub struct RunOverrides {
    pub trace_events: bool,
    pub tick_ms: Option<u64>,
}

impl RunOverrides {
    pub fn apply(&self, config: &mut Config) {
        if self.trace_events {
            config.trace = BusTrace::Events;
        }
        if let Some(ms) = self.tick_ms {
            config.tick_ms = ms;
        }
    }
}

/// Handle the command line. `None` means a subcommand was handled and the
/// process should exit; otherwise the overrides apply to the run.
pub fn handle_cli() -> Option<RunOverrides> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config { show, reset, path }) => {
            if path {
                handle_config_path();
            } else if show {
                handle_config_show();
            } else if reset {
                handle_config_reset();
            } else {
                println!("Usage: delve-demo config [--show|--reset|--path]");
            }
            None
        }
        None => Some(RunOverrides {
            trace_events: cli.trace_events,
            tick_ms: cli.tick_ms,
        }),
    }
}

fn resolved_config_path() -> std::path::PathBuf {
    match Config::config_path() {
        Some(path) => path,
        None => {
            eprintln!("error: no config directory on this platform");
            std::process::exit(1);
        }
    }
}

fn handle_config_path() {
    println!("{}", resolved_config_path().display());
}

fn handle_config_show() {
    let config = Config::from_env();
    println!("# effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    let path = resolved_config_path();
    let source = if path.exists() {
        format!("{}", path.display())
    } else {
        "built-in defaults (no config file)".to_string()
    };
    println!();
    println!("# source: {source}");
}

fn handle_config_reset() {
    let path = resolved_config_path();

    if path.exists() && !confirm_overwrite(&path) {
        println!("Aborted.");
        return;
    }

    let written = path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|()| std::fs::write(&path, Config::default().to_toml()));
    match written {
        Ok(()) => println!("Config reset to defaults: {}", path.display()),
        Err(e) => {
            eprintln!("error: could not write {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn confirm_overwrite(path: &std::path::Path) -> bool {
    eprint!("{} exists. Overwrite? [y/N] ", path.display());
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}
