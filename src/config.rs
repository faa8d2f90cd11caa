// Runtime configuration
//
// Configuration is loaded in order of precedence:
// 1. Environment variables (highest priority)
// 2. Config file (~/.config/delve/config.toml)
// 3. Built-in defaults (lowest priority)

use crate::events::BusTrace;
use serde::Deserialize;
use std::path::PathBuf;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frame budget in milliseconds. Input polling waits at most this long,
    /// so it is also the world tick rate.
    pub tick_ms: u64,

    /// Cursor blink half-period in milliseconds.
    pub blink_ms: u64,

    /// Bus publish tracing.
    pub trace: BusTrace,

    /// Default tracing filter. `RUST_LOG` overrides it.
    pub log_filter: String,

    /// Camera dead zone half-extent in tiles, when overriding the
    /// viewport's own default.
    pub dead_zone: Option<(i32, i32)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: 120,
            blink_ms: 400,
            trace: BusTrace::Off,
            log_filter: "delve=info".to_string(),
            dead_zone: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure. Every field is optional so a partial file works.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub tick_ms: Option<u64>,
    pub blink_ms: Option<u64>,
    /// "off", "events" or "callers"
    pub trace: Option<String>,
    pub log_filter: Option<String>,
    /// `[x, y]` half-extent
    pub dead_zone: Option<(i32, i32)>,
}

fn trace_from_name(name: &str) -> Option<BusTrace> {
    match name {
        "off" => Some(BusTrace::Off),
        "events" => Some(BusTrace::Events),
        "callers" => Some(BusTrace::Callers),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/delve/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("delve").join("config.toml"))
    }

    /// Create the config file with defaults if it doesn't exist, so users
    /// can discover the options.
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };
        if path.exists() {
            return;
        }
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load the file config if it exists.
    ///
    /// A config file that exists but cannot be parsed is a fatal error:
    /// failing fast beats silently running on defaults while the user
    /// debugs the wrong thing.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Failed to parse {}: {e}", path.display());
                    eprintln!("Fix the file or delete it to restore defaults.");
                    std::process::exit(1);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("Cannot read {}: {e}", path.display());
                std::process::exit(1);
            }
        }
    }

    /// Resolve a file config against the defaults: file > default.
    pub(crate) fn from_file_config(file: FileConfig) -> Self {
        let defaults = Self::default();
        Self {
            tick_ms: file.tick_ms.unwrap_or(defaults.tick_ms),
            blink_ms: file.blink_ms.unwrap_or(defaults.blink_ms),
            trace: file
                .trace
                .as_deref()
                .and_then(trace_from_name)
                .unwrap_or(defaults.trace),
            log_filter: file.log_filter.unwrap_or(defaults.log_filter),
            dead_zone: file.dead_zone,
        }
    }

    /// Apply environment overrides: env > current value. Unparseable
    /// values are ignored.
    fn apply_env(&mut self) {
        if let Some(ms) = std::env::var("DELVE_TICK_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.tick_ms = ms;
        }
        if let Some(ms) = std::env::var("DELVE_BLINK_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.blink_ms = ms;
        }
        if let Some(trace) = std::env::var("DELVE_TRACE")
            .ok()
            .and_then(|v| trace_from_name(&v))
        {
            self.trace = trace;
        }
    }

    /// Load configuration: env > file > defaults.
    pub fn from_env() -> Self {
        let mut config = Self::from_file_config(Self::load_file_config());
        config.apply_env();
        config
    }

    /// Serialize to the config file format. Single source of truth for the
    /// template `ensure_config_exists` writes.
    pub fn to_toml(&self) -> String {
        let dead_zone = match self.dead_zone {
            Some((x, y)) => format!("dead_zone = [{x}, {y}]"),
            None => "# dead_zone = [8, 4]".to_string(),
        };
        format!(
            r#"# delve configuration
# Delete this file to restore defaults.

# Frame budget in milliseconds; also the world tick rate.
tick_ms = {tick_ms}

# Cursor blink half-period in milliseconds.
blink_ms = {blink_ms}

# Bus publish tracing: "off", "events" or "callers".
trace = "{trace}"

# Default tracing filter (RUST_LOG overrides).
log_filter = "{log_filter}"

# Camera dead zone half-extent in tiles, [x, y].
{dead_zone}
"#,
            tick_ms = self.tick_ms,
            blink_ms = self.blink_ms,
            trace = match self.trace {
                BusTrace::Off => "off",
                BusTrace::Events => "events",
                BusTrace::Callers => "callers",
            },
            log_filter = self.log_filter,
            dead_zone = dead_zone,
        )
    }
}
