// delve-demo - the mining camp showcase
//
// Thin binary rim: parse the command line, resolve configuration, install
// the capture-only tracing subscriber (stdout is the game screen), run the
// demo, and dump the captured log on the way out so errors are visible
// after the alternate screen closes.

use anyhow::{Context, Result};
use delve::cli;
use delve::config::Config;
use delve::logging::{init_logging, FeedbackLog};

fn main() -> Result<()> {
    let Some(overrides) = cli::handle_cli() else {
        return Ok(());
    };

    Config::ensure_config_exists();
    let mut config = Config::from_env();
    overrides.apply(&mut config);

    let log = FeedbackLog::new();
    init_logging(&config.log_filter, log.clone());
    tracing::info!("delve-demo {} starting", delve::config::VERSION);

    let outcome = delve::demo::run(config).context("demo loop failed");

    // The terminal is back to normal here; surface what the ring captured.
    if outcome.is_err() {
        for entry in log.get_all() {
            eprintln!(
                "{} [{}] {}",
                entry.timestamp.format("%H:%M:%S%.3f"),
                entry.level.as_str(),
                entry.message
            );
        }
    }
    outcome
}
