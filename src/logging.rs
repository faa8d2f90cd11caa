// Logging - in-memory capture plus the in-game feedback line
//
// Tracing output must not break through the alternate screen buffer, so a
// custom layer captures log events into a bounded ring buffer instead of
// stdout. Bus `Feedback` events take a second path: the `Informer` keeps the
// latest message for the screen's bottom line and re-emits it through
// tracing, which lands it in the same buffer.

use crate::error::Error;
use crate::events::{Bus, Event, Receiver};
use crate::surface::Surface;
use chrono::{DateTime, Utc};
use ratatui::style::{Modifier, Style};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Maximum number of log entries to keep in memory
const MAX_FEEDBACK_ENTRIES: usize = 200;

/// A single log entry captured from tracing
#[derive(Debug, Clone)]
pub struct FeedbackEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<&Level> for LogLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warn,
            Level::INFO => LogLevel::Info,
            Level::DEBUG => LogLevel::Debug,
            Level::TRACE => LogLevel::Trace,
        }
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// Bounded in-memory log buffer. Cloning shares the underlying storage.
#[derive(Clone)]
pub struct FeedbackLog {
    entries: Arc<Mutex<VecDeque<FeedbackEntry>>>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_FEEDBACK_ENTRIES))),
        }
    }

    /// Add an entry, dropping the oldest once the buffer is full.
    pub fn add(&self, entry: FeedbackEntry) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= MAX_FEEDBACK_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// All entries, most recent last.
    pub fn get_all(&self) -> Vec<FeedbackEntry> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl Default for FeedbackLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracing layer that captures events into a `FeedbackLog`.
pub struct FeedbackLogLayer {
    log: FeedbackLog,
}

impl FeedbackLogLayer {
    pub fn new(log: FeedbackLog) -> Self {
        Self { log }
    }
}

impl<S> Layer<S> for FeedbackLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut message = String::new();
        let mut visitor = MessageVisitor(&mut message);
        event.record(&mut visitor);
        self.log.add(FeedbackEntry {
            timestamp: Utc::now(),
            level: LogLevel::from(metadata.level()),
            message,
        });
    }

    fn enabled(&self, _metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        // Filtering happens at the subscriber level
        true
    }
}

/// Visitor to extract the message from a tracing event
struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{:?}", value);
            // Remove the quotes that Debug adds
            if self.0.starts_with('"') && self.0.ends_with('"') {
                *self.0 = self.0[1..self.0.len() - 1].to_string();
            }
        }
    }
}

/// Install the global subscriber: env filter over the capture layer.
/// `RUST_LOG` wins over the configured filter.
pub fn init_logging(default_filter: &str, log: FeedbackLog) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(FeedbackLogLayer::new(log))
        .init();
}

/// Holds the latest bus feedback for the screen's bottom line.
pub struct Informer {
    line: Option<String>,
}

impl Informer {
    pub fn new() -> Self {
        Self { line: None }
    }

    pub fn last(&self) -> Option<&str> {
        self.line.as_deref()
    }

    pub fn clear(&mut self) {
        self.line = None;
    }

    pub fn render_line(&self, surface: &mut Surface) {
        if let Some(line) = &self.line {
            let style = Style::default().add_modifier(Modifier::DIM);
            surface.print_styled(0, surface.height() - 1, line, style);
        }
    }
}

impl Default for Informer {
    fn default() -> Self {
        Self::new()
    }
}

impl Receiver for Informer {
    fn on_event(&mut self, event: &Event, _bus: &Bus) -> Result<(), Error> {
        if let Event::Feedback(text) = event {
            tracing::info!(target: "delve::feedback", "{text}");
            self.line = Some(text.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_full_log_drops_the_oldest_entry() {
        let log = FeedbackLog::new();
        for n in 0..=MAX_FEEDBACK_ENTRIES {
            log.add(FeedbackEntry {
                timestamp: Utc::now(),
                level: LogLevel::Info,
                message: format!("entry {n}"),
            });
        }
        let entries = log.get_all();
        assert_eq!(entries.len(), MAX_FEEDBACK_ENTRIES);
        assert_eq!(entries[0].message, "entry 1");
        assert_eq!(entries.last().unwrap().message, format!("entry {MAX_FEEDBACK_ENTRIES}"));
    }

    #[test]
    fn test_layer_captures_messages_into_the_log() {
        let log = FeedbackLog::new();
        let subscriber =
            tracing_subscriber::registry().with(FeedbackLogLayer::new(log.clone()));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("forge lit");
            tracing::warn!("ore is low");
        });
        let entries = log.get_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "forge lit");
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[1].level, LogLevel::Warn);
        assert_eq!(entries[1].level.as_str(), "WARN");
    }

    #[test]
    fn test_informer_keeps_the_latest_feedback() {
        let bus = Bus::new();
        let informer = Rc::new(RefCell::new(Informer::new()));
        bus.subscribe(&informer, crate::events::EventKind::Feedback);

        bus.feedback("ore is low");
        bus.feedback("forge lit");

        assert_eq!(informer.borrow().last(), Some("forge lit"));
    }

    #[test]
    fn test_informer_renders_on_the_bottom_row() {
        let mut informer = Informer::new();
        let bus = Bus::new();
        informer
            .on_event(&Event::Feedback(String::from("ore is low")), &bus)
            .unwrap();

        let mut surface = Surface::new(14, 4);
        informer.render_line(&mut surface);
        assert!(surface.row_text(3).starts_with("ore is low"));

        informer.clear();
        assert_eq!(informer.last(), None);
    }
}
