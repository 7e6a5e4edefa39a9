//! Forwards `tracing` events over a channel so a UI can show them.

use std::fmt;

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Events beyond this many unread are dropped rather than blocking the emitter.
pub const LOG_CHANNEL_CAPACITY: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEnvelope {
    pub at: DateTime<Utc>,
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEnvelope {
    /// `HH:MM:SS LEVEL message key=value ...`
    pub fn display_line(&self) -> String {
        let mut line = format!("{} {:<5} {}", self.at.format("%H:%M:%S"), self.level, self.message);
        for (key, value) in &self.fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }
}

#[derive(Clone)]
pub struct LogForwardLayer {
    sender: Sender<LogEnvelope>,
    max_level: Level,
}

impl LogForwardLayer {
    pub fn new(sender: Sender<LogEnvelope>) -> Self {
        Self {
            sender,
            max_level: Level::INFO,
        }
    }

    /// Forward events at `level` or more severe.
    pub fn with_max_level(mut self, level: Level) -> Self {
        self.max_level = level;
        self
    }
}

/// A forwarding layer and the receiving end of its bounded channel.
pub fn log_channel() -> (LogForwardLayer, Receiver<LogEnvelope>) {
    let (sender, receiver) = bounded(LOG_CHANNEL_CAPACITY);
    (LogForwardLayer::new(sender), receiver)
}

impl<S> Layer<S> for LogForwardLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.max_level {
            return;
        }
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);
        let envelope = LogEnvelope {
            at: Utc::now(),
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor
                .message
                .unwrap_or_else(|| metadata.target().to_string()),
            fields: visitor.fields,
        };
        let _ = self.sender.try_send(envelope);
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl FieldCollector {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, format!("{value:.2}"));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }
}
