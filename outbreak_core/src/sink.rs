//! The boundary to whatever draws the map.

use thiserror::Error;
use tracing::{debug, warn};

use outbreak_schema::FeatureCollection;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("render sink rejected update: {0}")]
    Rejected(String),
}

/// Consumer of projected feature collections. `set_data` is only called
/// while `is_ready` holds.
pub trait RenderSink {
    fn is_ready(&self) -> bool;
    fn set_data(&mut self, data: &FeatureCollection) -> Result<(), SinkError>;
}

/// Guards a sink: updates to an unready sink are skipped, and failures are
/// logged and dropped. Nothing is queued; the next state change retries.
#[derive(Debug)]
pub struct SinkBridge<S> {
    sink: S,
    published: u64,
    skipped: u64,
}

impl<S: RenderSink> SinkBridge<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            published: 0,
            skipped: 0,
        }
    }

    /// Push `data` to the sink. Returns whether the sink accepted it.
    pub fn publish(&mut self, data: &FeatureCollection) -> bool {
        if !self.sink.is_ready() {
            self.skipped += 1;
            debug!(target: "outbreak::sink", features = data.len(), "sink.skipped=not_ready");
            return false;
        }
        match self.sink.set_data(data) {
            Ok(()) => {
                self.published += 1;
                true
            }
            Err(err) => {
                self.skipped += 1;
                warn!(target: "outbreak::sink", error = %err, "sink.set_data_failed");
                false
            }
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

/// Keeps every collection it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub ready: bool,
    pub updates: Vec<FeatureCollection>,
}

impl RecordingSink {
    pub fn ready() -> Self {
        Self {
            ready: true,
            updates: Vec::new(),
        }
    }

    pub fn latest(&self) -> Option<&FeatureCollection> {
        self.updates.last()
    }
}

impl RenderSink for RecordingSink {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn set_data(&mut self, data: &FeatureCollection) -> Result<(), SinkError> {
        self.updates.push(data.clone());
        Ok(())
    }
}
