use std::fs::OpenOptions;
use std::io::{LineWriter, Write};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::trace::trace::TraceEvent;

type Sink = Box<dyn Write + Send>;

/// JSONL sink for injection transitions. Open and write failures are logged,
/// never raised.
pub struct TraceLogger {
    sink: Option<Mutex<Sink>>,
}

impl TraceLogger {
    /// Append to `path`, creating it if needed.
    pub fn new(path: &str) -> Self {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                debug!(path, "injection trace enabled");
                Self::from_writer(LineWriter::new(file))
            }
            Err(e) => {
                warn!(path, error = %e, "could not open trace file");
                Self::disabled()
            }
        }
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Some(Mutex::new(Box::new(writer))),
        }
    }

    /// A logger that drops every event.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(field = %event.field_id, error = %e, "failed to serialize trace event");
                return;
            }
        };
        let Ok(mut writer) = sink.lock() else {
            warn!("trace sink lock poisoned, event dropped");
            return;
        };
        if let Err(e) = writeln!(writer, "{}", line) {
            warn!(field = %event.field_id, error = %e, "failed to write trace event");
        }
    }
}
