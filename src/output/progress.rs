//! Progress reporting
//!
//! The core never writes to stdout. It emits [`RunEvent`]s into a
//! [`ProgressSink`]; the shell decides how to display them. Every line is
//! also logged through `tracing`.

use crate::output::RunSummary;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Event observed by whoever started a run
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Free-form, human-readable progress line
    Progress(String),
    /// Terminal event; nothing follows it
    Finished(RunSummary),
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Progress(line) => f.write_str(line),
            Self::Finished(summary) => write!(f, "{}", summary),
        }
    }
}

/// Destination of run events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: RunEvent);
}

impl ProgressSink for mpsc::UnboundedSender<RunEvent> {
    fn emit(&self, event: RunEvent) {
        // A dropped receiver only means nobody is watching anymore
        let _ = self.send(event);
    }
}

/// Cheap, clonable handle for emitting progress
#[derive(Clone, Default)]
pub struct Reporter {
    sink: Option<Arc<dyn ProgressSink>>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Reporter backed by an unbounded channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(Arc::new(tx)), rx)
    }

    /// Reporter that only logs
    pub fn silent() -> Self {
        Self { sink: None }
    }

    pub fn info(&self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{}", line);
        self.send(line);
    }

    pub fn warn(&self, line: impl Into<String>) {
        let line = line.into();
        tracing::warn!("{}", line);
        self.send(line);
    }

    pub fn error(&self, line: impl Into<String>) {
        let line = line.into();
        tracing::error!("{}", line);
        self.send(line);
    }

    /// Emits the terminal event
    pub fn finish(&self, summary: RunSummary) {
        if let Some(sink) = &self.sink {
            sink.emit(RunEvent::Finished(summary));
        }
    }

    fn send(&self, line: String) {
        if let Some(sink) = &self.sink {
            sink.emit(RunEvent::Progress(line));
        }
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}
