use std::path::PathBuf;

use crate::error::IngestError;

use super::SourceFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the source failed to ingest).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Context about one source being ingested.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Display name the source registers under.
    pub name: String,
    /// The input path.
    pub path: PathBuf,
    /// Format resolved for the source.
    pub format: SourceFormat,
}

/// Minimal stats reported when a source ingests successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Number of named entries the source contributed to the map
    /// (1, or the object count for an expanded topology).
    pub entries: usize,
    /// Number of features read from the source.
    pub features: usize,
}

/// Observer interface for per-source ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestObserver: Send + Sync {
    /// Called when a source ingests successfully.
    fn on_success(&self, _ctx: &SourceContext, _stats: IngestStats) {}

    /// Called when a source fails; ingestion aborts after this.
    fn on_failure(&self, _ctx: &SourceContext, _severity: IngestSeverity, _error: &IngestError) {}

    /// Called when a failure meets the configured alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &SourceContext, severity: IngestSeverity, error: &IngestError) {
        self.on_failure(ctx, severity, error);
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<std::sync::Arc<dyn IngestObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<std::sync::Arc<dyn IngestObserver>>) -> Self {
        Self { observers }
    }
}

impl std::fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestObserver for CompositeObserver {
    fn on_success(&self, ctx: &SourceContext, stats: IngestStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &SourceContext, severity: IngestSeverity, error: &IngestError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &SourceContext, severity: IngestSeverity, error: &IngestError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs ingestion events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl IngestObserver for StdErrObserver {
    fn on_success(&self, ctx: &SourceContext, stats: IngestStats) {
        eprintln!(
            "[ingest][ok] source={} format={:?} path={} entries={} features={}",
            ctx.name,
            ctx.format,
            ctx.path.display(),
            stats.entries,
            stats.features
        );
    }

    fn on_failure(&self, ctx: &SourceContext, severity: IngestSeverity, error: &IngestError) {
        eprintln!(
            "[ingest][{:?}] source={} format={:?} path={} err={}",
            severity,
            ctx.name,
            ctx.format,
            ctx.path.display(),
            error
        );
    }

    fn on_alert(&self, ctx: &SourceContext, severity: IngestSeverity, error: &IngestError) {
        eprintln!(
            "[ALERT][ingest][{:?}] source={} format={:?} path={} err={}",
            severity,
            ctx.name,
            ctx.format,
            ctx.path.display(),
            error
        );
    }
}
