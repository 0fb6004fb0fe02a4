use catdiff_common::SuppressionRecord;
use tracing::debug;

/// Receives suppression diagnostics from the diff engine
pub trait DiagnosticSink {
    fn suppressed(&mut self, record: &SuppressionRecord);
}

/// Writes each record as a debug-level `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn suppressed(&mut self, record: &SuppressionRecord) {
        debug!(target: "catdiff::suppression", tag = %record.tag, "{}", record);
    }
}

/// Drops every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn suppressed(&mut self, _record: &SuppressionRecord) {}
}

impl DiagnosticSink for Vec<SuppressionRecord> {
    fn suppressed(&mut self, record: &SuppressionRecord) {
        self.push(record.clone());
    }
}

/// Collects the rendered log lines, for callers that parse diagnostic output
impl DiagnosticSink for Vec<String> {
    fn suppressed(&mut self, record: &SuppressionRecord) {
        self.push(record.to_string());
    }
}
