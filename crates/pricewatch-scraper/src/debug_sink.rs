//! Optional side channel for dumping decoded embedded documents.

use std::path::PathBuf;

use pricewatch_core::SiteId;
use serde_json::Value;

/// Receives every embedded JSON document the parsers decode.
///
/// Implementations must not fail the extraction; errors are logged and
/// swallowed.
pub trait DebugSink: Send + Sync {
    fn record_document(&self, site: &SiteId, document: &Value);
}

/// Discards everything. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    fn record_document(&self, _site: &SiteId, _document: &Value) {}
}

/// Overwrites a file with the pretty-printed document on every call.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DebugSink for JsonFileSink {
    fn record_document(&self, site: &SiteId, document: &Value) {
        let rendered = match serde_json::to_string_pretty(document) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(site = %site, error = %e, "failed to render debug document");
                return;
            }
        };
        match std::fs::write(&self.path, rendered) {
            Ok(()) => tracing::debug!(
                site = %site,
                path = %self.path.display(),
                "wrote embedded document"
            ),
            Err(e) => tracing::warn!(
                site = %site,
                path = %self.path.display(),
                error = %e,
                "failed to write debug document"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn file_sink_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.json");
        let sink = JsonFileSink::new(&path);

        sink.record_document(&SiteId::BestBuy, &json!({"a": {"b": 1}}));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains('\n'));
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, json!({"a": {"b": 1}}));
    }

    #[test]
    fn file_sink_swallows_write_errors() {
        let sink = JsonFileSink::new("/definitely/not/a/dir/debug.json");
        sink.record_document(&SiteId::BestBuy, &json!({}));
    }
}
