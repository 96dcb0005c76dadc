//! Structured logging for dashboard events

use std::sync::Arc;

/// Structured logger carrying the session id as `context_id`
#[derive(Debug, Clone)]
pub struct DashboardLogger {
    context_id: Arc<str>,
}

impl DashboardLogger {
    pub fn new(context_id: impl Into<Arc<str>>) -> Self {
        Self {
            context_id: context_id.into(),
        }
    }

    /// Logger for code paths that run before a session id exists
    pub fn detached() -> Self {
        Self::new("-")
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn log_fetch_issued(&self, generation: u64, industry: Option<&str>, min_size: Option<u64>) {
        tracing::debug!(
            context_id = %self.context_id,
            generation = generation,
            industry = ?industry,
            min_size = ?min_size,
            "Lead fetch issued"
        );
    }

    pub fn log_fetch_applied(&self, generation: u64, lead_count: usize, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            generation = generation,
            lead_count = lead_count,
            latency_ms = latency_ms,
            "Lead collection replaced"
        );
    }

    pub fn log_fetch_stale(&self, generation: u64, latest: u64) {
        tracing::debug!(
            context_id = %self.context_id,
            generation = generation,
            latest = latest,
            "Discarding superseded lead response"
        );
    }

    pub fn log_fetch_failed(&self, generation: u64, error: &str, current: bool) {
        tracing::warn!(
            context_id = %self.context_id,
            generation = generation,
            error = %error,
            current = current,
            "Lead fetch failed, keeping last good collection"
        );
    }

    pub fn log_telemetry_dropped(&self, action: &str, error: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            action = %action,
            error = %error,
            "Telemetry event dropped"
        );
    }

    pub fn log_preference_failure(&self, key: &str, error: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            key = %key,
            error = %error,
            "Preference write failed, keeping in-memory value"
        );
    }

    pub fn log_export(&self, file_name: &str, rows: usize, bytes: usize) {
        tracing::info!(
            context_id = %self.context_id,
            file_name = %file_name,
            rows = rows,
            bytes = bytes,
            "Exported current view"
        );
    }
}

impl Default for DashboardLogger {
    fn default() -> Self {
        Self::detached()
    }
}
