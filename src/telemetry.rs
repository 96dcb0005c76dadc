//! Fire-and-forget usage telemetry
//!
//! Every event is dispatched on its own detached task. The caller never waits
//! for the sink and never sees its errors: a failed send is logged, counted
//! and dropped. There is no retry and no queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::ApiConfig;
use crate::errors::DashboardError;
use crate::metrics::metrics;
use crate::session::SessionId;
use crate::structured_logging::DashboardLogger;

/// Free-form event metadata
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Build metadata from a JSON object literal; anything else yields empty metadata.
pub fn metadata(value: serde_json::Value) -> Metadata {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

/// User actions that produce a telemetry event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    PageLoad,
    IndustryFilter,
    SizeFilter,
    Sort,
    ToggleView,
    Refresh,
    ResetFilters,
    ExportCsv,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::PageLoad => "page_load",
            Action::IndustryFilter => "industry_filter",
            Action::SizeFilter => "size_filter",
            Action::Sort => "sort",
            Action::ToggleView => "toggle_view",
            Action::Refresh => "refresh",
            Action::ResetFilters => "reset_filters",
            Action::ExportCsv => "export_csv",
        }
    }
}

/// Wire form of a usage event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "userId")]
    pub user_id: SessionId,
    pub action: Action,
    pub metadata: Metadata,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(user_id: SessionId, action: Action, metadata: Metadata) -> Self {
        Self {
            user_id,
            action,
            metadata,
            timestamp: Utc::now(),
        }
    }
}

/// Destination for usage events
#[async_trait]
pub trait TelemetrySink: Send + Sync + 'static {
    async fn send(&self, event: &Event) -> Result<(), DashboardError>;
}

/// POSTs events as JSON; the response body is ignored
#[derive(Debug, Clone)]
pub struct HttpTelemetrySink {
    client: reqwest::Client,
    url: String,
}

impl HttpTelemetrySink {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, DashboardError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| DashboardError::Configuration(e.to_string()))?;
        Ok(Self::new(client, api.events_url()))
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    async fn send(&self, event: &Event) -> Result<(), DashboardError> {
        let resp = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| DashboardError::from_reqwest(e, &self.url))?;

        if !resp.status().is_success() {
            return Err(DashboardError::Status {
                url: self.url.clone(),
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Tags events with the session id and dispatches them without blocking
#[derive(Clone)]
pub struct TelemetryEmitter {
    session_id: SessionId,
    sink: Option<Arc<dyn TelemetrySink>>,
    logger: DashboardLogger,
    in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl TelemetryEmitter {
    pub fn new(session_id: SessionId, sink: Arc<dyn TelemetrySink>) -> Self {
        let logger = DashboardLogger::new(session_id.as_str());
        Self {
            session_id,
            sink: Some(sink),
            logger,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An emitter that records nothing
    pub fn disabled(session_id: SessionId) -> Self {
        let logger = DashboardLogger::new(session_id.as_str());
        Self {
            session_id,
            sink: None,
            logger,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Record `action` on a detached task. Returns immediately.
    pub fn record(&self, action: Action, metadata: Metadata) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        let event = Event::new(self.session_id.clone(), action, metadata);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.logger
                .log_telemetry_dropped(action.as_str(), "no async runtime available");
            metrics().telemetry_dropped.inc();
            return;
        };

        let logger = self.logger.clone();
        let handle = runtime.spawn(async move {
            match sink.send(&event).await {
                Ok(()) => {
                    metrics().telemetry_sent.inc();
                }
                Err(e) => {
                    logger.log_telemetry_dropped(event.action.as_str(), &e.to_string());
                    metrics().telemetry_dropped.inc();
                }
            }
        });

        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// Wait up to `timeout` for events still being sent. Never fails; events
    /// still pending after the timeout keep running detached.
    pub async fn flush(&self, timeout: Duration) {
        let handles = std::mem::take(&mut *self.in_flight.lock());
        if handles.is_empty() {
            return;
        }
        let pending = handles.len();
        if tokio::time::timeout(timeout, futures::future::join_all(handles))
            .await
            .is_err()
        {
            tracing::warn!(pending = pending, "Telemetry flush timed out");
        }
    }
}

impl std::fmt::Debug for TelemetryEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryEmitter")
            .field("session_id", &self.session_id)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingSink;

    #[test]
    fn test_event_wire_format() {
        let event = Event::new(
            SessionId::from("user-1"),
            Action::IndustryFilter,
            metadata(serde_json::json!({ "industry": "Finance" })),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["action"], "industry_filter");
        assert_eq!(json["metadata"]["industry"], "Finance");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_action_names_match_serde() {
        for action in [
            Action::PageLoad,
            Action::IndustryFilter,
            Action::SizeFilter,
            Action::Sort,
            Action::ToggleView,
            Action::Refresh,
            Action::ResetFilters,
            Action::ExportCsv,
        ] {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, action.as_str());
        }
    }

    #[test]
    fn test_metadata_from_non_object_is_empty() {
        assert!(metadata(serde_json::json!(42)).is_empty());
    }

    #[tokio::test]
    async fn test_record_dispatches_with_session() {
        let sink = Arc::new(RecordingSink::default());
        let emitter = TelemetryEmitter::new(SessionId::from("s-1"), sink.clone());

        emitter.record(Action::Refresh, Metadata::new());
        emitter.record(Action::Sort, metadata(serde_json::json!({ "key": "size" })));
        emitter.flush(Duration::from_secs(1)).await;

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.user_id.as_str() == "s-1"));
        let actions: Vec<Action> = events.iter().map(|e| e.action).collect();
        assert!(actions.contains(&Action::Refresh));
        assert!(actions.contains(&Action::Sort));
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let sink = Arc::new(RecordingSink::failing());
        let emitter = TelemetryEmitter::new(SessionId::from("s-2"), sink.clone());
        let before = metrics().telemetry_dropped.get();
        emitter.record(Action::ExportCsv, Metadata::new());
        emitter.flush(Duration::from_secs(1)).await;
        assert_eq!(sink.count(Action::ExportCsv), 1);
        assert!(metrics().telemetry_dropped.get() > before);
    }

    #[tokio::test]
    async fn test_disabled_emitter_records_nothing() {
        let emitter = TelemetryEmitter::disabled(SessionId::from("s-3"));
        assert!(!emitter.is_enabled());
        emitter.record(Action::PageLoad, Metadata::new());
        emitter.flush(Duration::from_millis(10)).await;
    }

    #[test]
    fn test_record_without_runtime_does_not_panic() {
        let sink = Arc::new(RecordingSink::default());
        let emitter = TelemetryEmitter::new(SessionId::from("s-4"), sink.clone());
        emitter.record(Action::PageLoad, Metadata::new());
        assert!(sink.events().is_empty());
    }
}
