//! Dashboard orchestrator
//!
//! Owns the view state and the derivation cache, and routes each user action
//! to the fetch controller and the telemetry emitter. Every action method
//! records its telemetry event exactly once per call, whatever happens to
//! the data operation behind it.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::export::ExportArtifact;
use crate::fetch_controller::{FetchController, FetchOutcome};
use crate::metrics::metrics;
use crate::pipeline::{DerivationPipeline, DerivedView};
use crate::preferences::PreferenceStore;
use crate::structured_logging::DashboardLogger;
use crate::telemetry::{metadata, Action, Metadata, TelemetryEmitter};
use crate::types::{LeadField, SortState, ViewMode};
use crate::view_state::ViewState;

/// Handle to a refetch started by an action
pub type PendingFetch = JoinHandle<FetchOutcome>;

pub struct Dashboard {
    fetcher: FetchController,
    telemetry: TelemetryEmitter,
    prefs: PreferenceStore,
    state: ViewState,
    pipeline: DerivationPipeline,
    dark_mode: bool,
    export_file_name: String,
    logger: DashboardLogger,
}

impl Dashboard {
    pub fn new(
        fetcher: FetchController,
        telemetry: TelemetryEmitter,
        prefs: PreferenceStore,
        export_file_name: impl Into<String>,
    ) -> Self {
        let dark_mode = prefs.dark_mode();
        let logger = DashboardLogger::new(telemetry.session_id().as_str());
        Self {
            fetcher,
            telemetry,
            prefs,
            state: ViewState::new(),
            pipeline: DerivationPipeline::new(),
            dark_mode,
            export_file_name: export_file_name.into(),
            logger,
        }
    }

    /// Initial load: fetch with the current filters and record `page_load`
    pub fn start(&mut self) -> PendingFetch {
        let pending = self.fetcher.refresh(self.state.filters());
        self.telemetry.record(Action::PageLoad, Metadata::new());
        pending
    }

    pub fn set_industry(&mut self, industry: &str) -> Option<PendingFetch> {
        let changed = self.state.set_industry(industry);
        self.telemetry.record(
            Action::IndustryFilter,
            metadata(json!({ "industry": industry })),
        );
        changed.then(|| self.fetcher.refresh(self.state.filters()))
    }

    /// Set the minimum size from raw control input
    pub fn set_min_size(&mut self, raw: &str) -> Option<PendingFetch> {
        let (size, changed) = self.state.set_min_size_raw(raw);
        self.telemetry
            .record(Action::SizeFilter, metadata(json!({ "size": size })));
        changed.then(|| self.fetcher.refresh(self.state.filters()))
    }

    /// Local text filter; no refetch and no event
    pub fn set_search(&mut self, search: &str) {
        self.state.set_search(search);
    }

    /// Toggle sorting on `key`; returns the resulting sort
    pub fn sort_by(&mut self, key: LeadField) -> SortState {
        let sort = self.state.toggle_sort(key);
        self.record_sort(sort);
        sort
    }

    /// Set an explicit sort (key and direction)
    pub fn set_sort(&mut self, sort: SortState) {
        self.state.set_sort(sort);
        self.record_sort(sort);
    }

    fn record_sort(&self, sort: SortState) {
        let key = sort.key.map(|k| k.as_str()).unwrap_or_default();
        self.telemetry.record(
            Action::Sort,
            metadata(json!({ "key": key, "direction": sort.direction.as_str() })),
        );
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.state.set_view(view);
        self.telemetry
            .record(Action::ToggleView, metadata(json!({ "view": view.as_str() })));
    }

    /// Switch between table and chart; returns the new mode
    pub fn toggle_view(&mut self) -> ViewMode {
        let next = match self.state.view() {
            ViewMode::Table => ViewMode::Chart,
            ViewMode::Chart => ViewMode::Table,
        };
        self.set_view(next);
        next
    }

    /// Refetch with the current filters
    pub fn refresh(&mut self) -> PendingFetch {
        let pending = self.fetcher.refresh(self.state.filters());
        self.telemetry.record(Action::Refresh, Metadata::new());
        pending
    }

    /// Clear industry and minimum size; refetch only if either changed
    pub fn reset(&mut self) -> Option<PendingFetch> {
        let changed = self.state.reset();
        self.telemetry.record(Action::ResetFilters, Metadata::new());
        changed.then(|| self.fetcher.refresh(self.state.filters()))
    }

    /// Serialize the current view to CSV
    pub fn export(&mut self) -> ExportArtifact {
        let view = self.view();
        let artifact = ExportArtifact::from_view(self.export_file_name.clone(), &view);
        metrics().exports_total.inc();
        self.logger
            .log_export(&artifact.file_name, artifact.rows, artifact.contents.len());
        self.telemetry.record(Action::ExportCsv, Metadata::new());
        artifact
    }

    /// Flip dark mode and persist it; returns the new value
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.prefs.set_dark_mode(self.dark_mode);
        self.dark_mode
    }

    /// Derived view of the latest applied collection
    pub fn view(&mut self) -> Arc<DerivedView> {
        let collection = self.fetcher.snapshot();
        self.pipeline.derive(
            &collection,
            self.state.sort(),
            &self.state.filters().search_text,
        )
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.fetcher.is_loading()
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn telemetry(&self) -> &TelemetryEmitter {
        &self.telemetry
    }

    /// Wait for pending telemetry before shutdown
    pub async fn flush_telemetry(&self, timeout: Duration) {
        self.telemetry.flush(timeout).await;
    }
}
