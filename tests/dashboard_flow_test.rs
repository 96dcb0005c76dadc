//! End-to-end dashboard flows with in-process collaborators

use lead_dashboard::dashboard::Dashboard;
use lead_dashboard::fetch_controller::FetchController;
use lead_dashboard::preferences::PreferenceStore;
use lead_dashboard::session::SessionProvider;
use lead_dashboard::structured_logging::DashboardLogger;
use lead_dashboard::telemetry::{Action, TelemetryEmitter};
use lead_dashboard::test_utils::{sample_leads, FailingLeadSource, RecordingSink, StaticLeadSource};
use lead_dashboard::types::{LeadField, SortDirection, ViewMode};
use std::sync::Arc;
use std::time::Duration;

fn dashboard_with(
    source: Arc<dyn lead_dashboard::lead_source::LeadSource>,
    sink: Arc<RecordingSink>,
    prefs: PreferenceStore,
) -> Dashboard {
    let session = SessionProvider::new(prefs.clone()).session_id();
    let fetcher = FetchController::new(source, DashboardLogger::new(session.as_str()));
    let telemetry = TelemetryEmitter::new(session, sink);
    Dashboard::new(fetcher, telemetry, prefs, "leads.csv")
}

#[tokio::test]
async fn test_each_action_records_exactly_one_event() {
    let source = Arc::new(StaticLeadSource::new(sample_leads()));
    let sink = Arc::new(RecordingSink::default());
    let mut dashboard = dashboard_with(source.clone(), sink.clone(), PreferenceStore::in_memory());

    dashboard.start().await.unwrap();
    dashboard.set_industry("Technology").unwrap().await.unwrap();
    dashboard.set_min_size("20").unwrap().await.unwrap();
    dashboard.set_search("a");
    dashboard.sort_by(LeadField::Name);
    dashboard.sort_by(LeadField::Name);
    dashboard.toggle_view();
    dashboard.refresh().await.unwrap();
    dashboard.reset().unwrap().await.unwrap();
    dashboard.export();
    dashboard.toggle_dark_mode();
    dashboard.flush_telemetry(Duration::from_secs(1)).await;

    assert_eq!(sink.count(Action::PageLoad), 1);
    assert_eq!(sink.count(Action::IndustryFilter), 1);
    assert_eq!(sink.count(Action::SizeFilter), 1);
    assert_eq!(sink.count(Action::Sort), 2);
    assert_eq!(sink.count(Action::ToggleView), 1);
    assert_eq!(sink.count(Action::Refresh), 1);
    assert_eq!(sink.count(Action::ResetFilters), 1);
    assert_eq!(sink.count(Action::ExportCsv), 1);
    assert_eq!(sink.events().len(), 9);

    // start, industry, size, refresh, reset
    assert_eq!(source.queries().len(), 5);

    let session = dashboard.telemetry().session_id().clone();
    assert!(sink.events().iter().all(|e| e.user_id == session));
}

#[tokio::test]
async fn test_sort_event_carries_resulting_direction() {
    let sink = Arc::new(RecordingSink::default());
    let mut dashboard = dashboard_with(
        Arc::new(StaticLeadSource::new(sample_leads())),
        sink.clone(),
        PreferenceStore::in_memory(),
    );

    assert_eq!(dashboard.sort_by(LeadField::Size).direction, SortDirection::Ascending);
    dashboard.flush_telemetry(Duration::from_secs(1)).await;
    assert_eq!(dashboard.sort_by(LeadField::Size).direction, SortDirection::Descending);
    dashboard.flush_telemetry(Duration::from_secs(1)).await;

    let directions: Vec<String> = sink
        .events()
        .iter()
        .map(|e| e.metadata["direction"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(directions, vec!["asc", "desc"]);
    assert!(sink.events().iter().all(|e| e.metadata["key"] == "size"));
}

#[tokio::test]
async fn test_scenario_view_after_sort_and_search() {
    let sink = Arc::new(RecordingSink::default());
    let mut dashboard = dashboard_with(
        Arc::new(StaticLeadSource::new(sample_leads())),
        sink,
        PreferenceStore::in_memory(),
    );
    dashboard.start().await.unwrap();

    dashboard.sort_by(LeadField::Size);
    let ids: Vec<i64> = dashboard.view().leads.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);

    dashboard.set_search("e");
    let view = dashboard.view();
    let ids: Vec<i64> = view.leads.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(view.source_counts.get("web"), Some(&2));
    assert_eq!(view.source_counts.len(), 1);
}

#[tokio::test]
async fn test_failures_do_not_reach_the_caller() {
    let sink = Arc::new(RecordingSink::failing());
    let mut dashboard = dashboard_with(Arc::new(FailingLeadSource), sink.clone(), PreferenceStore::in_memory());

    dashboard.start().await.unwrap();
    dashboard.refresh().await.unwrap();
    assert!(dashboard.view().is_empty());
    assert!(!dashboard.is_loading());

    // telemetry sends were attempted and failed silently
    dashboard.flush_telemetry(Duration::from_secs(1)).await;
    assert_eq!(sink.count(Action::PageLoad), 1);
    assert_eq!(sink.count(Action::Refresh), 1);

    let artifact = dashboard.export();
    assert_eq!(artifact.rows, 0);
}

#[tokio::test]
async fn test_dark_mode_and_session_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");

    let first_session = {
        let prefs = PreferenceStore::file(&path);
        let mut dashboard = dashboard_with(
            Arc::new(StaticLeadSource::new(Vec::new())),
            Arc::new(RecordingSink::default()),
            prefs,
        );
        assert!(!dashboard.dark_mode());
        assert!(dashboard.toggle_dark_mode());
        dashboard.telemetry().session_id().clone()
    };

    let prefs = PreferenceStore::file(&path);
    let mut dashboard = dashboard_with(Arc::new(StaticLeadSource::new(Vec::new())), Arc::new(RecordingSink::default()), prefs);
    assert!(dashboard.dark_mode());
    assert_eq!(dashboard.telemetry().session_id(), &first_session);
    assert_eq!(dashboard.state().view(), ViewMode::Table);
    assert!(!dashboard.toggle_dark_mode());
}
