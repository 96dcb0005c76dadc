//! Integration tests for out-of-order lead responses
//!
//! Whatever order responses arrive in, the visible collection must be the
//! result of the most recently issued request.

use lead_dashboard::errors::DashboardError;
use lead_dashboard::fetch_controller::{FetchController, FetchOutcome};
use lead_dashboard::structured_logging::DashboardLogger;
use lead_dashboard::test_utils::{lead, FailingLeadSource, GatedLeadSource};
use lead_dashboard::types::FilterState;
use std::sync::Arc;

const INDUSTRIES: [&str; 4] = ["Technology", "Manufacturing", "Healthcare", "Finance"];

fn filters(industry: &str) -> FilterState {
    FilterState {
        industry: industry.to_string(),
        ..FilterState::default()
    }
}

fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for (i, first) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, *first);
            out.push(tail);
        }
    }
    out
}

#[tokio::test]
async fn test_latest_request_wins_for_every_arrival_order() {
    let indices: Vec<usize> = (0..INDUSTRIES.len()).collect();
    let latest = INDUSTRIES.len() - 1;

    for order in permutations(&indices) {
        let source = Arc::new(GatedLeadSource::new());
        let controller = FetchController::new(source.clone(), DashboardLogger::detached());

        let mut handles: Vec<_> = INDUSTRIES
            .iter()
            .map(|industry| Some(controller.refresh(&filters(industry))))
            .collect();

        // Complete one request at a time, in `order`, so responses really
        // arrive in that order.
        let mut latest_done = false;
        for &i in &order {
            source.release(INDUSTRIES[i], Ok(vec![lead(i as i64 + 1, INDUSTRIES[i], "Co", "web", 1)]));
            let handle = handles[i].take().unwrap();
            let outcome = handle.await.unwrap();

            if i == latest {
                latest_done = true;
                assert!(outcome.is_applied(), "order {:?}, request {}: {:?}", order, i, outcome);
            } else {
                match outcome {
                    FetchOutcome::Stale { generation, latest: newest } => {
                        assert_eq!(generation, i as u64 + 1);
                        assert_eq!(newest, INDUSTRIES.len() as u64);
                    }
                    other => panic!("order {:?}, request {}: expected stale, got {:?}", order, i, other),
                }
            }

            let snapshot = controller.snapshot();
            if latest_done {
                assert_eq!(snapshot.generation, INDUSTRIES.len() as u64, "order {:?}", order);
                assert_eq!(snapshot.leads[0].id, INDUSTRIES.len() as i64, "order {:?}", order);
                assert!(!controller.is_loading(), "order {:?}", order);
            } else {
                assert_eq!(snapshot.generation, 0, "order {:?}", order);
                assert!(controller.is_loading(), "order {:?}", order);
            }
        }
    }
}

#[tokio::test]
async fn test_older_request_resolving_last_is_discarded() {
    let source = Arc::new(GatedLeadSource::new());
    let controller = FetchController::new(source.clone(), DashboardLogger::detached());

    let old = controller.refresh(&filters("Technology"));
    let new = controller.refresh(&filters("Finance"));

    source.release("Finance", Ok(vec![lead(20, "New", "Fin", "web", 5)]));
    assert!(new.await.unwrap().is_applied());

    source.release("Technology", Ok(vec![lead(10, "Old", "Tech", "web", 5)]));
    match old.await.unwrap() {
        FetchOutcome::Stale { generation, latest } => {
            assert_eq!(generation, 1);
            assert_eq!(latest, 2);
        }
        other => panic!("expected stale outcome, got {:?}", other),
    }

    assert_eq!(controller.snapshot().leads[0].name, "New");
}

#[tokio::test]
async fn test_latest_failure_keeps_earlier_result_hidden() {
    let source = Arc::new(GatedLeadSource::new());
    let controller = FetchController::new(source.clone(), DashboardLogger::detached());

    let first = controller.refresh(&filters("Technology"));
    source.release("Technology", Ok(vec![lead(1, "Ann", "Acme", "web", 5)]));
    assert!(first.await.unwrap().is_applied());

    let older = controller.refresh(&filters("Healthcare"));
    let latest = controller.refresh(&filters("Finance"));

    source.release(
        "Finance",
        Err(DashboardError::Decode {
            url: "http://test".to_string(),
            message: "expected array".to_string(),
        }),
    );
    assert!(matches!(
        latest.await.unwrap(),
        FetchOutcome::Failed { current: true, .. }
    ));
    assert!(!controller.is_loading());

    // superseded before the failure; must not be applied afterwards either
    source.release("Healthcare", Ok(vec![lead(2, "Bob", "Beta", "web", 5)]));
    assert!(older.await.unwrap().is_stale());

    assert_eq!(controller.snapshot().generation, 1);
    assert_eq!(controller.snapshot().leads[0].name, "Ann");
}

#[tokio::test]
async fn test_failing_source_never_panics() {
    let controller = FetchController::new(Arc::new(FailingLeadSource), DashboardLogger::detached());
    let outcome = controller.refresh(&FilterState::default()).await.unwrap();
    match outcome {
        FetchOutcome::Failed { error, current, .. } => {
            assert!(current);
            assert!(error.is_transport());
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(controller.snapshot().is_empty());
    assert!(!controller.is_loading());
}
