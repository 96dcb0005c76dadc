//! Test Utilities Module
//!
//! Deterministic stand-ins for the remote collaborators: lead sources whose
//! responses the test releases by hand, and telemetry sinks that record or
//! fail. Integration tests under `tests/` use them through the `test_utils`
//! feature.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;

use crate::errors::DashboardError;
use crate::lead_source::{LeadQuery, LeadSource};
use crate::telemetry::{Action, Event, TelemetrySink};
use crate::types::Lead;

/// Build a lead with the fields the pipeline looks at
pub fn lead(id: i64, name: &str, company: &str, source: &str, size: u64) -> Lead {
    Lead {
        id,
        name: name.to_string(),
        company: company.to_string(),
        industry: "Technology".to_string(),
        size,
        source: source.to_string(),
        created_at: format!("2024-01-{:02}T09:00:00", (id.rem_euclid(28)) + 1),
        quality: None,
        summary: None,
    }
}

/// The three leads used throughout the docs and tests
pub fn sample_leads() -> Vec<Lead> {
    vec![
        lead(1, "Ann", "Acme", "web", 50),
        lead(2, "Bob", "Beta", "web", 10),
        lead(3, "Cid", "Gamma", "ref", 30),
    ]
}

/// Always answers with the same leads and remembers every query
#[derive(Debug, Default)]
pub struct StaticLeadSource {
    leads: Vec<Lead>,
    queries: Mutex<Vec<LeadQuery>>,
}

impl StaticLeadSource {
    pub fn new(leads: Vec<Lead>) -> Self {
        Self {
            leads,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<LeadQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl LeadSource for StaticLeadSource {
    async fn fetch(&self, query: &LeadQuery) -> Result<Vec<Lead>, DashboardError> {
        self.queries.lock().push(query.clone());
        Ok(self.leads.clone())
    }
}

type GateResult = Result<Vec<Lead>, DashboardError>;

#[derive(Default)]
struct Gates {
    senders: HashMap<String, oneshot::Sender<GateResult>>,
    receivers: HashMap<String, oneshot::Receiver<GateResult>>,
}

impl Gates {
    fn ensure(&mut self, key: &str) {
        if !self.senders.contains_key(key) && !self.receivers.contains_key(key) {
            let (tx, rx) = oneshot::channel();
            self.senders.insert(key.to_string(), tx);
            self.receivers.insert(key.to_string(), rx);
        }
    }
}

/// Holds each query until the test releases it, keyed by industry
/// (empty string for no industry filter). Release order is response order.
#[derive(Default)]
pub struct GatedLeadSource {
    gates: Mutex<Gates>,
}

impl GatedLeadSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the pending (or next) query for `industry`
    pub fn release(&self, industry: &str, result: GateResult) {
        let sender = {
            let mut gates = self.gates.lock();
            gates.ensure(industry);
            gates.senders.remove(industry)
        };
        if let Some(tx) = sender {
            let _ = tx.send(result);
        }
    }
}

#[async_trait]
impl LeadSource for GatedLeadSource {
    async fn fetch(&self, query: &LeadQuery) -> Result<Vec<Lead>, DashboardError> {
        let key = query.industry.clone().unwrap_or_default();
        let receiver = {
            let mut gates = self.gates.lock();
            gates.ensure(&key);
            gates.receivers.remove(&key)
        };
        match receiver {
            Some(rx) => rx.await.unwrap_or_else(|_| {
                Err(DashboardError::Transport {
                    url: "gated://".to_string(),
                    message: "gate dropped".to_string(),
                })
            }),
            None => Err(DashboardError::Transport {
                url: "gated://".to_string(),
                message: format!("query for '{}' already pending", key),
            }),
        }
    }
}

/// Lead source that is always unreachable
#[derive(Debug, Default)]
pub struct FailingLeadSource;

#[async_trait]
impl LeadSource for FailingLeadSource {
    async fn fetch(&self, _query: &LeadQuery) -> Result<Vec<Lead>, DashboardError> {
        Err(DashboardError::Transport {
            url: "failing://".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

/// Telemetry sink that keeps every event it is handed. A failing sink still
/// records the attempt, then reports an error.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
    fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Number of recorded events for `action`
    pub fn count(&self, action: Action) -> usize {
        self.events.lock().iter().filter(|e| e.action == action).count()
    }
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    async fn send(&self, event: &Event) -> Result<(), DashboardError> {
        self.events.lock().push(event.clone());
        if self.fail {
            return Err(DashboardError::Status {
                url: "failing://".to_string(),
                status: 503,
            });
        }
        Ok(())
    }
}
