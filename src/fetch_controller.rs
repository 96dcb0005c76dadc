//! Lead fetch controller
//!
//! Every `refresh` takes a generation number at call time, before any network
//! await. When its response arrives the generation is compared with the latest
//! one issued; only an exact match may replace the visible collection or clear
//! the loading flag. Superseded responses still complete, but their result is
//! dropped.
//!
//! The issue step and the compare-and-apply step each run inside one short
//! critical section so they stay ordered on a multi-threaded runtime. Nothing
//! is held across an await.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::errors::DashboardError;
use crate::lead_source::{LeadQuery, LeadSource};
use crate::metrics::{metrics, Timer};
use crate::structured_logging::DashboardLogger;
use crate::types::{FilterState, Lead, LeadCollection};

/// How a single refresh ended
#[derive(Debug)]
pub enum FetchOutcome {
    /// The response replaced the visible collection
    Applied { generation: u64, lead_count: usize },
    /// A newer request was issued before this one finished
    Stale { generation: u64, latest: u64 },
    /// The request failed; the visible collection is unchanged
    Failed {
        generation: u64,
        error: DashboardError,
        /// Whether this was still the latest request when it failed
        current: bool,
    },
}

impl FetchOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            FetchOutcome::Applied { generation, .. }
            | FetchOutcome::Stale { generation, .. }
            | FetchOutcome::Failed { generation, .. } => *generation,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied { .. })
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, FetchOutcome::Stale { .. })
    }
}

#[derive(Debug, Default)]
struct Generation {
    latest: u64,
    loading: bool,
}

struct Shared {
    gate: Mutex<Generation>,
    collection: ArcSwap<LeadCollection>,
}

/// Issues lead queries and keeps the most recent result
#[derive(Clone)]
pub struct FetchController {
    source: Arc<dyn LeadSource>,
    shared: Arc<Shared>,
    logger: DashboardLogger,
}

impl FetchController {
    pub fn new(source: Arc<dyn LeadSource>, logger: DashboardLogger) -> Self {
        Self {
            source,
            shared: Arc::new(Shared {
                gate: Mutex::new(Generation::default()),
                collection: ArcSwap::from_pointee(LeadCollection::empty()),
            }),
            logger,
        }
    }

    /// Start a fetch for `filters` and return immediately.
    ///
    /// Must be called from within a tokio runtime. The returned handle may be
    /// dropped; the fetch runs to completion either way and never panics or
    /// returns an error to the caller.
    pub fn refresh(&self, filters: &FilterState) -> JoinHandle<FetchOutcome> {
        let query = LeadQuery::from_filters(filters);
        let generation = self.issue();
        self.logger
            .log_fetch_issued(generation, query.industry.as_deref(), query.min_size);

        let controller = self.clone();
        tokio::spawn(async move { controller.run(generation, query).await })
    }

    /// Latest applied collection
    pub fn snapshot(&self) -> Arc<LeadCollection> {
        self.shared.collection.load_full()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.gate.lock().loading
    }

    /// Generation of the most recently issued request
    pub fn latest_generation(&self) -> u64 {
        self.shared.gate.lock().latest
    }

    fn issue(&self) -> u64 {
        let mut gate = self.shared.gate.lock();
        gate.latest += 1;
        gate.loading = true;
        metrics().fetches_issued.inc();
        gate.latest
    }

    async fn run(self, generation: u64, query: LeadQuery) -> FetchOutcome {
        let m = metrics();
        m.fetches_in_flight.inc();
        let timer = Timer::new();
        let result = self.source.fetch(&query).await;
        timer.observe_duration(&m.fetch_latency);
        m.fetches_in_flight.dec();

        self.complete(generation, result, timer.elapsed_ms())
    }

    fn complete(
        &self,
        generation: u64,
        result: Result<Vec<Lead>, DashboardError>,
        latency_ms: u64,
    ) -> FetchOutcome {
        let mut gate = self.shared.gate.lock();
        let current = gate.latest == generation;
        if current {
            gate.loading = false;
        }

        match result {
            Ok(leads) if current => {
                let lead_count = leads.len();
                self.shared
                    .collection
                    .store(Arc::new(LeadCollection::new(generation, leads)));
                metrics().fetches_applied.inc();
                self.logger
                    .log_fetch_applied(generation, lead_count, latency_ms);
                FetchOutcome::Applied {
                    generation,
                    lead_count,
                }
            }
            Ok(_) => {
                metrics().fetches_stale.inc();
                self.logger.log_fetch_stale(generation, gate.latest);
                FetchOutcome::Stale {
                    generation,
                    latest: gate.latest,
                }
            }
            Err(error) => {
                metrics().fetches_failed.inc();
                self.logger
                    .log_fetch_failed(generation, &error.to_string(), current);
                FetchOutcome::Failed {
                    generation,
                    error,
                    current,
                }
            }
        }
    }
}

impl std::fmt::Debug for FetchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let gate = self.shared.gate.lock();
        f.debug_struct("FetchController")
            .field("latest", &gate.latest)
            .field("loading", &gate.loading)
            .field("applied_generation", &self.shared.collection.load().generation)
            .finish()
    }
}
