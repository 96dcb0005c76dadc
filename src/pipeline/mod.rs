//! Derivation pipeline: sort → text filter → aggregate by source
//!
//! [`derive`] is the pure transform. [`DerivationPipeline`] memoizes it on
//! (collection identity, sort, search), caching the sort stage separately so
//! that a search change reuses the sorted sequence.

pub mod aggregate;
pub mod filter;
pub mod sort;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::metrics::metrics;
use crate::types::{Lead, LeadCollection, SortState};

pub use aggregate::count_by_source;
pub use filter::{filter_leads, matches_search};
pub use sort::{compare_leads, sort_leads};

/// What the table, the chart and the export all read
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivedView {
    /// Sorted, then text-filtered
    pub leads: Arc<Vec<Lead>>,
    /// Lead count per source over `leads`
    pub source_counts: BTreeMap<String, usize>,
}

impl DerivedView {
    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    /// Sum of the per-source counts; always equals `len()`
    pub fn counted(&self) -> usize {
        self.source_counts.values().sum()
    }
}

/// Pure, unmemoized derivation
pub fn derive(leads: &Arc<Vec<Lead>>, sort: SortState, search: &str) -> DerivedView {
    let sorted = sort_leads(leads, sort);
    build_view(&sorted, search)
}

fn build_view(sorted: &Arc<Vec<Lead>>, search: &str) -> DerivedView {
    let leads = filter_leads(sorted, search);
    let source_counts = count_by_source(&leads);
    DerivedView {
        leads,
        source_counts,
    }
}

struct SortedStage {
    generation: u64,
    input: Arc<Vec<Lead>>,
    sort: SortState,
    output: Arc<Vec<Lead>>,
}

impl SortedStage {
    fn matches(&self, collection: &LeadCollection, sort: SortState) -> bool {
        self.generation == collection.generation
            && Arc::ptr_eq(&self.input, &collection.leads)
            && self.sort == sort
    }
}

struct ViewStage {
    sorted: Arc<Vec<Lead>>,
    search: String,
    view: Arc<DerivedView>,
}

/// Memoizing wrapper around [`derive`]
#[derive(Default)]
pub struct DerivationPipeline {
    sorted: Option<SortedStage>,
    view: Option<ViewStage>,
}

impl DerivationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the view for `collection`, reusing cached stages whose inputs are
    /// unchanged. A full cache hit returns the previous `Arc`.
    pub fn derive(
        &mut self,
        collection: &LeadCollection,
        sort: SortState,
        search: &str,
    ) -> Arc<DerivedView> {
        let sorted = match &self.sorted {
            Some(stage) if stage.matches(collection, sort) => Arc::clone(&stage.output),
            _ => {
                let output = sort_leads(&collection.leads, sort);
                self.sorted = Some(SortedStage {
                    generation: collection.generation,
                    input: Arc::clone(&collection.leads),
                    sort,
                    output: Arc::clone(&output),
                });
                output
            }
        };

        if let Some(stage) = &self.view {
            if Arc::ptr_eq(&stage.sorted, &sorted) && stage.search == search {
                metrics().derivation_cache_hits.inc();
                return Arc::clone(&stage.view);
            }
        }

        let view = Arc::new(build_view(&sorted, search));
        metrics().derivations_computed.inc();
        metrics().visible_leads.set(view.len() as i64);
        tracing::debug!(
            generation = collection.generation,
            sort_key = ?sort.key,
            search = %search,
            visible = view.len(),
            "Derived view recomputed"
        );
        self.view = Some(ViewStage {
            sorted,
            search: search.to_string(),
            view: Arc::clone(&view),
        });
        view
    }

    /// Drop every cached stage
    pub fn invalidate(&mut self) {
        self.sorted = None;
        self.view = None;
    }
}
