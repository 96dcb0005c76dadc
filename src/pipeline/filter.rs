//! Text filter stage

use std::sync::Arc;

use crate::types::Lead;

/// Case-insensitive substring match on `name` or `company`.
/// `needle` must already be lower-cased.
pub fn matches_search(lead: &Lead, needle: &str) -> bool {
    lead.name.to_lowercase().contains(needle) || lead.company.to_lowercase().contains(needle)
}

/// Keep the leads matching `search`. An empty search returns the input
/// allocation as-is.
pub fn filter_leads(sorted: &Arc<Vec<Lead>>, search: &str) -> Arc<Vec<Lead>> {
    if search.is_empty() {
        return Arc::clone(sorted);
    }
    let needle = search.to_lowercase();
    Arc::new(
        sorted
            .iter()
            .filter(|lead| matches_search(lead, &needle))
            .cloned()
            .collect(),
    )
}
