//! Aggregate stage

use std::collections::BTreeMap;

use crate::types::Lead;

/// Count leads per `source`. Sources with no leads are absent.
pub fn count_by_source(leads: &[Lead]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for lead in leads {
        *counts.entry(lead.source.clone()).or_insert(0) += 1;
    }
    counts
}
