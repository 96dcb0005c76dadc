//! Sort stage

use std::cmp::Ordering;
use std::sync::Arc;

use crate::types::{FieldValue, Lead, LeadField, SortDirection, SortState};

/// Order two leads by `field`.
///
/// Missing values go last in both directions; `direction` only reverses the
/// comparison between present values.
pub fn compare_leads(a: &Lead, b: &Lead, field: LeadField, direction: SortDirection) -> Ordering {
    match (a.field(field), b.field(field)) {
        (FieldValue::Missing, FieldValue::Missing) => Ordering::Equal,
        (FieldValue::Missing, _) => Ordering::Greater,
        (_, FieldValue::Missing) => Ordering::Less,
        (x, y) => {
            let ordering = compare_values(x, y);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
    }
}

fn compare_values(x: FieldValue<'_>, y: FieldValue<'_>) -> Ordering {
    match (x, y) {
        (FieldValue::Number(a), FieldValue::Number(b)) => a.cmp(&b),
        (FieldValue::Text(a), FieldValue::Text(b)) => caseless_cmp(a, b),
        (FieldValue::Number(a), FieldValue::Text(b)) => caseless_cmp(&a.to_string(), b),
        (FieldValue::Text(a), FieldValue::Number(b)) => caseless_cmp(a, &b.to_string()),
        // handled by the caller
        (FieldValue::Missing, _) | (_, FieldValue::Missing) => Ordering::Equal,
    }
}

fn caseless_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Stable sort of `leads` by `sort`. Without a key the input allocation is
/// returned as-is.
pub fn sort_leads(leads: &Arc<Vec<Lead>>, sort: SortState) -> Arc<Vec<Lead>> {
    let Some(field) = sort.key else {
        return Arc::clone(leads);
    };
    let mut sorted = leads.as_ref().clone();
    sorted.sort_by(|a, b| compare_leads(a, b, field, sort.direction));
    Arc::new(sorted)
}
