//! User-controlled view state: filters, sort and display mode

use crate::types::{coerce_min_size, FilterState, LeadField, SortState, ViewMode};

/// Everything the user can change about what is shown.
///
/// Setters for the remote-query inputs (`industry`, `min_size`) report
/// whether a refetch is needed. Search and sort are local and never do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    filters: FilterState,
    sort: SortState,
    view: ViewMode,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Returns true when the industry actually changed
    pub fn set_industry(&mut self, industry: &str) -> bool {
        if self.filters.industry == industry {
            return false;
        }
        self.filters.industry = industry.to_string();
        true
    }

    /// Set the minimum size; returns true when it actually changed
    pub fn set_min_size(&mut self, min_size: u64) -> bool {
        if self.filters.min_size == min_size {
            return false;
        }
        self.filters.min_size = min_size;
        true
    }

    /// Coerce raw control input, then set it. Returns the coerced value and
    /// whether it changed.
    pub fn set_min_size_raw(&mut self, raw: &str) -> (u64, bool) {
        let size = coerce_min_size(raw);
        (size, self.set_min_size(size))
    }

    pub fn set_search(&mut self, search: &str) {
        if self.filters.search_text != search {
            self.filters.search_text = search.to_string();
        }
    }

    /// Toggle sorting on `key` and return the resulting sort
    pub fn toggle_sort(&mut self, key: LeadField) -> SortState {
        self.sort = self.sort.toggled(key);
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    /// Clear industry and minimum size. Search, sort and view are kept.
    /// Returns true when either query input changed.
    pub fn reset(&mut self) -> bool {
        let industry = self.set_industry("");
        let size = self.set_min_size(0);
        industry || size
    }
}
