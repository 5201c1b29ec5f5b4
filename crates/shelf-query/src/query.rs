use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::filter::FilterValue;
use crate::request::ListRequest;
use crate::sort::{Sort, SortDirection};

/// A screen's current query intent.
///
/// Changing the text, a filter or the sort invalidates the page cursor, so
/// every mutator except [`ListQuery::set_page`] puts the query back on page 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    free_text: String,
    filters: BTreeMap<String, FilterValue>,
    sort: Sort,
    page_number: u32,
    page_size: u32,
}

impl ListQuery {
    pub fn new(page_size: u32, sort: Sort) -> Self {
        Self {
            free_text: String::new(),
            filters: BTreeMap::new(),
            sort,
            page_number: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn free_text(&self) -> &str {
        &self.free_text
    }

    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    pub fn filter(&self, key: &str) -> Option<&FilterValue> {
        self.filters.get(key)
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    // ── Mutators ────────────────────────────────────────────────

    pub fn set_free_text(&mut self, text: impl Into<String>) {
        self.free_text = text.into();
        self.page_number = 1;
    }

    /// Select a filter value. An unset value (blank text) removes the key.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        if value.is_unset() {
            self.filters.remove(&key);
        } else {
            self.filters.insert(key, value);
        }
        self.page_number = 1;
    }

    pub fn clear_filter(&mut self, key: &str) {
        self.filters.remove(key);
        self.page_number = 1;
    }

    pub fn set_sort(&mut self, key: impl Into<String>, direction: SortDirection) {
        self.sort = Sort {
            key: key.into(),
            direction,
        };
        self.page_number = 1;
    }

    /// Column-header behaviour: the active key flips direction, a new key
    /// starts ascending.
    pub fn toggle_sort(&mut self, key: &str) {
        let direction = if self.sort.key == key {
            self.sort.direction.reversed()
        } else {
            SortDirection::Asc
        };
        self.set_sort(key, direction);
    }

    /// Move the page cursor. Page numbers are 1-based; 0 is clamped to 1.
    pub fn set_page(&mut self, page_number: u32) {
        self.page_number = page_number.max(1);
    }

    // ── Derivation ──────────────────────────────────────────────

    /// The normalized request for the current state. Blank text and unset
    /// filters are left out so the server sees "no constraint".
    pub fn to_request(&self) -> ListRequest {
        let search = self.free_text.trim();
        ListRequest {
            search: (!search.is_empty()).then(|| search.to_string()),
            filters: self
                .filters
                .iter()
                .filter(|(_, v)| !v.is_unset())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            sort: self.sort.clone(),
            page_number: self.page_number,
            page_size: self.page_size,
        }
    }
}
