use std::fmt;
use std::sync::Arc;

use shelf_query::{ListQuery, ListResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Free text changed; waiting for the typing to settle.
    Debouncing,
    /// The latest issued request has not resolved yet.
    Fetching,
}

/// What a screen renders: the query, the last committed page and the last
/// error.
pub struct ListView<T> {
    pub query: ListQuery,
    pub result: Option<Arc<ListResult<T>>>,
    pub error: Option<String>,
    pub phase: Phase,
    /// Generation of the latest issued request.
    pub generation: u64,
}

impl<T> ListView<T> {
    pub fn items(&self) -> &[T] {
        match &self.result {
            Some(result) => &result.items,
            None => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn total_count(&self) -> u64 {
        self.result.as_ref().map_or(0, |r| r.total_count)
    }

    pub fn total_pages(&self) -> u32 {
        self.result.as_ref().map_or(0, |r| r.total_pages)
    }
}

impl<T> Clone for ListView<T> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
            phase: self.phase,
            generation: self.generation,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ListView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListView")
            .field("query", &self.query)
            .field("result", &self.result)
            .field("error", &self.error)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .finish()
    }
}
