mod cache;

pub use cache::{DatasetState, ReferenceCache, Snapshot, Subscription};

/// Name of the book-category dropdown dataset.
pub const BOOK_CATEGORIES: &str = "book-categories";
