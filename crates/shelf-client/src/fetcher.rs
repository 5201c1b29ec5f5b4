use futures::future::BoxFuture;
use shelf_query::{ListRequest, ListResult};

use crate::error::FetchError;
use crate::models::DropdownOption;

/// Fetches one page of a list endpoint.
///
/// The returned future is created when `fetch` is called, so the call order
/// is the issue order. Implementations must not rely on the future being
/// polled to completion; callers may discard it.
pub trait ListFetcher: Send + Sync + 'static {
    type Item: Send + Sync + 'static;

    fn fetch(
        &self,
        request: ListRequest,
    ) -> BoxFuture<'static, Result<ListResult<Self::Item>, FetchError>>;
}

/// Loads a small reference dataset (dropdown options).
pub trait ReferenceSource: Send + Sync + 'static {
    fn fetch_options(&self) -> BoxFuture<'static, Result<Vec<DropdownOption>, FetchError>>;
}
