mod filter;
mod page;
mod query;
mod request;
mod sort;

pub use filter::FilterValue;
pub use page::ListResult;
pub use query::ListQuery;
pub use request::ListRequest;
pub use sort::{Sort, SortDirection};
