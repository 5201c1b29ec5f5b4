mod config;
mod envelope;
mod error;
mod fetcher;
mod models;
mod transport;

pub use config::ClientConfig;
pub use envelope::{decode_list, decode_options};
pub use error::{CONNECTIVITY_MESSAGE, FetchError};
pub use fetcher::{ListFetcher, ReferenceSource};
pub use models::{ApprovalStatus, Book, BookCategory, DropdownOption, Staff, StaffPosition, User};
pub use transport::{HttpClient, HttpListFetcher, HttpReferenceSource};
