use std::time::Duration;

use serde::{Deserialize, Serialize};
use shelf_query::Sort;

use crate::error::ListError;

const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Everything a management screen's list needs to know about its endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    pub id: String,
    pub title: String,
    pub endpoint: String,
    /// Query parameter carrying the search box contents.
    pub search_param: String,
    pub filters: Vec<String>,
    pub sort_keys: Vec<String>,
    pub default_sort: Sort,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Shown when a fetch fails without a server message.
    pub failure_message: String,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ScreenConfig {
    pub const SCREENS: [&'static str; 4] = ["books", "categories", "staff", "users"];

    pub fn books() -> Self {
        Self {
            id: "books".into(),
            title: "Books".into(),
            endpoint: "/books/list".into(),
            search_param: "search".into(),
            filters: names(&[
                "categoryId",
                "author",
                "isPremium",
                "hasChapters",
                "approvalStatus",
                "status",
                "publishedDateFrom",
                "publishedDateTo",
                "minRating",
                "maxRating",
            ]),
            sort_keys: names(&[
                "title",
                "author",
                "createdat",
                "rating",
                "totalratings",
                "totalviews",
            ]),
            default_sort: Sort::desc("createdat"),
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            failure_message: "Failed to load books".into(),
        }
    }

    pub fn categories() -> Self {
        Self {
            id: "categories".into(),
            title: "Book categories".into(),
            endpoint: "/book-categories/list".into(),
            search_param: "name".into(),
            filters: names(&["description", "status"]),
            sort_keys: names(&["name", "description", "status", "createdat", "bookscount"]),
            default_sort: Sort::desc("createdat"),
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            failure_message: "Failed to load categories".into(),
        }
    }

    pub fn staff() -> Self {
        Self {
            id: "staff".into(),
            title: "Staff".into(),
            endpoint: "/staff/list".into(),
            search_param: "fullName".into(),
            filters: names(&["staffCode", "email", "phone", "position", "isActive"]),
            sort_keys: names(&[
                "staffcode",
                "fullname",
                "email",
                "phone",
                "position",
                "createdat",
            ]),
            default_sort: Sort::desc("createdat"),
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            failure_message: "Failed to load staff".into(),
        }
    }

    pub fn users() -> Self {
        Self {
            id: "users".into(),
            title: "Users".into(),
            endpoint: "/users/list".into(),
            search_param: "searchKeyword".into(),
            filters: names(&["gender", "isActive"]),
            sort_keys: names(&[
                "name",
                "firstname",
                "email",
                "username",
                "gender",
                "createdat",
            ]),
            default_sort: Sort::desc("createdat"),
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            failure_message: "Failed to load users".into(),
        }
    }

    pub fn preset(id: &str) -> Result<Self, ListError> {
        match id {
            "books" => Ok(Self::books()),
            "categories" => Ok(Self::categories()),
            "staff" => Ok(Self::staff()),
            "users" => Ok(Self::users()),
            other => Err(ListError::UnknownScreen(other.to_string())),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ListError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn check_filter(&self, key: &str) -> Result<(), ListError> {
        if self.filters.iter().any(|f| f == key) {
            Ok(())
        } else {
            Err(ListError::UnknownFilter {
                screen: self.id.clone(),
                key: key.to_string(),
            })
        }
    }

    pub fn check_sort_key(&self, key: &str) -> Result<(), ListError> {
        if self.sort_keys.iter().any(|k| k == key) {
            Ok(())
        } else {
            Err(ListError::UnknownSortKey {
                screen: self.id.clone(),
                key: key.to_string(),
            })
        }
    }
}
