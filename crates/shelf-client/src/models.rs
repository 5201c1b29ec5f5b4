use serde::{Deserialize, Serialize};
use shelf_query::FilterValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub has_chapters: bool,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_ratings: u64,
    #[serde(default)]
    pub total_views: u64,
    #[serde(default)]
    pub published_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub books_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub staff_code: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender_name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Book approval workflow state, as the `approvalStatus` filter encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    Pending = 0,
    Approved = 1,
    Rejected = 2,
}

impl From<ApprovalStatus> for FilterValue {
    fn from(status: ApprovalStatus) -> Self {
        FilterValue::Int(status as i64)
    }
}

/// Staff `position` filter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffPosition {
    Administrator = 1,
    Staff = 2,
    UserManager = 3,
    LibraryManager = 4,
}

impl From<StaffPosition> for FilterValue {
    fn from(position: StaffPosition) -> Self {
        FilterValue::Int(position as i64)
    }
}
