use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AccessError;

/// An entry of the signed-in user's `app_role` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Staff,
    Other(String),
}

impl Role {
    /// Parse a comma separated role list such as `Admin,Staff`.
    pub fn parse_list(roles: &str) -> Vec<Role> {
        roles
            .split(',')
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .map(Role::from)
            .collect()
    }
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        match role {
            "Admin" => Role::Admin,
            "Staff" => Role::Staff,
            other => Role::Other(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        match Role::from(role.as_str()) {
            Role::Other(_) => Role::Other(role),
            known => known,
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("Admin"),
            Role::Staff => f.write_str("Staff"),
            Role::Other(role) => f.write_str(role),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Dashboard,
    Users,
    Staff,
    Books,
    Categories,
    Premium,
    Support,
    Approval,
    Feedback,
    Notifications,
}

impl Section {
    /// Sidebar order.
    pub const ALL: [Section; 10] = [
        Section::Dashboard,
        Section::Users,
        Section::Staff,
        Section::Books,
        Section::Categories,
        Section::Premium,
        Section::Support,
        Section::Approval,
        Section::Feedback,
        Section::Notifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Users => "users",
            Section::Staff => "staff",
            Section::Books => "books",
            Section::Categories => "categories",
            Section::Premium => "premium",
            Section::Support => "support",
            Section::Approval => "approval",
            Section::Feedback => "feedback",
            Section::Notifications => "notifications",
        }
    }

    fn open_to_staff(&self) -> bool {
        matches!(
            self,
            Section::Books | Section::Support | Section::Feedback | Section::Notifications
        )
    }
}

impl FromStr for Section {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| AccessError::UnknownSection(s.to_string()))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View(Section),
    CreateBook,
    UpdateBookStatus,
    CreateCategory,
    CreateStaff,
    UpdateUserStatus,
}

/// Whether any of `roles` may perform `action`.
pub fn can_perform(roles: &[Role], action: Action) -> bool {
    if roles.contains(&Role::Admin) {
        return true;
    }
    if !roles.contains(&Role::Staff) {
        return false;
    }
    match action {
        Action::View(section) => section.open_to_staff(),
        Action::CreateBook => true,
        Action::UpdateBookStatus
        | Action::CreateCategory
        | Action::CreateStaff
        | Action::UpdateUserStatus => false,
    }
}

/// Whether `roles` may open the console at all.
pub fn can_enter(roles: &[Role]) -> bool {
    roles.iter().any(|role| matches!(role, Role::Admin | Role::Staff))
}

pub fn visible_sections(roles: &[Role]) -> Vec<Section> {
    Section::ALL
        .into_iter()
        .filter(|section| can_perform(roles, Action::View(*section)))
        .collect()
}
