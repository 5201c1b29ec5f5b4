mod error;
mod policy;

pub use error::AccessError;
pub use policy::{Action, Role, Section, can_enter, can_perform, visible_sections};
