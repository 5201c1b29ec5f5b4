mod config;
mod controller;
mod error;
mod view;

pub use config::ScreenConfig;
pub use controller::{ListController, Outcome, Refresh};
pub use error::ListError;
pub use view::{ListView, Phase};
