#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("screen '{screen}' has no filter '{key}'")]
    UnknownFilter { screen: String, key: String },

    #[error("screen '{screen}' cannot sort by '{key}'")]
    UnknownSortKey { screen: String, key: String },

    #[error("page numbers start at 1, got {0}")]
    InvalidPage(u32),

    #[error("unknown screen: {0}")]
    UnknownScreen(String),

    #[error("invalid screen config: {0}")]
    Config(#[from] serde_json::Error),
}
