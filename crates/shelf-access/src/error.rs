#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("unknown section: {0}")]
    UnknownSection(String),
}
