/// Error taxonomy shared by the storage service and the sidebar
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SidebarError {
    /// Malformed or empty URL, shown inline next to the input
    #[error("{0}")]
    Validation(String),

    #[error("This link is already in your sidebar")]
    Duplicate,

    /// Import file that is not JSON or lacks a `urls` list
    #[error("{0}")]
    Format(String),

    /// Backend persistence failure; never fatal
    #[error("Storage error: {0}")]
    Storage(String),

    /// Message payload of the wrong shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SidebarError {
    pub fn storage(context: &str, detail: impl std::fmt::Debug) -> Self {
        SidebarError::Storage(format!("{}: {:?}", context, detail))
    }
}
