use crate::types::{SearchOutput, SearchRequest};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Failed to launch '{program}': {reason}")]
    Launch { program: String, reason: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Bind-and-search access to a directory server.
///
/// A non-zero client exit is not an error: it comes back as a
/// [`SearchOutput`] so callers can classify it. `Err` means the client
/// could not be run at all.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> DirectoryResult<SearchOutput>;

    fn client_name(&self) -> &'static str;
}
