//! Shared error types for the services crate.

use thiserror::Error;

use remote::RemoteError;

/// Errors emitted by `ProgressStore` mutations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressStoreError {
    #[error("no user is signed in")]
    Unauthenticated,
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
