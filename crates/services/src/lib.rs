#![forbid(unsafe_code)]

pub mod error;
pub mod identity;
pub mod progress_store;

pub use error::ProgressStoreError;
pub use identity::{IdentitySource, SharedIdentity};
pub use progress_store::ProgressStore;
