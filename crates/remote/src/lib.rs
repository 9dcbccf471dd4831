#![forbid(unsafe_code)]

pub mod api;
pub mod http;

pub use api::{InMemoryProgressApi, ProgressApi, RemoteError, RemoteProgress};
pub use http::{HttpProgressApi, RemoteConfig};
