pub mod config;
pub mod demo;
pub mod error;
pub mod models;
pub mod observability;

pub use error::AuthError;
pub use models::{AuthUser, StoredSession};
