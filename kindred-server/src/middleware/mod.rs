pub mod auth;
pub mod tracing;

pub use self::auth::{auth_middleware, CurrentUser};
pub use self::tracing::request_id_middleware;
