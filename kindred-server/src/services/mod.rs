pub mod identity;
pub mod matching;
pub mod store;
pub mod verify;

pub use identity::{HttpIdentityProvider, IdentityProvider, MockIdentityProvider};
pub use store::{KeyValueStore, MemoryStore, RedisStore};
