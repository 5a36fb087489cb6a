mod message;
mod personality;
mod profile;

pub use message::ChatMessage;
pub use personality::PersonalityResult;
pub use profile::{Lifestyle, Profile};
