pub mod analytics;
pub mod auth;
pub mod chat;
pub mod community;
pub mod consent;
pub mod matches;
pub mod personality;
pub mod profile;
