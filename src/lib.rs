#[cfg(feature = "embed-assets")]
pub mod assets;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod repo;
pub mod routes;
pub mod security;
pub mod views;

// Re-export commonly used items for tests / external users
pub use routes::{config as routes_config, AppState};
pub use security::SecurityHeaders;
