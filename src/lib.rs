pub mod api;
pub mod config;
pub mod extract;
pub mod memory;
pub mod monitoring;
pub mod session;

pub use config::ApiConfig;
pub use session::{ChatEngine, Session, SessionStore};
