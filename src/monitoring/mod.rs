//! Monitoring module for docchat
//!
//! Provides:
//! - Structured logging with tracing
//! - Request id assignment and per-request logging

pub mod config;
pub mod request_id;
pub mod tracing_config;

pub use config::{LogFormat, MonitoringConfig};
pub use request_id::{RequestId, RequestIdMiddleware};
pub use tracing_config::init_tracing;
