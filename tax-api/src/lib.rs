//! Request boundary, payment tracker, configuration, and logging for the
//! `taxscope` front end.

pub mod config;
pub mod handlers;
pub mod logging;
pub mod request;
pub mod tracker;

pub use config::{AppConfig, ConfigError};
pub use handlers::{ApiContext, ApiError, ApiResponse, handle_calculate, handle_quarterly};
pub use request::{CalculateRequest, QuarterlyRequest, RequestError};
pub use tracker::{PaymentTracker, QuarterStatus, TrackedQuarter, TrackerError};
