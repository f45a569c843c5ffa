pub mod assessment;
pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;

pub use error::AppError;
