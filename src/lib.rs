pub mod adapter;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;
pub mod telemetry;

pub use config::PayrollPolicyConfig;
pub use error::EngineError;
