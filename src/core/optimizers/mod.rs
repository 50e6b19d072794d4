pub mod adam;
pub mod config;

pub use adam::{AdamOptimizer, AdamState};
pub use config::{AdamConfig, OptimizerConfig};
