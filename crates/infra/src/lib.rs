//! Infrastructure layer: record stores, reference validation, inventory
//! adjustment and configuration.

pub mod adjuster;
pub mod config;
pub mod store;
pub mod validation;

pub use adjuster::{AdjustError, AdjustPolicy, InventoryAdjuster};
pub use config::{AppConfig, ConfigError, DatabaseConfig};
pub use validation::{ReferenceError, ReferenceValidator, Verdict};
