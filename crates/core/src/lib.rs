pub mod config;
pub mod config_loader;
pub mod env_store;

pub use config::{AppConfig, ReportConfig, UpstoxConfig, DEFAULT_LOT_SIZE, DEFAULT_PRODUCT};
pub use config_loader::ConfigLoader;
pub use env_store::{EnvStore, UpsertOutcome};
