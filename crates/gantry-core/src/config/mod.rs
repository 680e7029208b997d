//! Declared configuration: types, loading, validation

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{find_config, load_config, load_config_from_dir};
pub use types::*;
pub use validation::validate_config;
