//! TOML configuration: default port settings, logging and the ports used by
//! the hardware test suite.
//!
//! [`ConfigLoader::load`] describes where files are looked up and how
//! `PORTABLE_SERIAL_*` environment variables override them.
//!
//! ```rust,no_run
//! use portable_serial::config::ConfigLoader;
//!
//! let config = ConfigLoader::load()?.into_config();
//! println!("{} at {}", config.port.name, config.port.baud_rate);
//! # Ok::<(), portable_serial::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{resolve_config_path, user_config_path, ConfigLoader};
pub use schema::{
    Config, LogFormat, LoggingConfig, PortSection, TestingConfig, DEFAULT_PORT_NAME,
};
