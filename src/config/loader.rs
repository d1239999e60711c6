//! Locating, reading and writing `portable-serial` configuration files.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "PORTABLE_SERIAL";
const PATH_VAR: &str = "PORTABLE_SERIAL_CONFIG";
const LOCAL_FILE: &str = "portable-serial.toml";
const USER_DIR: &str = "portable-serial";
const USER_FILE: &str = "config.toml";

/// A validated configuration and the file it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    config: Config,
}

impl ConfigLoader {
    /// Resolve, read, override from the environment and validate.
    ///
    /// Lookup order: the file named by `PORTABLE_SERIAL_CONFIG`,
    /// `./portable-serial.toml`, then `portable-serial/config.toml` under
    /// the per-user config directory. Defaults apply when none exists.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();
        let base = match &config_path {
            Some(path) => read_file(path)?,
            None => Config::default(),
        };
        let loader = Self::finish(config_path, base)?;
        debug!(path = ?loader.config_path, "configuration loaded");
        Ok(loader)
    }

    /// Like [`load`](Self::load) but for one explicit file, which must exist.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let base = read_file(path)?;
        Self::finish(Some(path.to_path_buf()), base)
    }

    /// Defaults plus environment overrides. Overrides that do not parse or
    /// validate are dropped as a group.
    pub fn with_defaults() -> Self {
        let config = Self::finish(None, Config::default())
            .map(Self::into_config)
            .unwrap_or_default();
        Self {
            config_path: None,
            config,
        }
    }

    fn finish(config_path: Option<PathBuf>, mut config: Config) -> ConfigResult<Self> {
        apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(Self { config_path, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// File the configuration was read from, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Write back to the file the configuration was read from.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self.config_path.as_ref().ok_or(ConfigError::NoPath)?;
        write_file(&self.config, path)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        write_file(&self.config, path.as_ref())
    }
}

/// First existing file in lookup order.
pub fn resolve_config_path() -> Option<PathBuf> {
    let explicit = std::env::var_os(PATH_VAR).map(PathBuf::from);
    [explicit, Some(PathBuf::from(LOCAL_FILE)), user_config_path()]
        .into_iter()
        .flatten()
        .find(|path| path.exists())
}

/// `portable-serial/config.toml` under the per-user config directory,
/// whether or not it exists.
pub fn user_config_path() -> Option<PathBuf> {
    #[cfg(windows)]
    let base = std::env::var_os("APPDATA").map(PathBuf::from);
    #[cfg(not(windows))]
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));

    base.map(|dir| dir.join(USER_DIR).join(USER_FILE))
}

fn read_file(path: &Path) -> ConfigResult<Config> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

fn write_file(config: &Config, path: &Path) -> ConfigResult<()> {
    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(write_error)?;
    }
    fs::write(path, toml::to_string_pretty(config)?).map_err(write_error)
}

/// Read `PORTABLE_SERIAL_<key>` if set.
fn env_var(key: &str) -> Option<(String, String)> {
    let var = format!("{ENV_PREFIX}_{key}");
    std::env::var(&var).ok().map(|value| (var, value))
}

/// Parse an override the way the same value would be parsed from TOML:
/// integers as integers, anything else as a string.
fn parse_env<T: DeserializeOwned>(var: &str, raw: &str) -> ConfigResult<T> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map(toml::Value::Integer)
        .unwrap_or_else(|_| toml::Value::String(raw.trim().to_string()));
    T::deserialize(value).map_err(|e| ConfigError::invalid_env(var, e.to_string()))
}

fn parse_flag(var: &str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_env(var, "expected a boolean")),
    }
}

/// Layer `PORTABLE_SERIAL_<SECTION>_<KEY>` variables, e.g.
/// `PORTABLE_SERIAL_PORT_PARITY=even`, over `config`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some((_, val)) = env_var("PORT_NAME") {
        config.port.name = val;
    }
    if let Some((var, val)) = env_var("PORT_BAUD_RATE") {
        config.port.baud_rate = parse_env(&var, &val)?;
    }
    if let Some((var, val)) = env_var("PORT_CHARACTER_SIZE") {
        config.port.character_size = parse_env(&var, &val)?;
    }
    if let Some((var, val)) = env_var("PORT_FLOW_CONTROL") {
        config.port.flow_control = parse_env(&var, &val)?;
    }
    if let Some((var, val)) = env_var("PORT_PARITY") {
        config.port.parity = parse_env(&var, &val)?;
    }
    if let Some((var, val)) = env_var("PORT_STOP_BIT") {
        config.port.stop_bit = parse_env(&var, &val)?;
    }
    if let Some((var, val)) = env_var("PORT_EXCLUSIVE") {
        config.port.exclusive = parse_flag(&var, &val)?;
    }

    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some((var, val)) = env_var("LOGGING_FORMAT") {
        config.logging.format = parse_env(&var, &val)?;
    }

    if let Some((_, val)) = env_var("TESTING_FIRST_PORT") {
        config.testing.first_port = Some(val);
    }
    if let Some((_, val)) = env_var("TESTING_SECOND_PORT") {
        config.testing.second_port = Some(val);
    }
    if let Some((var, val)) = env_var("TESTING_SETTLE_MARGIN_MS") {
        config.testing.settle_margin_ms = parse_env(&var, &val)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use crate::properties::{BaudRate, Parity, StopBit};
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().port.baud_rate, BaudRate::Baud115200);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("PORTABLE_SERIAL_PORT_BAUD_RATE", "9600");
        env::set_var("PORTABLE_SERIAL_PORT_PARITY", "even");
        env::set_var("PORTABLE_SERIAL_PORT_STOP_BIT", "two");
        env::set_var("PORTABLE_SERIAL_LOGGING_FORMAT", "json");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().port.baud_rate, BaudRate::Baud9600);
        assert_eq!(loader.config().port.parity, Parity::Even);
        assert_eq!(loader.config().port.stop_bit, StopBit::Two);
        assert_eq!(loader.config().logging.format, LogFormat::Json);

        env::remove_var("PORTABLE_SERIAL_PORT_BAUD_RATE");
        env::remove_var("PORTABLE_SERIAL_PORT_PARITY");
        env::remove_var("PORTABLE_SERIAL_PORT_STOP_BIT");
        env::remove_var("PORTABLE_SERIAL_LOGGING_FORMAT");
    }

    #[test]
    #[serial]
    fn test_bad_env_override_is_reported() {
        env::set_var("PORTABLE_SERIAL_PORT_BAUD_RATE", "12345");

        let mut config = Config::default();
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
        // with_defaults falls back to plain defaults
        assert_eq!(ConfigLoader::with_defaults().config().port.baud_rate, BaudRate::Baud115200);

        env::remove_var("PORTABLE_SERIAL_PORT_BAUD_RATE");
    }

    #[test]
    #[serial]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut loader = ConfigLoader::with_defaults();
        loader.config_mut().port.name = "ttyACM3".to_string();
        loader.config_mut().port.baud_rate = BaudRate::Baud57600;

        loader.save_to(&path).unwrap();
        let reloaded = ConfigLoader::load_from(&path).unwrap();

        assert_eq!(reloaded.config(), loader.config());
        assert_eq!(reloaded.config_path.as_deref(), Some(path.as_path()));
        reloaded.save().unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_from(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    #[serial]
    fn test_load_rejects_unknown_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[port]\nbaud_rate = 12345\n").unwrap();

        let err = ConfigLoader::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err:?}");
    }

    #[test]
    fn test_save_without_path() {
        let loader = ConfigLoader {
            config_path: None,
            config: Config::default(),
        };
        assert!(matches!(loader.save(), Err(ConfigError::NoPath)));
    }

    #[cfg(not(windows))]
    #[test]
    #[serial]
    fn test_user_config_path_prefers_xdg() {
        let previous = env::var_os("XDG_CONFIG_HOME");
        env::set_var("XDG_CONFIG_HOME", "/tmp/xdg");

        let path = user_config_path();

        match previous {
            Some(value) => env::set_var("XDG_CONFIG_HOME", value),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
        assert_eq!(path, Some(PathBuf::from("/tmp/xdg/portable-serial/config.toml")));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", "Yes").unwrap());
        assert!(!parse_flag("X", "0").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }
}
