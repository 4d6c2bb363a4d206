//! Environment-driven configuration
//!
//! Everything the shim reads from the environment is collected here once so
//! that the rest of the crate never calls `std::env` directly.

use std::sync::OnceLock;

use tracing::Level;

/// `LOG_LEVEL` values, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Verbose,
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "verbose" => Some(LogLevel::Verbose),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    pub fn as_tracing(self) -> Level {
        match self {
            LogLevel::Verbose => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: LogLevel,
    /// Route log output to the Android system log
    pub run_in_android: bool,
    /// Skip libnativewindow and use the libhardware gralloc module
    pub always_use_libhardware: bool,
    /// Run the GL_EXT_read_format_bgra capability probe
    pub read_format_bgra_check: bool,
    /// `WAYLAND_DISPLAY` is present in the environment
    pub wayland_display: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Error,
            run_in_android: false,
            always_use_libhardware: false,
            read_format_bgra_check: false,
            wayland_display: false,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    /// Build a config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_level: lookup("LOG_LEVEL")
                .and_then(|v| LogLevel::parse(&v))
                .unwrap_or(LogLevel::Error),
            run_in_android: lookup("RUN_IN_ANDROID").map_or(false, |v| is_truthy(&v)),
            always_use_libhardware: lookup("ALWAYS_USE_LIBHARDWARE").is_some(),
            read_format_bgra_check: lookup("READ_FORMAT_BGRA_CHECK")
                .map_or(false, |v| v.trim() == "1"),
            wayland_display: lookup("WAYLAND_DISPLAY").is_some(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Process-wide configuration, read on first use
    pub fn global() -> &'static Config {
        static CONFIG: OnceLock<Config> = OnceLock::new();
        CONFIG.get_or_init(Config::from_env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.log_level.as_tracing(), Level::ERROR);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(config_from(&[("LOG_LEVEL", "verbose")]).log_level, LogLevel::Verbose);
        assert_eq!(config_from(&[("LOG_LEVEL", "Warning")]).log_level, LogLevel::Warning);
        assert_eq!(config_from(&[("LOG_LEVEL", "loud")]).log_level, LogLevel::Error);
        assert!(LogLevel::Verbose < LogLevel::Error);
    }

    #[test]
    fn test_flags() {
        let config = config_from(&[
            ("RUN_IN_ANDROID", "true"),
            ("ALWAYS_USE_LIBHARDWARE", ""),
            ("READ_FORMAT_BGRA_CHECK", "1"),
            ("WAYLAND_DISPLAY", "wayland-0"),
        ]);
        assert!(config.run_in_android);
        assert!(config.always_use_libhardware);
        assert!(config.read_format_bgra_check);
        assert!(config.wayland_display);

        // Only "1" enables the probe
        assert!(!config_from(&[("READ_FORMAT_BGRA_CHECK", "true")]).read_format_bgra_check);
        assert!(!config_from(&[("RUN_IN_ANDROID", "0")]).run_in_android);
    }
}
