/// Environment variable names used by [`LoggerConfig::from_env`] for
/// convenient configuration from applications.
///
/// These are purely helpers; the logger types themselves never read the
/// environment.
///
/// [`LoggerConfig::from_env`]: crate::config::LoggerConfig::from_env

/// Directory log files are created in, e.g. `/var/log/myapp`.
pub const FILE_LOG_DIR_ENV: &str = "FILE_LOG_DIR";

/// Backend name, `text` or `csv`.
pub const FILE_LOG_BACKEND_ENV: &str = "FILE_LOG_BACKEND";

/// Optional line template overriding the backend default.
pub const FILE_LOG_TEMPLATE_ENV: &str = "FILE_LOG_TEMPLATE";

/// `0`/`false`/`off` disables logging entirely.
pub const FILE_LOG_ENABLED_ENV: &str = "FILE_LOG_ENABLED";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an optional, non-empty environment variable.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Interpret a flag value; anything not clearly "off" counts as on.
pub fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}
