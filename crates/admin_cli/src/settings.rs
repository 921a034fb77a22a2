use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "bilancio.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    /// Log filter level, `error` to `trace`.
    pub log: String,
    /// Optional message catalog overriding the built-in texts.
    pub messages: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./bilancio.db?mode=rwc".to_string(),
            log: "info".to_string(),
            messages: None,
        }
    }
}

/// Loads settings from an optional TOML file plus `BILANCIO_*` overrides.
pub fn load(path: Option<&str>) -> Result<Settings, config::ConfigError> {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("BILANCIO"));
    builder.build()?.try_deserialize()
}
