use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,
    /// Empty unless configured; the command line must then name the types.
    #[serde(default)]
    pub file_types: Vec<String>,
    #[serde(default)]
    pub delete_originals: bool,
    #[serde(default = "default_true")]
    pub skip_converted: bool,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default = "default_soffice_path")]
    pub soffice_path: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_days() -> i64 {
    60
}

fn default_delay_secs() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_soffice_path() -> String {
    "soffice".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

/// `FileFlow.toml` in the working directory (optional), then `FILEFLOW_*`
/// environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("FileFlow").required(false))
        .add_source(environment())
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::from(path).required(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

fn environment() -> Environment {
    Environment::with_prefix("FILEFLOW")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("file_types")
        .with_list_parse_key("ignore_patterns")
}
