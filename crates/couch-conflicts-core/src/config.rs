use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};

/// Run settings, built once at startup and passed by reference.
///
/// Every field has a default; `Config.toml` and `COUCH_CONFLICTS_*`
/// environment variables override them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Documents with more conflicting revisions than this are left for manual cleanup.
    pub threshold: usize,
    pub page_size: usize,
    pub design_document: String,
    pub view_name: String,
    /// Explicit server for plain CouchDB. Cloudant accounts derive it from the account name.
    pub server_url: Option<String>,
    pub request_timeout_secs: u64,
    pub progress_major_interval: u64,
    pub progress_minor_interval: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            page_size: 200,
            design_document: "conflicts".to_string(),
            view_name: "conflicts".to_string(),
            server_url: None,
            request_timeout_secs: 60,
            progress_major_interval: 100,
            progress_minor_interval: 10,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Message("page_size must be at least 1".to_string()));
        }
        if self.progress_major_interval == 0 || self.progress_minor_interval == 0 {
            return Err(ConfigError::Message(
                "progress intervals must be at least 1".to_string(),
            ));
        }
        if self.design_document.is_empty() || self.view_name.is_empty() {
            return Err(ConfigError::Message(
                "design_document and view_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("COUCH_CONFLICTS").try_parsing(true))
        .build()?
        .try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}
