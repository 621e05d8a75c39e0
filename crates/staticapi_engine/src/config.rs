use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use staticapi_base::{FilePath, PalHandle, ResultExt, StaticApiResult};

use crate::openapi::Info;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "staticapi.toml";

/// Configuration for a static data API.
///
/// Every field has a default, so an empty (or missing) `staticapi.toml` yields
/// the stock KERI data layout: `data/{kel,ksn,tel}` exported to `pages/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Title of the API, shown in the API description and the docs page.
    pub title: String,
    /// Version string of the API description.
    pub version: String,
    /// Optional free-form description of the API.
    pub description: Option<String>,
    /// Directory holding one subdirectory per category.
    pub data_root: String,
    /// Top-level category names under the data root.
    pub categories: Vec<String>,
    /// Target directory of `staticapi export`.
    pub output_dir: String,
    pub server: ServerConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "KERI Static Data API".to_string(),
            version: "0.1.0".to_string(),
            description: Some("Auto-generated routes from ./data/{kel,ksn,tel}".to_string()),
            data_root: "data".to_string(),
            categories: vec!["kel".to_string(), "ksn".to_string(), "tel".to_string()],
            output_dir: "pages".to_string(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> StaticApiResult<Self> {
        toml::from_str(content).map_err(|e| staticapi_base::err!("Invalid configuration: {}", e))
    }

    /// The data root, relative to the working directory.
    pub fn data_root(&self) -> StaticApiResult<FilePath> {
        relative_dir("data_root", &self.data_root)
    }

    /// The export directory, relative to the working directory.
    pub fn output_dir(&self) -> StaticApiResult<FilePath> {
        relative_dir("output_dir", &self.output_dir)
    }

    /// The `info` block of the API description.
    pub fn api_info(&self) -> Info {
        Info {
            title: self.title.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
        }
    }
}

/// All PAL paths are relative to its base directory, so an absolute setting is an
/// error rather than something to be resolved under the working directory.
fn relative_dir(setting: &str, value: &str) -> StaticApiResult<FilePath> {
    let path = FilePath::from(value);
    if path.is_absolute() {
        staticapi_base::bail!(
            "{} must be relative to the working directory, got '{}'",
            setting,
            value
        );
    }
    Ok(path.normalize())
}

/// Load the configuration file at `path`.
#[instrument(skip(pal), fields(path = %path))]
pub fn load_config(pal: &PalHandle, path: &FilePath) -> StaticApiResult<Config> {
    let content = pal
        .read_file_to_string(path)
        .with_context(|| format!("Failed to read configuration from {}", path))?;
    let config = Config::from_toml(&content).with_context(|| format!("In {}", path))?;
    debug!(title = %config.title, categories = ?config.categories, "configuration loaded");
    Ok(config)
}

/// Load the configuration file at `path`, falling back to defaults if it does not exist.
pub fn load_config_or_default(pal: &PalHandle, path: &FilePath) -> StaticApiResult<Config> {
    if pal.file_exists(path)? {
        load_config(pal, path)
    } else {
        debug!(%path, "no configuration file, using defaults");
        Ok(Config::default())
    }
}
