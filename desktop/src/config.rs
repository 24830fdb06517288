use config::{Config, ConfigError, Environment, File};
use engine::menu::{MenuEnv, MenuLinks};
use engine::{AvailabilityContext, ContextOptions, Platform};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::RwLock;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_dev_env")]
    pub dev_env: String,

    pub app: AppSection,
    pub engine: EngineSection,
    pub menu: MenuSection,
    /// Where users and session partitions are stored. Relative paths are
    /// resolved against the working directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
}

fn default_dev_env() -> String {
    "dev".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppSection {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineSection {
    /// Selection key applied at startup, e.g. `chrome/tabs`.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub multisite: bool,
    #[serde(default)]
    pub widevine: bool,
    /// Pretend to run on another host platform. Testing aid.
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MenuSection {
    pub webview: bool,
    #[serde(default)]
    pub development: bool,
    #[serde(default)]
    pub links: MenuLinks,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub format: LoggingFormatConfig,
    pub levels: LoggingLevelsConfig,
    #[serde(default)]
    pub redaction: RedactionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingFormatConfig {
    pub show_time: bool,
    pub location: LoggingLocationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingLocationConfig {
    pub show_file: bool,
    pub show_line: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingLevelsConfig {
    pub debug: bool,
    pub info: bool,
    pub warning: bool,
    pub error: bool,
    pub critical: bool,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct RedactionConfig {
    #[serde(default = "true_default")]
    pub enabled: bool,
    #[serde(default = "true_default")]
    pub use_default_pii: bool,
    #[serde(default)]
    pub patterns: Vec<RedactionPattern>,
}

fn true_default() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RedactionPattern {
    pub name: String,
    pub regex: String,
    pub placeholder: String,
}

impl AppConfig {
    pub fn platform(&self) -> Platform {
        self.engine
            .platform
            .as_deref()
            .map(Platform::from_id)
            .unwrap_or_else(Platform::current)
    }

    pub fn availability_context(&self) -> AvailabilityContext {
        AvailabilityContext::new(self.platform())
            .with_multisite(self.engine.multisite)
            .with_widevine(self.engine.widevine)
    }

    pub fn menu_env(&self) -> MenuEnv {
        MenuEnv {
            platform: self.platform(),
            webview: self.menu.webview,
            development: self.menu.development,
            links: self.menu.links.clone(),
            ..MenuEnv::new(&self.app.name, &self.app.id)
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("webwrap").join(&self.app.id))
    }

    /// Everything the engine context needs from configuration.
    pub fn context_options(&self) -> ContextOptions {
        ContextOptions {
            availability: self.availability_context(),
            menu: self.menu_env(),
            default_engine: self.engine.default.clone(),
            data_dir: self.data_dir(),
        }
    }
}

static CONFIG: RwLock<Option<&'static AppConfig>> = RwLock::new(None);

/// Load once and cache for the process lifetime.
pub fn try_get_config() -> Result<&'static AppConfig, ConfigError> {
    if let Some(cfg) = *CONFIG.read().unwrap_or_else(|e| e.into_inner()) {
        return Ok(cfg);
    }

    let mut write = CONFIG.write().unwrap_or_else(|e| e.into_inner());
    if let Some(cfg) = *write {
        return Ok(cfg);
    }

    let cfg: &'static AppConfig = Box::leak(Box::new(load_config()?));
    *write = Some(cfg);
    Ok(cfg)
}

pub fn get_config() -> &'static AppConfig {
    try_get_config().unwrap_or_else(|e| panic!("Failed to load configuration: {}", e))
}

#[cfg(test)]
pub fn reset_config() {
    let mut write = CONFIG.write().unwrap();
    *write = None;
}

fn locate(base: &std::path::Path, name: &str) -> PathBuf {
    if base.join(name).exists() {
        base.join(name)
    } else {
        // Repo-root execution
        std::path::Path::new("desktop").join(name)
    }
}

fn load_config() -> Result<AppConfig, ConfigError> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let base_path = std::path::Path::new(&manifest_dir);

    let builder = Config::builder()
        // Defaults (mandatory)
        .add_source(File::from(locate(base_path, "global_config.yaml")).required(true))
        .add_source(File::from(locate(base_path, "production_config.yaml")).required(false))
        // Local override
        .add_source(File::from(locate(base_path, ".global_config.yaml")).required(false))
        // Nested env vars like APP__ENGINE__MULTISITE=true
        .add_source(Environment::with_prefix("APP").separator("__"));

    builder.build()?.try_deserialize()
}
