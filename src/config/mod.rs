use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub attachments: AttachmentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Pre-built frontend bundle to serve for non-API paths.
    pub static_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// No client-side timeout unless set; the network stack defaults apply.
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_fallback_departments")]
    pub fallback_departments: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub secure_cookies: bool,
    pub session_duration_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AttachmentConfig {
    pub max_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            allowed_extensions: ["pdf", "doc", "docx", "xls", "xlsx", "png", "jpg", "jpeg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn default_fallback_departments() -> Vec<String> {
    ["Geral", "TI", "RH", "Administrativo"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("backend.base_url", "http://127.0.0.1:8000")?
            .set_default("auth.secure_cookies", false)?
            .set_default("auth.session_duration_minutes", 120)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with ZEROCORE__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("ZEROCORE").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                static_dir: None,
            },
            backend: BackendConfig {
                base_url: "http://127.0.0.1:8000".to_string(),
                timeout_secs: None,
                fallback_departments: default_fallback_departments(),
            },
            auth: AuthConfig {
                secure_cookies: false,
                session_duration_minutes: 120,
            },
            attachments: AttachmentConfig::default(),
        }
    }
}
