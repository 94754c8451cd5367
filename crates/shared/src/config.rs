//! Application configuration management.

use serde::Deserialize;

/// Run mode used when `RUN_MODE` is not set.
pub const DEFAULT_RUN_MODE: &str = "development";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment mode (`RUN_MODE`), e.g. `development` or `production`.
    #[serde(default = "default_run_mode")]
    pub run_mode: String,
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

fn default_run_mode() -> String {
    DEFAULT_RUN_MODE.to_string()
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key shared with the token issuer.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Storage configuration as read from config sources.
///
/// `backend` is the explicit backend choice (`local` or `s3`). When it is
/// absent the backend is derived from the run mode.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Explicit backend kind.
    #[serde(default)]
    pub backend: Option<String>,
    /// Folder used for uploads that do not name one.
    #[serde(default = "default_upload_folder")]
    pub default_folder: String,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Lifetime of signed URLs in seconds.
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,
    /// Local filesystem backend settings.
    #[serde(default)]
    pub local: LocalSettings,
    /// S3-compatible backend settings.
    #[serde(default)]
    pub s3: Option<S3Settings>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: None,
            default_folder: default_upload_folder(),
            max_file_size: default_max_file_size(),
            signed_url_ttl_secs: default_signed_url_ttl(),
            local: LocalSettings::default(),
            s3: None,
        }
    }
}

fn default_upload_folder() -> String {
    "uploads".to_string()
}

fn default_max_file_size() -> u64 {
    100 * 1024 * 1024
}

fn default_signed_url_ttl() -> u64 {
    600 // 10 minutes
}

/// Local filesystem backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalSettings {
    /// Root directory objects are stored under.
    #[serde(default = "default_local_root")]
    pub root: String,
    /// Base URL the root directory is publicly served from.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            root: default_local_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_local_root() -> String {
    "./storage/app".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080/storage".to_string()
}

/// S3-compatible backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Settings {
    /// S3 endpoint URL.
    pub endpoint: String,
    /// Bucket name.
    pub bucket: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Timeout applied to every remote call, in seconds.
    #[serde(default = "default_s3_timeout")]
    pub timeout_secs: u64,
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_s3_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| default_run_mode());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DEPOT").separator("__"))
            .set_override("run_mode", run_mode)?
            .build()?;

        config.try_deserialize()
    }

    /// Returns true when running in the production deployment mode.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.run_mode == "production"
    }
}
