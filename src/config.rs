use anyhow::{Context, Result, ensure};
use std::{env, path::PathBuf, sync::OnceLock};

/// Application configuration loaded and validated at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// UI server configuration
    pub ui: UiConfig,

    /// TLS certificate configuration, plain HTTP if absent
    pub certificate: Option<CertificateConfig>,

    /// Path configuration
    pub paths: PathConfig,
}

#[derive(Clone, Debug)]
pub struct UiConfig {
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct CertificateConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct PathConfig {
    pub config_file: PathBuf,
}

/// Settings of the config API client side
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
}

impl AppConfig {
    /// Get or load the application configuration
    ///
    /// On first call all configuration is loaded from environment variables,
    /// subsequent calls return the cached instance.
    ///
    /// # Panics
    /// Panics if configuration loading fails, the service cannot run without it.
    pub fn get() -> &'static Self {
        static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();
        APP_CONFIG.get_or_init(|| Self::load().expect("failed to load application configuration"))
    }

    /// Load all configuration from environment variables
    pub fn load() -> Result<Self> {
        let ui = UiConfig::load()?;
        let certificate = CertificateConfig::load()?;
        let paths = PathConfig::load()?;

        Ok(Self {
            ui,
            certificate,
            paths,
        })
    }
}

impl UiConfig {
    fn load() -> Result<Self> {
        let port = env::var("UI_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("failed to parse UI_PORT: invalid format")?;

        Ok(Self { port })
    }
}

impl CertificateConfig {
    fn load() -> Result<Option<Self>> {
        let cert_path = env::var("CERT_PATH").ok().map(PathBuf::from);
        let key_path = env::var("KEY_PATH").ok().map(PathBuf::from);

        match (cert_path, key_path) {
            (Some(cert_path), Some(key_path)) => Ok(Some(Self {
                cert_path,
                key_path,
            })),
            (None, None) => Ok(None),
            _ => anyhow::bail!("failed since CERT_PATH and KEY_PATH must be set together"),
        }
    }
}

impl PathConfig {
    fn load() -> Result<Self> {
        let config_file: PathBuf = env::var("CONFIG_FILE")
            .unwrap_or_else(|_| "/data/config/config.json".to_string())
            .into();

        ensure!(
            config_file.file_name().is_some(),
            "failed since CONFIG_FILE has no file name: {config_file:?}"
        );

        Ok(Self { config_file })
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self> {
        let base_url =
            env::var("CONFIG_API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        ensure!(!base_url.is_empty(), "failed since CONFIG_API_URL is empty");

        Ok(Self { base_url })
    }
}
