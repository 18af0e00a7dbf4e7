use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable that overrides `security.jwt_secret`.
pub const JWT_SECRET_ENV: &str = "ORGID_JWT_SECRET";

const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub security: SecurityConfig,

    pub otp: OtpConfig,

    pub notification: NotificationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/orgid.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    /// HMAC key for session tokens. Read once at startup.
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Session token validity window.
    pub token_ttl_hours: i64,

    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            jwt_secret: String::new(),
            token_ttl_hours: 24,
            min_password_length: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    pub code_length: usize,

    /// Resend ceiling per verification cycle.
    pub max_resends: i32,

    /// Window for the code issued at registration.
    pub verification_ttl_minutes: i64,

    /// Window for forgot-password and resend codes.
    pub reset_ttl_minutes: i64,

    /// Issue a code on registration and leave the account unverified until it is consumed.
    pub require_email_verification: bool,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            max_resends: 3,
            verification_ttl_minutes: 2,
            reset_ttl_minutes: 3,
            require_email_verification: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// When false, messages are only written to the log.
    pub enabled: bool,

    pub app_name: String,

    pub smtp_host: String,

    pub smtp_port: u16,

    pub smtp_username: Option<String>,

    #[serde(skip_serializing)]
    pub smtp_password: Option<String>,

    pub use_tls: bool,

    pub from_address: String,

    /// Offset applied when rendering expiry times in message bodies.
    /// Expiry comparisons always use UTC.
    pub display_utc_offset_minutes: i32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            app_name: "Stint360".to_string(),
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            use_tls: true,
            from_address: "no-reply@localhost".to_string(),
            display_utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            security: SecurityConfig::default(),
            otp: OtpConfig::default(),
            notification: NotificationConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var(JWT_SECRET_ENV)
            && !secret.is_empty()
        {
            self.security.jwt_secret = secret;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("orgid").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".orgid").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!(
                "security.jwt_secret must be at least {MIN_JWT_SECRET_LEN} bytes (set {JWT_SECRET_ENV})"
            );
        }

        if self.security.token_ttl_hours <= 0 {
            anyhow::bail!("security.token_ttl_hours must be > 0");
        }

        if self.otp.verification_ttl_minutes <= 0 || self.otp.reset_ttl_minutes <= 0 {
            anyhow::bail!("OTP expiry windows must be > 0 minutes");
        }

        if !(4..=10).contains(&self.otp.code_length) {
            anyhow::bail!("otp.code_length must be between 4 and 10");
        }

        if self.otp.max_resends < 0 {
            anyhow::bail!("otp.max_resends cannot be negative");
        }

        Ok(())
    }
}
