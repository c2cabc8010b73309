//! Configuration module
//!
//! Process-wide configuration is loaded once at startup from the environment (and an
//! optional `.env` file) and then shared read-only. Nothing in the pipeline mutates it.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_VIDEO_SIZE_MB: u64 = 1024;
const PRESIGNED_URL_EXPIRY_SECS: u64 = 3600;
const UPLOAD_MAX_ATTEMPTS: u32 = 3;
const UPLOAD_RETRY_INITIAL_MS: u64 = 200;
const UPLOAD_RETRY_MAX_MS: u64 = 5_000;
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Base configuration shared by every component
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub log_format: String,
    pub jwt_secret: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
}

/// Video ingestion configuration
#[derive(Clone, Debug)]
pub struct VideoServiceConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_storage_bucket: String,
    pub url_signing_secret: String,
    pub presigned_url_expiry_secs: u64,
    // Ingestion limits
    pub max_video_size_bytes: u64,
    pub video_allowed_content_type: String,
    // External media tools
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub staging_dir: Option<PathBuf>,
    // Upload retry policy
    pub upload_max_attempts: u32,
    pub upload_retry_initial_ms: u64,
    pub upload_retry_max_ms: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<VideoServiceConfig>);

impl Config {
    fn as_video(&self) -> &VideoServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_video().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = VideoServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_video().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_video().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_video().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_video().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.as_video().base.log_format
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_video().base.jwt_secret
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_video().base.database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_video().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_video().base.db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_video().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_video().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_video().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_video().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_video().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_video().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_video().local_storage_base_url.as_deref()
    }

    pub fn local_storage_bucket(&self) -> &str {
        &self.as_video().local_storage_bucket
    }

    pub fn url_signing_secret(&self) -> &str {
        &self.as_video().url_signing_secret
    }

    /// Lifetime of playback URLs handed out on every read.
    pub fn presigned_url_expiry(&self) -> Duration {
        Duration::from_secs(self.as_video().presigned_url_expiry_secs)
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.as_video().max_video_size_bytes
    }

    pub fn video_allowed_content_type(&self) -> &str {
        &self.as_video().video_allowed_content_type
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.as_video().ffprobe_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_video().ffmpeg_path
    }

    /// Root directory for per-request staging areas; `None` means the OS temp dir.
    pub fn staging_dir(&self) -> Option<&std::path::Path> {
        self.as_video().staging_dir.as_deref()
    }

    pub fn upload_max_attempts(&self) -> u32 {
        self.as_video().upload_max_attempts
    }

    pub fn upload_retry_initial_interval(&self) -> Duration {
        Duration::from_millis(self.as_video().upload_retry_initial_ms)
    }

    pub fn upload_retry_max_interval(&self) -> Duration {
        Duration::from_millis(self.as_video().upload_retry_max_ms)
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn parse_value<T: std::str::FromStr>(
    key: &str,
    raw: Option<&str>,
    default: T,
) -> Result<T, anyhow::Error> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", key, value)),
    }
}

/// Read a numeric setting; unset means `default`, garbage is an error.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, anyhow::Error> {
    parse_value(key, env::var(key).ok().as_deref(), default)
}

fn megabytes_to_bytes(key: &str, megabytes: u64) -> Result<u64, anyhow::Error> {
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("{} is too large", key))
}

impl VideoServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "compact".to_string())
                .to_lowercase(),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS)?,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) => StorageBackend::S3,
        };

        let config = VideoServiceConfig {
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            local_storage_bucket: env::var("LOCAL_STORAGE_BUCKET")
                .unwrap_or_else(|_| "local".to_string()),
            url_signing_secret: env::var("URL_SIGNING_SECRET")
                .unwrap_or_else(|_| base.jwt_secret.clone()),
            presigned_url_expiry_secs: parse_or(
                "PRESIGNED_URL_EXPIRY_SECS",
                PRESIGNED_URL_EXPIRY_SECS,
            )?,
            max_video_size_bytes: megabytes_to_bytes(
                "MAX_VIDEO_SIZE_MB",
                parse_or("MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB)?,
            )?,
            video_allowed_content_type: env::var("VIDEO_ALLOWED_CONTENT_TYPE")
                .unwrap_or_else(|_| "video/mp4".to_string())
                .trim()
                .to_lowercase(),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            staging_dir: env::var("STAGING_DIR").ok().map(PathBuf::from),
            upload_max_attempts: parse_or("UPLOAD_MAX_ATTEMPTS", UPLOAD_MAX_ATTEMPTS)?,
            upload_retry_initial_ms: parse_or("UPLOAD_RETRY_INITIAL_MS", UPLOAD_RETRY_INITIAL_MS)?,
            upload_retry_max_ms: parse_or("UPLOAD_RETRY_MAX_MS", UPLOAD_RETRY_MAX_MS)?,
            base,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let production = is_production_env(&self.base.environment);

        if production && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.base.jwt_secret.is_empty() {
            return Err(anyhow::anyhow!("JWT_SECRET must not be empty"));
        }

        if production && self.url_signing_secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "URL_SIGNING_SECRET must be at least {} characters in production",
                MIN_PRODUCTION_SECRET_LEN
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.as_deref().map_or(true, str::is_empty) {
                    return Err(anyhow::anyhow!("S3_BUCKET must be set for the s3 backend"));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set for the s3 backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set for the local backend"
                    ));
                }
                if self.local_storage_bucket.is_empty() || self.local_storage_bucket.contains(',')
                {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BUCKET must be non-empty and must not contain ','"
                    ));
                }
            }
        }

        if self.presigned_url_expiry_secs == 0 {
            return Err(anyhow::anyhow!(
                "PRESIGNED_URL_EXPIRY_SECS must be greater than zero"
            ));
        }

        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be greater than zero"));
        }

        if !self.video_allowed_content_type.contains('/') {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_CONTENT_TYPE must be a MIME type such as video/mp4"
            ));
        }

        if self.upload_max_attempts == 0 {
            return Err(anyhow::anyhow!("UPLOAD_MAX_ATTEMPTS must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> VideoServiceConfig {
        VideoServiceConfig {
            base: BaseConfig {
                server_port: 8091,
                cors_origins: vec!["*".to_string()],
                environment: "development".to_string(),
                log_format: "compact".to_string(),
                jwt_secret: "test-secret".to_string(),
                database_url: None,
                db_max_connections: 5,
                db_timeout_seconds: 5,
            },
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: Some("/var/lib/vidkeep".to_string()),
            local_storage_base_url: Some("http://localhost:8091/media".to_string()),
            local_storage_bucket: "local".to_string(),
            url_signing_secret: "test-secret".to_string(),
            presigned_url_expiry_secs: 3600,
            max_video_size_bytes: 1 << 30,
            video_allowed_content_type: "video/mp4".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            staging_dir: None,
            upload_max_attempts: 3,
            upload_retry_initial_ms: 10,
            upload_retry_max_ms: 100,
        }
    }

    #[test]
    fn test_valid_local_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_s3_backend_requires_bucket() {
        let mut config = test_config();
        config.storage_backend = StorageBackend::S3;
        config.s3_region = Some("us-east-1".to_string());
        assert!(config.validate().is_err());

        config.s3_bucket = Some("videos".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_expiry_rejected() {
        let mut config = test_config();
        config.presigned_url_expiry_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_rejects_wildcard_cors_and_short_secret() {
        let mut config = test_config();
        config.base.environment = "production".to_string();
        assert!(config.validate().is_err());

        config.base.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(config.validate().is_err());

        config.url_signing_secret = "x".repeat(48);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_numeric_settings_reject_garbage() {
        assert_eq!(parse_value::<u64>("MAX_VIDEO_SIZE_MB", None, 1024).unwrap(), 1024);
        assert_eq!(parse_value::<u64>("MAX_VIDEO_SIZE_MB", Some("  "), 1024).unwrap(), 1024);
        assert_eq!(parse_value::<u64>("MAX_VIDEO_SIZE_MB", Some(" 50 "), 1024).unwrap(), 50);

        let err = parse_value::<u64>("MAX_VIDEO_SIZE_MB", Some("1GB"), 1024).unwrap_err();
        assert!(err.to_string().contains("MAX_VIDEO_SIZE_MB"));
        assert!(parse_value::<u32>("UPLOAD_MAX_ATTEMPTS", Some("-1"), 3).is_err());
    }

    #[test]
    fn test_video_size_overflow_rejected() {
        assert_eq!(megabytes_to_bytes("MAX_VIDEO_SIZE_MB", 1024).unwrap(), 1 << 30);
        assert!(megabytes_to_bytes("MAX_VIDEO_SIZE_MB", u64::MAX / 1024).is_err());
    }

    #[test]
    fn test_getters_convert_units() {
        let config = Config(Box::new(test_config()));
        assert_eq!(config.presigned_url_expiry(), Duration::from_secs(3600));
        assert_eq!(config.upload_retry_initial_interval(), Duration::from_millis(10));
        assert_eq!(config.max_video_size_bytes(), 1 << 30);
        assert!(!config.is_production());
    }
}
