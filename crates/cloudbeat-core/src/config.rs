//! Configuration module
//!
//! Gateway settings are read once from the environment (optionally seeded from a
//! `.env` file) and validated before the server starts.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{DEFAULT_BUCKET, SIGNED_URL_TTL_SECS};

const DEFAULT_PORT: u16 = 5000;
const MAX_UPLOAD_SIZE_MB: usize = 100;
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Where blobs are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Supabase,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supabase" => Ok(StorageBackend::Supabase),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Supabase => write!(f, "supabase"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// Where catalog rows are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgrest,
    Memory,
}

impl FromStr for DatabaseBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgrest" => Ok(DatabaseBackend::Postgrest),
            "memory" => Ok(DatabaseBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid database backend: {}", s)),
        }
    }
}

impl Display for DatabaseBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DatabaseBackend::Postgrest => write!(f, "postgrest"),
            DatabaseBackend::Memory => write!(f, "memory"),
        }
    }
}

/// How bearer tokens are checked before their subject is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenVerificationMode {
    /// Decode claims only; the data platform re-validates the forwarded token.
    None,
    /// HS256 with a shared secret.
    Hs256,
    /// RS256/ES256 against a published key set.
    Jwks,
}

impl FromStr for TokenVerificationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(TokenVerificationMode::None),
            "hs256" => Ok(TokenVerificationMode::Hs256),
            "jwks" => Ok(TokenVerificationMode::Jwks),
            _ => Err(anyhow::anyhow!("Invalid JWT verification mode: {}", s)),
        }
    }
}

impl Display for TokenVerificationMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TokenVerificationMode::None => write!(f, "none"),
            TokenVerificationMode::Hs256 => write!(f, "hs256"),
            TokenVerificationMode::Jwks => write!(f, "jwks"),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    // Data platform
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub storage_backend: StorageBackend,
    pub database_backend: DatabaseBackend,
    pub storage_bucket: String,
    pub signed_url_ttl_secs: u64,
    pub http_timeout_secs: u64,
    // Local storage backend
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub signed_url_secret: Option<String>,
    // Uploads
    pub max_upload_size_bytes: usize,
    pub upload_temp_dir: Option<PathBuf>,
    pub ffprobe_path: Option<String>,
    // Token verification
    pub jwt_verification: TokenVerificationMode,
    pub jwt_secret: Option<String>,
    pub jwks_url: Option<String>,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
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

        let server_port = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let storage_backend = non_empty_var("STORAGE_BACKEND")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(StorageBackend::Supabase);

        let database_backend = non_empty_var("DATABASE_BACKEND")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(DatabaseBackend::Postgrest);

        let jwt_verification = non_empty_var("JWT_VERIFICATION")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(TokenVerificationMode::None);

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        Ok(Config {
            server_port,
            environment,
            cors_origins,
            supabase_url: non_empty_var("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            supabase_key: non_empty_var("SUPABASE_KEY"),
            storage_backend,
            database_backend,
            storage_bucket: non_empty_var("STORAGE_BUCKET")
                .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            signed_url_ttl_secs: env::var("SIGNED_URL_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(SIGNED_URL_TTL_SECS),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_TIMEOUT_SECS),
            local_storage_path: non_empty_var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty_var("LOCAL_STORAGE_BASE_URL"),
            signed_url_secret: non_empty_var("SIGNED_URL_SECRET"),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            upload_temp_dir: non_empty_var("UPLOAD_TEMP_DIR").map(PathBuf::from),
            ffprobe_path: non_empty_var("FFPROBE_PATH"),
            jwt_verification,
            jwt_secret: non_empty_var("JWT_SECRET"),
            jwks_url: non_empty_var("JWKS_URL"),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let needs_platform = self.storage_backend == StorageBackend::Supabase
            || self.database_backend == DatabaseBackend::Postgrest;
        if needs_platform {
            match self.supabase_url.as_deref() {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                Some(_) => {
                    return Err(anyhow::anyhow!(
                        "SUPABASE_URL must start with http:// or https://"
                    ))
                }
                None => {
                    return Err(anyhow::anyhow!(
                        "SUPABASE_URL must be set when using the supabase/postgrest backends"
                    ))
                }
            }
            if self.supabase_key.is_none() {
                return Err(anyhow::anyhow!(
                    "SUPABASE_KEY must be set when using the supabase/postgrest backends"
                ));
            }
        }

        if self.storage_backend == StorageBackend::Local {
            if self.local_storage_path.is_none() {
                return Err(anyhow::anyhow!(
                    "LOCAL_STORAGE_PATH must be set when using local storage backend"
                ));
            }
            if self.local_storage_base_url.is_none() {
                return Err(anyhow::anyhow!(
                    "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                ));
            }
            match self.signed_url_secret.as_deref() {
                Some(secret) if secret.len() >= 32 => {}
                _ => {
                    return Err(anyhow::anyhow!(
                        "SIGNED_URL_SECRET must be at least 32 characters when using local storage backend"
                    ))
                }
            }
        }

        match self.jwt_verification {
            TokenVerificationMode::None => {}
            TokenVerificationMode::Hs256 => {
                if self.jwt_secret.as_deref().map_or(true, |s| s.len() < 32) {
                    return Err(anyhow::anyhow!(
                        "JWT_SECRET must be at least 32 characters long when JWT_VERIFICATION=hs256"
                    ));
                }
            }
            TokenVerificationMode::Jwks => {
                if self.jwks_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "JWKS_URL must be set when JWT_VERIFICATION=jwks"
                    ));
                }
            }
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        Ok(())
    }
}
