use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

/// 对象存储配置（兼容 Supabase REST 接口）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub url: String,
    pub anon_key: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// 公开访问地址前缀，未配置时使用 `url`
    #[serde(default)]
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_true")]
    pub require_email_confirmation: bool,
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u32,
    #[serde(default = "default_login_window_secs")]
    pub login_window_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_email_confirmation: true,
            login_max_attempts: default_login_max_attempts(),
            login_window_secs: default_login_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_profile_lookup_timeout_ms")]
    pub profile_lookup_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile_lookup_timeout_ms: default_profile_lookup_timeout_ms(),
        }
    }
}

fn default_bucket() -> String {
    "media".to_string()
}

fn default_true() -> bool {
    true
}

fn default_login_max_attempts() -> u32 {
    5
}

fn default_login_window_secs() -> i64 {
    300
}

fn default_profile_lookup_timeout_ms() -> u64 {
    3000
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 配置文件不存在时完全依赖环境变量
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse {config_path}: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env_defaults(),
            Err(e) => {
                return Err(format!("Unable to read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_env_defaults() -> Self {
        fn get_env(name: &str) -> Option<String> {
            env::var(name).ok()
        }
        fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
            env::var(name)
                .ok()
                .and_then(|v| v.parse::<T>().ok())
                .unwrap_or(default)
        }

        Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            database: DatabaseConfig {
                url: get_env("DATABASE_URL").unwrap_or_default(),
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                refresh_token_expires_in: get_env_parse("JWT_REFRESH_EXPIRES_IN", 2_592_000i64),
            },
            storage: StorageConfig {
                url: get_env("STORAGE_URL").unwrap_or_default(),
                anon_key: get_env("STORAGE_ANON_KEY").unwrap_or_default(),
                bucket: get_env("STORAGE_BUCKET").unwrap_or_else(default_bucket),
                public_base_url: get_env("STORAGE_PUBLIC_BASE_URL"),
            },
            auth: AuthConfig::default(),
            session: SessionConfig::default(),
        }
    }

    // 环境变量覆盖（即便文件存在时也覆盖）
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("STORAGE_URL") {
            self.storage.url = v;
        }
        if let Ok(v) = env::var("STORAGE_ANON_KEY") {
            self.storage.anon_key = v;
        }
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            self.storage.bucket = v;
        }
        if let Ok(v) = env::var("STORAGE_PUBLIC_BASE_URL") {
            self.storage.public_base_url = Some(v);
        }
        if let Ok(v) = env::var("AUTH_REQUIRE_EMAIL_CONFIRMATION")
            && let Ok(b) = v.parse()
        {
            self.auth.require_email_confirmation = b;
        }
        if let Ok(v) = env::var("AUTH_LOGIN_MAX_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            self.auth.login_max_attempts = n;
        }
        if let Ok(v) = env::var("AUTH_LOGIN_WINDOW_SECS")
            && let Ok(n) = v.parse()
        {
            self.auth.login_window_secs = n;
        }
        if let Ok(v) = env::var("SESSION_PROFILE_LOOKUP_TIMEOUT_MS")
            && let Ok(n) = v.parse()
        {
            self.session.profile_lookup_timeout_ms = n;
        }
    }

    /// 数据库地址与存储地址/匿名密钥缺失时无法提供任何数据相关功能
    pub fn validate(&self) -> AppResult<()> {
        let mut missing = Vec::new();
        if self.database.url.trim().is_empty() {
            missing.push("DATABASE_URL");
        }
        if self.storage.url.trim().is_empty() {
            missing.push("STORAGE_URL");
        }
        if self.storage.anon_key.trim().is_empty() {
            missing.push("STORAGE_ANON_KEY");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::ConfigError(format!(
                "missing required settings: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [database]
            url = "postgres://localhost/fitmarket"
            max_connections = 5

            [jwt]
            secret = "secret"
            access_token_expires_in = 3600
            refresh_token_expires_in = 86400

            [storage]
            url = "https://project.supabase.co"
            anon_key = "anon"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_with_section_defaults() {
        let config = sample();
        assert_eq!(config.storage.bucket, "media");
        assert!(config.auth.require_email_confirmation);
        assert_eq!(config.auth.login_max_attempts, 5);
        assert_eq!(config.session.profile_lookup_timeout_ms, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_missing_backend_settings() {
        let mut config = sample();
        config.storage.url = String::new();
        config.storage.anon_key = " ".to_string();
        let err = config.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("STORAGE_URL"));
        assert!(msg.contains("STORAGE_ANON_KEY"));
        assert!(!msg.contains("DATABASE_URL"));
    }
}
