//! 统一配置中心
//!
//! 按以下顺序合并配置（后者覆盖前者）：
//! - 内置默认值
//! - `MATCHLINE_CONFIG` 指向的配置文件（yaml / json / toml）
//! - `MATCHLINE_` 前缀的环境变量，`__` 表示嵌套，例如 `MATCHLINE_SERVER__PORT`

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_ENV: &str = "MATCHLINE_CONFIG";
pub const ENV_PREFIX: &str = "MATCHLINE_";

/// 全局应用配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub realtime: RealtimeConfig,
    pub discovery: DiscoveryConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 数据库配置。未配置 `url` 时使用进程内存储。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

/// 实时中心配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// 每个连接出站队列的容量，满了之后丢弃新事件
    pub connection_buffer: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub page_size: usize,
}

/// 令牌校验配置。令牌由外部认证服务签发。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `RUST_LOG` 未设置时使用的过滤规则
    pub filter: String,
}

impl Default for AppConfig {
    /// 开发环境默认值；生产环境必须覆盖 `auth.jwt_secret`
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
            },
            realtime: RealtimeConfig {
                connection_buffer: 64,
            },
            discovery: DiscoveryConfig { page_size: 20 },
            auth: AuthConfig {
                jwt_secret: "matchline-development-secret-change-me!".into(),
            },
            log: LogConfig {
                filter: "info,sqlx=warn,tower_http=info".into(),
            },
        }
    }
}

impl AppConfig {
    /// 从默认值、可选配置文件和环境变量加载并校验配置。
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            figment = if path.ends_with(".yml") || path.ends_with(".yaml") {
                figment.merge(Yaml::file(path))
            } else if path.ends_with(".json") {
                figment.merge(Json::file(path))
            } else {
                figment.merge(Toml::file(path))
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidServerConfig(
                "host cannot be empty".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidServerPort(
                "port must be greater than 0".to_string(),
            ));
        }

        if let Some(url) = &self.database.url {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidDatabaseUrl(
                    "database url cannot be empty when set".to_string(),
                ));
            }
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidDatabaseConfig(
                "max connections must be greater than 0".to_string(),
            ));
        }

        if self.realtime.connection_buffer == 0 {
            return Err(ConfigError::InvalidServerConfig(
                "realtime connection buffer must be greater than 0".to_string(),
            ));
        }
        if self.discovery.page_size == 0 {
            return Err(ConfigError::InvalidServerConfig(
                "discovery page size must be greater than 0".to_string(),
            ));
        }

        // 至少 256 位
        if self.auth.jwt_secret.len() < 32 {
            return Err(ConfigError::InvalidJwtSecret(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        Ok(())
    }

    /// 适合写进日志的配置描述，隐藏数据库凭据
    pub fn sanitize(&self) -> String {
        let database = match &self.database.url {
            Some(url) => match url.split_once('@') {
                Some((_, host)) => format!("postgres://[REDACTED]@{host}"),
                None => url.clone(),
            },
            None => "in-memory".to_string(),
        };
        format!(
            "server={}:{} database={} realtime.connection_buffer={} discovery.page_size={}",
            self.server.host,
            self.server.port,
            database,
            self.realtime.connection_buffer,
            self.discovery.page_size
        )
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),
    #[error("Invalid JWT secret: {0}")]
    InvalidJwtSecret(String),
    #[error("Invalid server port: {0}")]
    InvalidServerPort(String),
    #[error("Invalid database configuration: {0}")]
    InvalidDatabaseConfig(String),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_are_valid_and_use_memory_store() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.database.url.is_none());
        assert_eq!(config.discovery.page_size, 20);
    }

    #[test]
    fn env_overrides_nested_values() {
        Jail::expect_with(|jail| {
            jail.set_env("MATCHLINE_SERVER__PORT", "9090");
            jail.set_env("MATCHLINE_DATABASE__URL", "postgres://u:p@db:5432/matchline");
            jail.set_env("MATCHLINE_DISCOVERY__PAGE_SIZE", "5");
            let config = AppConfig::load().expect("config");
            assert_eq!(config.server.port, 9090);
            assert_eq!(
                config.database.url.as_deref(),
                Some("postgres://u:p@db:5432/matchline")
            );
            assert_eq!(config.discovery.page_size, 5);
            Ok(())
        });
    }

    #[test]
    fn config_file_is_layered_under_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "matchline.yaml",
                r#"
server:
  host: 0.0.0.0
  port: 7000
realtime:
  connection_buffer: 8
"#,
            )?;
            jail.set_env(CONFIG_FILE_ENV, "matchline.yaml");
            jail.set_env("MATCHLINE_SERVER__PORT", "7001");
            let config = AppConfig::load().expect("config");
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.port, 7001);
            assert_eq!(config.realtime.connection_buffer, 8);
            Ok(())
        });
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "short".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidJwtSecret(_))
        ));

        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidServerPort(_))
        ));

        let mut config = AppConfig::default();
        config.realtime.connection_buffer = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.discovery.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDatabaseConfig(_))
        ));
    }

    #[test]
    fn invalid_env_value_is_a_load_error() {
        Jail::expect_with(|jail| {
            jail.set_env("MATCHLINE_SERVER__PORT", "not-a-port");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Load(_))));
            Ok(())
        });
    }

    #[test]
    fn sanitize_hides_credentials() {
        let mut config = AppConfig::default();
        config.database.url = Some("postgres://user:secret@db:5432/matchline".into());
        let text = config.sanitize();
        assert!(!text.contains("secret"));
        assert!(text.contains("db:5432/matchline"));
        assert!(!format!("{:?}", config.auth).contains(&config.auth.jwt_secret));
    }
}
