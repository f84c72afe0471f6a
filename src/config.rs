use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
    /// Public base URL used to build webhook callback addresses
    pub base_url: String,
    /// Frontend origin used for payment return redirects
    pub frontend_url: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_enable_cors() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub llm_endpoint: String,
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_model() -> String {
    "deepseek-ai/DeepSeek-V3".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry_days")]
    pub token_expiry_days: i64,
}

fn default_token_expiry_days() -> i64 {
    7
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlipayConfig {
    pub app_id: String,
    /// PKCS#8 PEM private key used to sign outgoing requests
    pub private_key: String,
    /// Gateway's published public key used to verify webhook signatures
    pub public_key: String,
    #[serde(default = "default_gateway")]
    pub gateway: String,
    /// Enabled only when keys are configured; orders degrade to mock URLs otherwise
    #[serde(default)]
    pub enabled: bool,
}

fn default_gateway() -> String {
    "https://openapi.alipay.com/gateway.do".to_string()
}

impl Default for AlipayConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            private_key: String::new(),
            public_key: String::new(),
            gateway: default_gateway(),
            enabled: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub alipay: AlipayConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            println!(
                "Warning: Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(crate::CrystalPathError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Get database URL
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Get max connections for database pool
    pub fn max_connections(&self) -> u32 {
        self.database.max_connections
    }

    /// Get connection timeout in seconds
    pub fn connection_timeout(&self) -> u64 {
        self.database.connection_timeout
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM key
    pub fn llm_key(&self) -> &str {
        &self.llm.llm_key
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// Get JWT signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.auth.jwt_secret
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://crystalpath.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                backtrace: true,
            },
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                enable_cors: true,
                base_url: "http://localhost:3001".to_string(),
                frontend_url: "http://localhost:5173".to_string(),
            },
            llm: LlmConfig {
                llm_endpoint: "https://cloud.siliconflow.cn".to_string(),
                llm_key: String::new(),
                llm_model: default_llm_model(),
                timeout_secs: default_llm_timeout_secs(),
            },
            auth: AuthConfig {
                jwt_secret: "change-me".to_string(),
                token_expiry_days: default_token_expiry_days(),
            },
            alipay: AlipayConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml_str = r#"
            [database]
            url = "sqlite::memory:"
            max_connections = 2
            connection_timeout = 10

            [logging]
            level = "debug"
            backtrace = false

            [server]
            base_url = "http://localhost:3001"
            frontend_url = "http://localhost:5173"

            [llm]
            llm_endpoint = "http://localhost:11434"
            llm_key = "test"

            [auth]
            jwt_secret = "secret"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.auth.token_expiry_days, 7);
        assert!(!config.alipay.enabled);
    }
}
