use std::env;

use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::user::models::AccountPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

/// Outgoing SMTP settings and the public base URL used in emailed links.
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default)]
    pub use_tls: bool,
    pub from_address: String,
    pub from_name: String,
    pub base_url: String,
}

/// Account rules and password hashing cost.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AccountsConfig {
    pub name_max_length: usize,
    pub email_max_length: usize,
    pub password_min_length: usize,
    pub reset_expiry_minutes: i64,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        let policy = AccountPolicy::default();
        let cost = auth::HashCost::default();
        Self {
            name_max_length: policy.name_max_length,
            email_max_length: policy.email_max_length,
            password_min_length: policy.password_min_length,
            reset_expiry_minutes: policy.reset_expiry.num_minutes(),
            hash_memory_kib: cost.memory_kib,
            hash_iterations: cost.iterations,
            hash_parallelism: cost.parallelism,
        }
    }
}

impl AccountsConfig {
    pub fn policy(&self) -> AccountPolicy {
        AccountPolicy {
            name_max_length: self.name_max_length,
            email_max_length: self.email_max_length,
            password_min_length: self.password_min_length,
            reset_expiry: Duration::minutes(self.reset_expiry_minutes),
        }
    }

    pub fn hash_cost(&self) -> auth::HashCost {
        auth::HashCost {
            memory_kib: self.hash_memory_kib,
            iterations: self.hash_iterations,
            parallelism: self.hash_parallelism,
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, MAIL__SMTP_HOST, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(environment())
    }

    fn load_with(environment: Environment) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment)
            .build()?;

        configuration.try_deserialize()
    }
}

/// Unprefixed variables, `__` between path segments.
/// Example: DATABASE__URL=postgres://... overrides database.url
fn environment() -> Environment {
    Environment::default().separator("__").try_parsing(true)
}
