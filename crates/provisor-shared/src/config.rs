//! Configuration management for provisor

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use provisor_core::{
    Dialect, DropPolicy, ProvisionError, ProvisionRequest, StatementCatalog, DEFAULT_ADMIN_ACCOUNT,
    DEFAULT_ADMIN_CREDENTIAL,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file, read when present.
pub const DEFAULT_CONFIG_FILE: &str = "provisor.toml";

/// Environment variables accepted for compatibility with existing
/// deployments, mapped to configuration keys. These win over every other
/// source.
pub const LEGACY_ENV_VARS: &[(&str, &str)] = &[
    ("DB_TIMEOUT", "connection.timeout"),
    ("DEMO_ORACLE_USER", "connection.user"),
    ("DEMO_ORACLE_PASSWORD", "connection.password"),
    ("DEMO_ORACLE_SERVER", "connection.server"),
    ("DEMO_ORACLE_SERVICE_NAME", "connection.service_name"),
];

/// Main configuration structure for provisor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisorConfig {
    /// Database connection configuration
    pub connection: ConnectionConfig,

    /// Account to provision
    pub account: AccountConfig,

    /// SQL text overrides on top of the dialect's catalog
    #[serde(default)]
    pub statements: StatementOverrides,

    /// Operator report configuration
    pub report: ReportConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Selects the default statement catalog
    pub dialect: Dialect,

    /// Connecting principal, quoted automatically when required
    pub user: String,

    pub password: String,

    /// Host, optionally with `:port`
    pub server: String,

    pub service_name: String,

    /// Ping timeout, e.g. `5s`, `1m30s` or `250ms`
    pub timeout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account to drop, recreate and grant roles to
    pub name: String,

    /// Used verbatim in `IDENTIFIED BY`; quote it yourself if needed
    pub credential: String,

    pub drop_policy: DropPolicy,
}

/// Per-statement replacements. Unset entries keep the dialect default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementOverrides {
    pub version_query: Option<String>,
    pub instance_version_query: Option<String>,
    pub product_query: Option<String>,
    pub drop_account: Option<String>,
    pub create_account: Option<String>,
    pub grant_roles: Option<String>,
}

impl StatementOverrides {
    pub fn apply(&self, base: StatementCatalog) -> StatementCatalog {
        let pick = |over: &Option<String>, default: String| over.clone().unwrap_or(default);
        StatementCatalog {
            version_query: pick(&self.version_query, base.version_query),
            instance_version_query: pick(&self.instance_version_query, base.instance_version_query),
            product_query: pick(&self.product_query, base.product_query),
            drop_account: pick(&self.drop_account, base.drop_account),
            create_account: pick(&self.create_account, base.create_account),
            grant_roles: pick(&self.grant_roles, base.grant_roles),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Mask credentials in operator output
    pub redact_credentials: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty or compact)
    pub format: String,
}

impl Default for ProvisorConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig {
                dialect: Dialect::Mysql,
                user: "root".to_string(),
                password: String::new(),
                server: "localhost:3306".to_string(),
                service_name: "mysql".to_string(),
                timeout: "10s".to_string(),
            },
            account: AccountConfig {
                name: DEFAULT_ADMIN_ACCOUNT.to_string(),
                credential: DEFAULT_ADMIN_CREDENTIAL.to_string(),
                drop_policy: DropPolicy::Strict,
            },
            statements: StatementOverrides::default(),
            report: ReportConfig {
                redact_credentials: false,
            },
            observability: ObservabilityConfig {
                logging: LoggingConfig {
                    level: "info".to_string(),
                    format: "compact".to_string(),
                },
            },
        }
    }
}

impl ProvisorConfig {
    /// Load configuration from the default file, when present, and
    /// environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_layers(File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false))
    }

    /// Load configuration from a specific file, then environment variables.
    /// The file must exist.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_layers(File::from(path.as_ref()).required(true))
    }

    fn load_layers<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let builder = Config::builder()
            .add_source(Config::try_from(&ProvisorConfig::default())?)
            .add_source(file)
            .add_source(Environment::with_prefix("PROVISOR").separator("__"));
        with_legacy_env(builder, |var| std::env::var(var).ok())?
            .build()?
            .try_deserialize()
    }

    /// Load configuration from environment variables only
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(Config::try_from(&ProvisorConfig::default())?)
            .add_source(Environment::with_prefix("PROVISOR").separator("__"));
        with_legacy_env(builder, |var| std::env::var(var).ok())?
            .build()?
            .try_deserialize()
    }

    /// Parse the ping timeout.
    pub fn ping_timeout(&self) -> Result<Duration, ProvisionError> {
        humantime::parse_duration(self.connection.timeout.trim()).map_err(|e| {
            ProvisionError::Config(format!("invalid timeout `{}`: {}", self.connection.timeout, e))
        })
    }

    /// The dialect's catalog with configured overrides applied.
    pub fn statement_catalog(&self) -> StatementCatalog {
        self.statements.apply(self.connection.dialect.catalog())
    }

    /// Build the sequencer input. Fails on an unparsable timeout.
    pub fn to_request(&self) -> Result<ProvisionRequest, ProvisionError> {
        Ok(ProvisionRequest {
            principal: self.connection.user.clone(),
            credential: self.connection.password.clone(),
            host: self.connection.server.clone(),
            service: self.connection.service_name.clone(),
            ping_timeout: self.ping_timeout()?,
            admin_account: self.account.name.clone(),
            admin_credential: self.account.credential.clone(),
            drop_policy: self.account.drop_policy,
            statements: self.statement_catalog(),
        })
    }
}

fn with_legacy_env<F>(
    builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    LEGACY_ENV_VARS
        .iter()
        .try_fold(builder, |builder, (var, key)| builder.set_override_option(*key, lookup(*var)))
}
