use std::collections::HashMap;
use std::env;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEV_DEFAULT_ADMIN_TOKEN: &str = "development_admin_token_do_not_use_in_production";

/// Locations of the tabular data files the service reads and writes.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    #[serde(default = "default_items_file")]
    pub items_file: String,

    #[serde(default = "default_customers_file")]
    pub customers_file: String,

    /// Directory of per-customer entitlement files
    /// (`{number}.csv`, `{number}_*.csv`).
    #[serde(default = "default_entitlements_dir")]
    pub entitlements_dir: String,

    /// Append-only order ledger file; created on first submission.
    #[serde(default = "default_orders_file")]
    pub orders_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            items_file: default_items_file(),
            customers_file: default_customers_file(),
            entitlements_dir: default_entitlements_dir(),
            orders_file: default_orders_file(),
        }
    }
}

/// Target column contract for the order export. `columns` is the exact output
/// order; `constants` supplies fixed values for columns that do not bind to a
/// ledger field. Defaults mirror the downstream ERP ingestion contract.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    #[serde(default = "default_export_columns")]
    pub columns: Vec<String>,

    #[serde(default = "default_export_constants")]
    pub constants: HashMap<String, String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            columns: default_export_columns(),
            constants: default_export_constants(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Shared secret for admin-only operations (export, reload).
    #[validate(length(min = 16))]
    pub admin_token: String,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_items_file() -> String {
    "data/items.csv".to_string()
}

fn default_customers_file() -> String {
    "data/customers.csv".to_string()
}

fn default_entitlements_dir() -> String {
    "data/customer_items".to_string()
}

fn default_orders_file() -> String {
    "data/orders.csv".to_string()
}

fn default_export_columns() -> Vec<String> {
    [
        "OrderNumber",
        "CustomerNumber",
        "MaterialNumber",
        "OrderQuantity",
        "CustomerReferenceDate",
        "SalesOrderType",
        "SalesOrg",
        "DistributionChannel",
        "Division",
        "SoldToParty",
        "ShipToParty",
        "CustomerPOReference",
        "UnitOfMeasure",
        "PurchaseOrderType",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_export_constants() -> HashMap<String, String> {
    [
        ("SalesOrderType", "ZOR"),
        ("SalesOrg", "1652"),
        ("DistributionChannel", "01"),
        ("Division", "01"),
        ("CustomerPOReference", "Pepperi Backup"),
        ("UnitOfMeasure", "CS"),
        ("PurchaseOrderType", "EXO"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("admin_token is not set: provide APP__ADMIN_TOKEN or a config file entry")]
    MissingAdminToken,
}

/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // admin_token has no production default. Development gets a fixed token
    // with a warning; everywhere else the missing value is a startup error.
    let mut config: AppConfig = match config.get_string("admin_token") {
        Ok(_) => config.try_deserialize()?,
        Err(_) if run_env == "development" => {
            let config = Config::builder()
                .add_source(config)
                .set_override("admin_token", DEV_DEFAULT_ADMIN_TOKEN)?
                .build()?;
            warn!("admin_token not set; using the built-in development token");
            config.try_deserialize()?
        }
        Err(_) => return Err(AppConfigError::MissingAdminToken),
    };
    config.environment = run_env;

    config.validate()?;
    Ok(config)
}

/// Initializes the global tracing subscriber. `RUST_LOG` overrides the
/// configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("orderdesk_api={},tower_http=info", level);
    let directive = env::var("RUST_LOG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        let _ = registry.with(fmt::layer().json()).try_init();
    } else {
        let _ = registry.with(fmt::layer()).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(admin_token: &str) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            environment: "test".into(),
            log_level: default_log_level(),
            log_json: false,
            admin_token: admin_token.into(),
            data: DataConfig::default(),
            export: ExportConfig::default(),
        }
    }

    #[test]
    fn short_admin_token_fails_validation() {
        assert!(base_config("short").validate().is_err());
        assert!(base_config("long_enough_admin_token").validate().is_ok());
    }

    #[test]
    fn default_export_layout_matches_erp_contract() {
        let columns = default_export_columns();
        assert_eq!(columns.len(), 14);
        assert_eq!(columns[0], "OrderNumber");
        assert_eq!(columns[13], "PurchaseOrderType");
        let constants = default_export_constants();
        assert_eq!(constants.get("SalesOrderType").map(String::as_str), Some("ZOR"));
        assert_eq!(constants.get("UnitOfMeasure").map(String::as_str), Some("CS"));
    }
}
