use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Weekday;
use serde::Deserialize;
use tracing::{error, info};

use crate::config::{ExportConfig, ScheduleConfig, SftpConfig, ShopifyConfig};

#[derive(Deserialize)]
struct StaticConfig {
    shopify: ShopifySection,
    sftp: SftpSection,
    #[serde(default = "default_log_file")]
    log_file: PathBuf,
    #[serde(default)]
    schedule: ScheduleSection,
}

#[derive(Deserialize)]
struct ShopifySection {
    store_domain: String,
    #[serde(default = "default_api_version")]
    api_version: String,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

#[derive(Deserialize)]
struct SftpSection {
    host: String,
    #[serde(default = "default_sftp_port")]
    port: u16,
    remote_path: String,
}

#[derive(Deserialize)]
struct ScheduleSection {
    #[serde(default = "default_weekday")]
    weekday: String,
    #[serde(default = "default_hour")]
    hour: u32,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            weekday: default_weekday(),
            hour: default_hour(),
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("shopify_export.log")
}

fn default_api_version() -> String {
    "2024-01".to_string()
}

fn default_page_size() -> u32 {
    250
}

fn default_sftp_port() -> u16 {
    22
}

// Original cadence: Mondays at 01:00 UTC.
fn default_weekday() -> String {
    "Mon".to_string()
}

fn default_hour() -> u32 {
    1
}

/// Loads a static YAML config file (no secrets) and injects required env vars
/// for secrets. Returns a fully merged ExportConfig or an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExportConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let access_token = require_env("SHOPIFY_ACCESS_TOKEN")?;
    let sftp_user = require_env("SFTP_USER")?;
    let sftp_password = require_env("SFTP_PASSWORD")?;

    let weekday = match static_conf.schedule.weekday.parse::<Weekday>() {
        Ok(day) => day,
        Err(_) => {
            error!(weekday = %static_conf.schedule.weekday, "schedule.weekday is not a valid day name");
            return Err(anyhow::anyhow!(
                "schedule.weekday {:?} is not a valid day name",
                static_conf.schedule.weekday
            ));
        }
    };
    if static_conf.schedule.hour > 23 {
        error!(hour = static_conf.schedule.hour, "schedule.hour out of range");
        anyhow::bail!(
            "schedule.hour must be 0-23, got {}",
            static_conf.schedule.hour
        );
    }

    let config = ExportConfig {
        shopify: ShopifyConfig {
            store_domain: static_conf.shopify.store_domain,
            api_version: static_conf.shopify.api_version,
            page_size: static_conf.shopify.page_size,
            access_token,
        },
        sftp: SftpConfig {
            host: static_conf.sftp.host,
            port: static_conf.sftp.port,
            remote_path: static_conf.sftp.remote_path,
            username: sftp_user,
            password: sftp_password,
        },
        log_file: static_conf.log_file,
        schedule: ScheduleConfig {
            weekday,
            hour: static_conf.schedule.hour,
        },
    };

    config.trace_loaded();

    Ok(config)
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) => {
            info!(var = name, "{name} found in env");
            Ok(value)
        }
        Err(e) => {
            error!(error = ?e, var = name, "{name} environment variable not set");
            Err(anyhow::anyhow!("{name} environment variable not set: {e}"))
        }
    }
}
