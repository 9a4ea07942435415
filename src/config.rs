use std::path::PathBuf;

use chrono::Weekday;
use tracing::info;

/// Fully merged runtime configuration for one export process: static file
/// settings plus env-injected secrets. Built once by `load_config` and passed
/// explicitly to the adapters; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub shopify: ShopifyConfig,
    pub sftp: SftpConfig,
    pub log_file: PathBuf,
    pub schedule: ScheduleConfig,
}

impl ExportConfig {
    pub fn trace_loaded(&self) {
        info!(
            store_domain = %self.shopify.store_domain,
            api_version = %self.shopify.api_version,
            page_size = self.shopify.page_size,
            sftp_host = %self.sftp.host,
            sftp_port = self.sftp.port,
            remote_path = %self.sftp.remote_path,
            log_file = %self.log_file.display(),
            weekday = ?self.schedule.weekday,
            hour = self.schedule.hour,
            "Loaded export config"
        );
    }
}

/// Order source settings, access token included after the env merge.
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    pub store_domain: String,
    pub api_version: String,
    pub page_size: u32,
    pub access_token: String,
}

/// Delivery target settings. `remote_path` is the configured base path whose
/// trailing `orders.csv` segment gets replaced by the dated filename.
#[derive(Debug, Clone)]
pub struct SftpConfig {
    pub host: String,
    pub port: u16,
    pub remote_path: String,
    pub username: String,
    pub password: String,
}

/// When the weekly run fires, in UTC.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleConfig {
    pub weekday: Weekday,
    pub hour: u32,
}
