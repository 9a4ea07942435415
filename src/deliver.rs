//! Delivery adapter: names the run's artifact and pushes it to the remote
//! SFTP target. The trait is the seam; the pipeline never sees connection or
//! auth details, only "this local file, under this remote name".

use std::io::Write;
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::{automock, predicate::*};
use ssh2::Session;
use tracing::{error, info};

use crate::config::SftpConfig;

pub type DeliverError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for transmitting one finished export file to its destination.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Deliverer: Send + Sync {
    /// Upload the file at `local_path` so it appears remotely as
    /// `remote_name`. All-or-nothing: no partial delivery state is kept.
    async fn deliver(&self, local_path: &Path, remote_name: &str) -> Result<(), DeliverError>;
}

/// The artifact name for a run on the given UTC date.
pub fn export_filename(date: NaiveDate) -> String {
    format!("HCM_001_SHOPIFY_ECOMM_{}.csv", date.format("%Y%m%d"))
}

/// The remote path for an upload: the configured base path with its trailing
/// `orders.csv` segment substituted by the generated filename. A base path
/// without that segment is used as-is.
pub fn remote_target(base_path: &str, remote_name: &str) -> String {
    match base_path.strip_suffix("orders.csv") {
        Some(prefix) => format!("{prefix}{remote_name}"),
        None => base_path.to_string(),
    }
}

/// Password-authenticated SFTP implementation of [`Deliverer`].
pub struct SftpDeliverer {
    config: SftpConfig,
}

impl SftpDeliverer {
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Deliverer for SftpDeliverer {
    async fn deliver(&self, local_path: &Path, remote_name: &str) -> Result<(), DeliverError> {
        let config = self.config.clone();
        let local_path: PathBuf = local_path.to_path_buf();
        let remote_name = remote_name.to_string();

        // libssh2 is synchronous; keep it off the async runtime's workers.
        tokio::task::spawn_blocking(move || put_file(&config, &local_path, &remote_name)).await?
    }
}

fn put_file(config: &SftpConfig, local_path: &Path, remote_name: &str) -> Result<(), DeliverError> {
    let addr = format!("{}:{}", config.host, config.port);
    info!(addr = %addr, "Connecting to SFTP target");

    let tcp = TcpStream::connect(&addr)?;
    let mut session = Session::new()?;
    session.set_tcp_stream(tcp);
    session.handshake()?;
    session.userauth_password(&config.username, &config.password)?;

    let payload = std::fs::read(local_path)?;
    let remote_path = remote_target(&config.remote_path, remote_name);

    let sftp = session.sftp()?;
    let mut remote_file = match sftp.create(Path::new(&remote_path)) {
        Ok(file) => file,
        Err(e) => {
            error!(error = ?e, remote_path = %remote_path, "Failed to create remote file");
            return Err(Box::new(e));
        }
    };
    remote_file.write_all(&payload)?;

    info!(
        remote_path = %remote_path,
        bytes = payload.len(),
        "Uploaded export file to SFTP target"
    );
    Ok(())
}
