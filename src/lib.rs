pub mod config;
pub mod deliver;
pub mod export;
pub mod fetch;
pub mod flatten;
pub mod load_config;
pub mod mapping;
pub mod runlog;
pub mod schedule;
pub mod serialize;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use deliver::SftpDeliverer;
use export::run_export;
use fetch::ShopifyOrderSource;
use load_config::load_config;
use mapping::MappingTable;
use runlog::RunLog;
use schedule::run_weekly;

#[derive(Parser)]
#[clap(
    name = "shopify-order-export",
    version,
    about = "Flatten Shopify orders into a per-line-item CSV and deliver it over SFTP"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one export now using the given config file
    Export {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Run the weekly export schedule in the foreground
    Schedule {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export { config } => {
            let config = load_config(config)?;
            let table = MappingTable::order_export();
            let source = ShopifyOrderSource::new(config.shopify.clone());
            let deliverer = SftpDeliverer::new(config.sftp.clone());
            let runlog = RunLog::new(config.log_file.clone());

            println!("Export starting...");
            match run_export(&table, &source, &deliverer, &runlog).await {
                Ok(report) => {
                    println!("Export complete.\nReport:");
                    println!("{:#?}", report);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Export failed: {}", e);
                    Err(anyhow::Error::msg(e))
                }
            }
        }
        Commands::Schedule { config } => {
            let config = load_config(config)?;
            let table = MappingTable::order_export();
            let source = ShopifyOrderSource::new(config.shopify.clone());
            let deliverer = SftpDeliverer::new(config.sftp.clone());
            let runlog = RunLog::new(config.log_file.clone());

            println!("Schedule starting...");
            run_weekly(&config.schedule, &table, &source, &deliverer, &runlog).await;
            Ok(())
        }
    }
}
