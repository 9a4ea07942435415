//! High-level pipeline: orchestrates fetch → flatten → serialize → deliver
//! for one export run.
//!
//! # Responsibilities
//! - Fail-fast sequencing of the four phases; a failed phase ends the run
//!   with a phase-identifying error and nothing half-delivered
//! - Logging throughout, both structured (tracing) and to the append-only
//!   run log the operations side watches
//! - Scoped local artifact handling: the CSV is staged inside a temp
//!   directory that is removed on success and failure alike
//!
//! # Callable From
//! - The CLI (one-off runs), the weekly scheduler, and integration tests
//! - Expects concrete [`OrderSource`] and [`Deliverer`] implementations, so
//!   tests inject mocks
//!
//! # Error Handling
//! Each failed phase returns immediately with a formatted error; callers log
//! and surface these. A prior run's failure never affects the next run — no
//! state is carried between runs.

use chrono::Utc;
use tracing::{error, info};

use crate::deliver::{export_filename, Deliverer};
use crate::fetch::OrderSource;
use crate::flatten::flatten;
use crate::mapping::MappingTable;
use crate::runlog::RunLog;
use crate::serialize::to_csv;

/// What one run produced, for reporting and tests.
#[derive(Debug)]
pub struct ExportReport {
    pub order_count: usize,
    pub row_count: usize,
    /// `None` when the run ended early with no orders to export.
    pub filename: Option<String>,
}

/// Run one export: fetch all orders, flatten to rows, serialize to CSV, and
/// deliver the dated file. Zero orders is not an error; the run ends early
/// and nothing is produced.
pub async fn run_export<S, D>(
    table: &MappingTable,
    source: &S,
    deliverer: &D,
    runlog: &RunLog,
) -> Result<ExportReport, String>
where
    S: OrderSource + ?Sized,
    D: Deliverer + ?Sized,
{
    info!("[EXPORT] Starting export run");
    runlog.append("Starting export run");

    // --- Phase 1: fetch ---
    let orders = match source.fetch_all().await {
        Ok(orders) => {
            info!(count = orders.len(), "[EXPORT] Order fetch succeeded");
            orders
        }
        Err(e) => {
            error!(error = ?e, "[EXPORT][ERROR] Order fetch failed");
            runlog.append(&format!("Error fetching orders: {e}"));
            return Err(format!("Order fetch failed: {e}"));
        }
    };

    if orders.is_empty() {
        info!("[EXPORT] No orders found, run ends with nothing to deliver");
        runlog.append("No orders found");
        return Ok(ExportReport {
            order_count: 0,
            row_count: 0,
            filename: None,
        });
    }

    // --- Phase 2: flatten ---
    let rows = match flatten(table, &orders) {
        Ok(rows) => {
            info!(rows = rows.len(), "[EXPORT] Flattening succeeded");
            rows
        }
        Err(e) => {
            error!(error = %e, "[EXPORT][ERROR] Flattening failed");
            runlog.append(&format!("Flattening failed: {e}"));
            return Err(format!("Flattening failed: {e}"));
        }
    };

    // --- Phase 3: serialize ---
    let columns = table.columns();
    let payload = match to_csv(&rows, &columns) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "[EXPORT][ERROR] CSV serialization failed");
            runlog.append(&format!("CSV serialization failed: {e}"));
            return Err(format!("CSV serialization failed: {e}"));
        }
    };

    // --- Phase 4: deliver ---
    let filename = export_filename(Utc::now().date_naive());

    // The staging dir guard removes the local artifact on every exit path.
    let staging = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            error!(error = ?e, "[EXPORT][ERROR] Failed to create staging directory");
            runlog.append(&format!("Failed to create staging directory: {e}"));
            return Err(format!("Failed to create staging directory: {e}"));
        }
    };
    let local_path = staging.path().join(&filename);
    if let Err(e) = std::fs::write(&local_path, payload.as_bytes()) {
        error!(error = ?e, path = %local_path.display(), "[EXPORT][ERROR] Failed to write local export file");
        runlog.append(&format!("Failed to write local export file: {e}"));
        return Err(format!("Failed to write local export file: {e}"));
    }

    match deliverer.deliver(&local_path, &filename).await {
        Ok(()) => {
            info!(filename = %filename, "[EXPORT] File uploaded to delivery target");
            runlog.append(&format!("File {filename} uploaded"));
        }
        Err(e) => {
            error!(error = ?e, filename = %filename, "[EXPORT][ERROR] Delivery failed");
            runlog.append(&format!("Delivery failed: {e}"));
            return Err(format!("Delivery failed: {e}"));
        }
    }

    let report = ExportReport {
        order_count: orders.len(),
        row_count: rows.len(),
        filename: Some(filename),
    };
    info!(
        orders = report.order_count,
        rows = report.row_count,
        "[EXPORT] Export run complete"
    );
    runlog.append("Export run complete");
    Ok(report)
}
