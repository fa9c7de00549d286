//! The spreadsheet upload contract, kept as a trait so the concrete Google
//! Sheets HTTP calls stay a pluggable collaborator (out of scope for this
//! workspace) while the driver's use of it is fully implemented.
//!
//! Grounded on `google_sheet_uploader.py::upload_store_data`'s steps:
//! confirm access, ensure the target sheet exists, clear it, then one
//! `values.update` call with the header row followed by the data rows.

use async_trait::async_trait;
use fleet_db::ExportTable;
use tracing::info;

#[async_trait]
pub trait SpreadsheetExporter: Send + Sync {
    async fn upload(&self, spreadsheet_id: &str, store_id: i64, table: &ExportTable) -> bool;
}

/// Stand-in for the real Google Sheets client: logs the would-be upload
/// instead of making a network call, matching the original's return-bool
/// success contract so the driver's finalize-on-success logic is unchanged.
pub struct LoggingSpreadsheetExporter;

#[async_trait]
impl SpreadsheetExporter for LoggingSpreadsheetExporter {
    async fn upload(&self, spreadsheet_id: &str, store_id: i64, table: &ExportTable) -> bool {
        if table.rows.is_empty() {
            info!(store_id, spreadsheet_id, "no data to upload, skipping");
            return false;
        }

        info!(
            store_id,
            spreadsheet_id,
            columns = table.headers.len(),
            rows = table.rows.len(),
            "would upload store table to spreadsheet"
        );
        true
    }
}
