//! Library root for the fleet manager: the ETL/export driver loop plus its
//! HTTP control surface and the spreadsheet-export contract.

pub mod control;
pub mod driver;
pub mod export;

pub mod prelude {
    pub use crate::control::{build_router, ControlState};
    pub use crate::driver::{ManagerEngine, ManagerStatus};
    pub use crate::export::{LoggingSpreadsheetExporter, SpreadsheetExporter};
}
