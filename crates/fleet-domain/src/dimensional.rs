use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the wide dimensional table (`dim_tech_list`) the manager's ETL
/// produces and the spreadsheet export reads. The six advert types are
/// pivoted into column families (`*_auto`, `*_mix`, `*_cat`, `*_card`,
/// `*_search`, `*_main`) ahead of time by the ETL query itself; this struct
/// only carries the columns this crate needs to name explicitly, the rest
/// ride along as `extra` when rows are fetched generically for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionalRow {
    pub store_id: i64,
    pub date: NaiveDate,
    pub nm_id: i64,
    pub vendor_code: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
