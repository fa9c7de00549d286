use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The stage an acquire/finalize call targets. Each stage has its own
/// eligibility predicate but shares the reclaim predicate and the
/// `FOR UPDATE SKIP LOCKED` acquire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DataLoad,
    Etl,
    Export,
}

/// A `store_process` row: the lease a worker or manager holds on a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreProcess {
    pub store_process_id: i64,
    pub store_id: i64,
    pub running: bool,
    pub service: Option<String>,
    pub process_health_check: Option<DateTime<Utc>>,
    pub last_worker_start: Option<DateTime<Utc>>,
    pub last_worker_end: Option<DateTime<Utc>>,
    pub last_data_load: Option<DateTime<Utc>>,
    pub last_dm_etl: Option<DateTime<Utc>>,
    pub last_client_load: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A `service_health` row, upserted periodically by every running service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub service_type: String,
    pub service_name: String,
    pub version: String,
    pub last_health_check: DateTime<Utc>,
}
