use std::time::Instant;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

use async_trait::async_trait;
use fleet_db::repositories::staging::fact_sales::FactSalesRow;
use fleet_db::FactSalesRepository;
use fleet_domain::{TaskError, TaskErrorKind, TaskStatus};
use marketplace_client::MarketplaceResponse;

use crate::store_process::{Task, TaskContext};

fn default_cursor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

/// How stale a "final" cursor may be before the task reloads anyway — the
/// same SLA window every other task uses, applied here in Rust rather than
/// as a SQL predicate since this table only ever holds one row per store.
fn sla_stale(last_change_date: DateTime<Utc>) -> bool {
    let today_midnight = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap();
    let cutoff = today_midnight.and_utc() + ChronoDuration::hours(6) + ChronoDuration::minutes(15);
    last_change_date < cutoff
}

pub struct FactSalesTask {
    status: TaskStatus,
    last_run_time: Instant,
}

impl FactSalesTask {
    pub fn new(last_run_time: Instant) -> Self {
        Self { status: TaskStatus::InProgress, last_run_time }
    }
}

#[async_trait]
impl Task for FactSalesTask {
    fn name(&self) -> &'static str {
        "fact_sales"
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn last_run_time(&self) -> Instant {
        self.last_run_time
    }

    fn set_last_run_time(&mut self, at: Instant) {
        self.last_run_time = at;
    }

    async fn step(&mut self, ctx: &TaskContext) -> Result<TaskStatus, TaskError> {
        let repo = FactSalesRepository::new(ctx.pool.clone());
        let progress = repo
            .progress(ctx.store_id, default_cursor())
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "fact_sales", e.to_string()))?;

        if progress.is_final && !sla_stale(progress.last_change_date) {
            self.status = TaskStatus::Success;
            return Ok(self.status);
        }

        let date_from = progress.last_change_date.format("%Y-%m-%dT%H:%M:%S").to_string();
        let response = ctx
            .marketplace
            .supplier_sales(&date_from)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::TransientExternal, "fact_sales", e.to_string()))?;

        let records = match response {
            MarketplaceResponse::Data(records) => records,
            MarketplaceResponse::Empty => Vec::new(),
            MarketplaceResponse::RateLimited => {
                return Ok(TaskStatus::InProgress);
            }
        };

        if records.is_empty() {
            repo.advance_progress(ctx.store_id, progress.last_change_date, true)
                .await
                .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "fact_sales", e.to_string()))?;
            self.status = TaskStatus::Success;
            return Ok(self.status);
        }

        let newest = records
            .iter()
            .map(|r| r.last_change_date)
            .max()
            .unwrap_or(progress.last_change_date);

        let rows: Vec<FactSalesRow> = records
            .iter()
            .map(|r| FactSalesRow {
                sale_id: r.sale_id.clone(),
                nm_id: r.nm_id,
                date: r.date,
                last_change_date: r.last_change_date,
                sale_type: r.sale_id.chars().next().map(|c| c.to_string()),
                price_with_disc: r.price_with_disc,
            })
            .collect();

        repo.upsert_rows(ctx.store_id, &rows)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "fact_sales", e.to_string()))?;

        repo.advance_progress(ctx.store_id, newest, false)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "fact_sales", e.to_string()))?;

        Ok(TaskStatus::InProgress)
    }
}
