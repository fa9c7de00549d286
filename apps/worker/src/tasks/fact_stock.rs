use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use fleet_db::repositories::staging::fact_stock::FactStockRow;
use fleet_db::FactStockRepository;
use fleet_domain::{TaskError, TaskErrorKind, TaskStatus};
use marketplace_client::dto::ReportPeriod;
use marketplace_client::{MarketplaceResponse, RequestLimiter};

use crate::store_process::{Task, TaskContext};

pub struct FactStockTask {
    status: TaskStatus,
    last_run_time: Instant,
    limiter: RequestLimiter,
}

impl FactStockTask {
    pub fn new(last_run_time: Instant) -> Self {
        Self {
            status: TaskStatus::InProgress,
            last_run_time,
            limiter: RequestLimiter::new(3, Duration::from_secs(60)),
        }
    }
}

#[async_trait]
impl Task for FactStockTask {
    fn name(&self) -> &'static str {
        "fact_stock"
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
        let repo = FactStockRepository::new(ctx.pool.clone());
        let target_date = (Utc::now() - chrono::Duration::days(1)).date_naive();

        if repo
            .is_yesterday_loaded(ctx.store_id)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "fact_stock", e.to_string()))?
        {
            self.status = TaskStatus::Success;
            return Ok(self.status);
        }

        let now = Instant::now();
        if self.limiter.check(now).is_some() {
            return Ok(TaskStatus::InProgress);
        }

        let period = ReportPeriod { begin: target_date.to_string(), end: target_date.to_string() };
        self.limiter.record_call(now);

        let response = ctx
            .marketplace
            .stocks_report(period)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::TransientExternal, "fact_stock", e.to_string()))?;

        let data = match response {
            MarketplaceResponse::Data(body) => body.data,
            MarketplaceResponse::Empty => return Ok(TaskStatus::InProgress),
            MarketplaceResponse::RateLimited => {
                self.limiter.block_for(now, Duration::from_secs(60));
                return Ok(TaskStatus::InProgress);
            }
        };

        let rows: Vec<FactStockRow> = data
            .items
            .iter()
            .map(|item| FactStockRow {
                nm_id: item.nm_id,
                stock_count: item.metrics.stock_count,
                to_client_count: item.metrics.to_client_count,
                from_client_count: item.metrics.from_client_count,
            })
            .collect();

        repo.insert_rows(ctx.store_id, target_date, &rows)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "fact_stock", e.to_string()))?;

        self.status = TaskStatus::Success;
        Ok(self.status)
    }
}
