use std::time::{Duration, Instant};

use async_trait::async_trait;
use fleet_db::repositories::staging::nm_report_detail::ReportDetailRow;
use fleet_db::NmReportDetailRepository;
use fleet_domain::{TaskError, TaskErrorKind, TaskStatus};
use marketplace_client::dto::ReportPeriod;
use marketplace_client::{MarketplaceResponse, RequestLimiter};

use crate::store_process::{Task, TaskContext};

const SLA: &str = "6 hours 15 minutes";

pub struct NmReportDetailTask {
    status: TaskStatus,
    last_run_time: Instant,
    limiter: RequestLimiter,
}

impl NmReportDetailTask {
    pub fn new(last_run_time: Instant) -> Self {
        Self {
            status: TaskStatus::InProgress,
            last_run_time,
            limiter: RequestLimiter::new(3, Duration::from_secs(60)),
        }
    }
}

#[async_trait]
impl Task for NmReportDetailTask {
    fn name(&self) -> &'static str {
        "nm_report_detail"
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
        let repo = NmReportDetailRepository::new(ctx.pool.clone());
        let next = repo
            .next_to_load(ctx.store_id, SLA)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "nm_report_detail", e.to_string()))?;

        let Some(next) = next else {
            self.status = TaskStatus::Success;
            return Ok(self.status);
        };

        let page = match next.is_next_page {
            None => {
                repo.delete_date(ctx.store_id, next.target_date)
                    .await
                    .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "nm_report_detail", e.to_string()))?;
                1
            }
            Some(true) => next.page.unwrap_or(1) + 1,
            Some(false) => {
                // already fully paged for this date; next_to_load should not
                // have returned it, but treat defensively as complete.
                return Ok(TaskStatus::InProgress);
            }
        };

        let now = Instant::now();
        if self.limiter.check(now).is_some() {
            return Ok(TaskStatus::InProgress);
        }

        let period = ReportPeriod {
            begin: format!("{} 00:00:00", next.target_date),
            end: format!("{} 23:59:59", next.target_date),
        };

        self.limiter.record_call(now);
        let response = ctx
            .marketplace
            .nm_report_detail(period, page)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::TransientExternal, "nm_report_detail", e.to_string()))?;

        let data = match response {
            MarketplaceResponse::Data(body) => body.data,
            MarketplaceResponse::Empty => return Ok(TaskStatus::InProgress),
            MarketplaceResponse::RateLimited => {
                self.limiter.block_for(now, Duration::from_secs(60));
                return Ok(TaskStatus::InProgress);
            }
        };

        let rows: Vec<ReportDetailRow> = data
            .cards
            .iter()
            .map(|c| {
                let s = &c.statistics.selected_period;
                ReportDetailRow {
                    nm_id: c.nm_id,
                    open_card_count: s.open_card_count,
                    add_to_cart_count: s.add_to_cart_count,
                    orders_count: s.orders_count,
                    orders_sum_rub: s.orders_sum_rub,
                    buyouts_count: s.buyouts_count,
                    buyouts_sum_rub: s.buyouts_sum_rub,
                    cancel_count: s.cancel_count,
                    cancel_sum_rub: s.cancel_sum_rub,
                    avg_price_rub: s.avg_price_rub,
                }
            })
            .collect();

        repo.insert_rows(ctx.store_id, next.target_date, &rows)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "nm_report_detail", e.to_string()))?;

        match next.is_next_page {
            None => {
                repo.insert_progress(ctx.store_id, next.target_date, page, data.is_next_page)
                    .await
                    .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "nm_report_detail", e.to_string()))?;
            }
            Some(true) => {
                repo.update_progress(next.target_id.unwrap_or_default(), ctx.store_id, next.target_date, page, data.is_next_page)
                    .await
                    .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "nm_report_detail", e.to_string()))?;
            }
            Some(false) => {}
        }

        Ok(TaskStatus::InProgress)
    }
}
