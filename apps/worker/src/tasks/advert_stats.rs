use std::time::{Duration, Instant};

use async_trait::async_trait;
use fleet_db::repositories::staging::advert_stats::AdvertStatRow;
use fleet_db::{AdvertInfoRepository, AdvertStatsRepository};
use fleet_domain::{TaskError, TaskErrorKind, TaskStatus};
use marketplace_client::dto::FullstatsRequestItem;
use marketplace_client::{MarketplaceResponse, RequestLimiter};

use crate::store_process::{Task, TaskContext};

const SLA: &str = "6 hours 15 minutes";

pub struct AdvertStatsTask {
    status: TaskStatus,
    last_run_time: Instant,
    limiter: RequestLimiter,
}

impl AdvertStatsTask {
    pub fn new(last_run_time: Instant) -> Self {
        Self {
            status: TaskStatus::InProgress,
            last_run_time,
            limiter: RequestLimiter::new(1, Duration::from_secs(70)),
        }
    }
}

#[async_trait]
impl Task for AdvertStatsTask {
    fn name(&self) -> &'static str {
        "advert_stats"
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
        let info_repo = AdvertInfoRepository::new(ctx.pool.clone());
        let stats_repo = AdvertStatsRepository::new(ctx.pool.clone());

        let list_fresh = info_repo
            .advert_list_is_fresh(ctx.store_id, SLA)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_stats", e.to_string()))?;
        let info_fresh = info_repo
            .advert_info_is_fresh(ctx.store_id, SLA)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_stats", e.to_string()))?;

        if !list_fresh || !info_fresh {
            return Ok(TaskStatus::InProgress);
        }

        if !stats_repo
            .load_grid_matches_advert_list(ctx.store_id)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_stats", e.to_string()))?
        {
            stats_repo
                .regenerate_load_grid(ctx.store_id)
                .await
                .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_stats", e.to_string()))?;
        }

        if stats_repo
            .is_fully_loaded(ctx.store_id)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_stats", e.to_string()))?
        {
            self.status = TaskStatus::Success;
            return Ok(self.status);
        }

        let chunks = stats_repo
            .next_load_chunks(ctx.store_id)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_stats", e.to_string()))?;

        if chunks.is_empty() {
            return Ok(TaskStatus::InProgress);
        }

        let now = Instant::now();
        if self.limiter.check(now).is_some() {
            return Ok(TaskStatus::InProgress);
        }

        let items: Vec<FullstatsRequestItem> = chunks
            .iter()
            .map(|c| FullstatsRequestItem { id: c.advert_id, dates: c.dates.clone() })
            .collect();

        self.limiter.record_call(now);
        let response = ctx
            .marketplace
            .advert_fullstats(&items)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::TransientExternal, "advert_stats", e.to_string()))?;

        let entries = match response {
            MarketplaceResponse::Data(entries) => entries,
            MarketplaceResponse::Empty => Vec::new(),
            MarketplaceResponse::RateLimited => {
                self.limiter.block_for(now, Duration::from_secs(60));
                return Ok(TaskStatus::InProgress);
            }
        };

        if !entries.is_empty() {
            let mut rows = Vec::new();
            for entry in &entries {
                for day in &entry.days {
                    for app in &day.apps {
                        for nm in &app.nm {
                            rows.push(AdvertStatRow {
                                advert_id: entry.advert_id,
                                date: day.date,
                                app_type: app.app_type.to_string(),
                                nm_id: nm.nm_id,
                                views: nm.views,
                                clicks: nm.clicks,
                                ctr: nm.ctr,
                                cpc: nm.cpc,
                                sum_rub: nm.sum,
                                atbs: nm.atbs,
                                orders: nm.orders,
                                shks: nm.shks,
                                sum_price: nm.sum_price,
                            });
                        }
                    }
                }
            }

            stats_repo
                .upsert_stats(ctx.store_id, &rows)
                .await
                .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_stats", e.to_string()))?;
        }

        stats_repo
            .mark_loaded(ctx.store_id, &chunks)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_stats", e.to_string()))?;

        if stats_repo
            .is_fully_loaded(ctx.store_id)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_stats", e.to_string()))?
        {
            self.status = TaskStatus::Success;
        }

        Ok(self.status)
    }
}
