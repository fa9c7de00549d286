use std::time::{Duration, Instant};

use async_trait::async_trait;
use fleet_db::repositories::staging::advert_info::{AdvertInfoUpdate, AdvertListRow, ADVERT_INFO_BATCH_SIZE};
use fleet_db::AdvertInfoRepository;
use fleet_domain::{TaskError, TaskErrorKind, TaskStatus};
use marketplace_client::MarketplaceResponse;

use crate::store_process::{Task, TaskContext};

const SLA: &str = "6 hours 15 minutes";
const MAX_IDS_PER_TICK: i64 = 10_000;

pub struct AdvertInfoTask {
    status: TaskStatus,
    last_run_time: Instant,
}

impl AdvertInfoTask {
    pub fn new(last_run_time: Instant) -> Self {
        Self { status: TaskStatus::InProgress, last_run_time }
    }
}

#[async_trait]
impl Task for AdvertInfoTask {
    fn name(&self) -> &'static str {
        "advert_info"
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
        let repo = AdvertInfoRepository::new(ctx.pool.clone());

        let list_fresh = repo
            .advert_list_is_fresh(ctx.store_id, SLA)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_info", e.to_string()))?;
        let info_fresh = repo
            .advert_info_is_fresh(ctx.store_id, SLA)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_info", e.to_string()))?;

        if list_fresh && info_fresh {
            self.status = TaskStatus::Success;
            return Ok(self.status);
        }

        if !list_fresh {
            let response = ctx
                .marketplace
                .advert_count()
                .await
                .map_err(|e| TaskError::new(TaskErrorKind::TransientExternal, "advert_info", e.to_string()))?;

            match response {
                MarketplaceResponse::Data(body) => {
                    let rows: Vec<AdvertListRow> = body
                        .adverts
                        .into_iter()
                        .flat_map(|group| {
                            group
                                .advert_list
                                .into_iter()
                                .map(move |entry| AdvertListRow { advert_id: entry.advert_id, advert_type: group.advert_type })
                        })
                        .collect();
                    repo.replace_advert_list(ctx.store_id, &rows)
                        .await
                        .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_info", e.to_string()))?;
                }
                MarketplaceResponse::Empty | MarketplaceResponse::RateLimited => {
                    return Ok(TaskStatus::InProgress);
                }
            }

            let list_fresh_now = repo
                .advert_list_is_fresh(ctx.store_id, SLA)
                .await
                .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_info", e.to_string()))?;
            if !list_fresh_now {
                return Ok(TaskStatus::InProgress);
            }
        }

        if !repo
            .advert_info_is_fresh(ctx.store_id, SLA)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_info", e.to_string()))?
        {
            let ids = repo
                .adverts_needing_info(ctx.store_id, SLA, MAX_IDS_PER_TICK)
                .await
                .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_info", e.to_string()))?;

            if ids.is_empty() {
                return Ok(TaskStatus::InProgress);
            }

            let mut updates = Vec::new();
            let mut aborted = false;
            for chunk in ids.chunks(ADVERT_INFO_BATCH_SIZE as usize) {
                tokio::time::sleep(Duration::from_millis(250)).await;
                match ctx.marketplace.advert_info(chunk).await {
                    Ok(MarketplaceResponse::Data(details)) => {
                        updates.extend(details.into_iter().map(|d| AdvertInfoUpdate {
                            advert_id: d.advert_id,
                            start_time: d.start_time,
                            end_time: d.end_time,
                            create_time: d.create_time,
                            change_time: d.change_time,
                        }));
                    }
                    Ok(MarketplaceResponse::RateLimited) => {}
                    Ok(MarketplaceResponse::Empty) | Err(_) => {
                        aborted = true;
                        break;
                    }
                }
            }

            if aborted || updates.is_empty() {
                return Ok(TaskStatus::InProgress);
            }

            repo.apply_info_updates(ctx.store_id, &updates)
                .await
                .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_info", e.to_string()))?;
        }

        if repo
            .advert_info_is_fresh(ctx.store_id, SLA)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "advert_info", e.to_string()))?
        {
            self.status = TaskStatus::Success;
        }

        Ok(self.status)
    }
}
