use std::time::Instant;

use async_trait::async_trait;
use fleet_db::repositories::staging::cards_list::CardsListRow;
use fleet_db::CardsListRepository;
use fleet_domain::{TaskError, TaskErrorKind, TaskStatus};
use marketplace_client::dto::CardsListCursor;
use marketplace_client::MarketplaceResponse;

use crate::store_process::{Task, TaskContext};

const SLA: &str = "6 hours 15 minutes";
const PAGE_LIMIT: i64 = 100;

pub struct CardsListTask {
    status: TaskStatus,
    last_run_time: Instant,
}

impl CardsListTask {
    pub fn new(last_run_time: Instant) -> Self {
        Self { status: TaskStatus::InProgress, last_run_time }
    }

    async fn fetch_all(&self, ctx: &TaskContext) -> Result<Vec<CardsListRow>, TaskError> {
        let mut cursor = CardsListCursor { limit: PAGE_LIMIT, nm_id: None, updated_at: None };
        let mut out = Vec::new();

        loop {
            let response = ctx
                .marketplace
                .cards_list(cursor)
                .await
                .map_err(|e| TaskError::new(TaskErrorKind::TransientExternal, "cards_list", e.to_string()))?;

            let page = match response {
                MarketplaceResponse::Data(page) => page,
                MarketplaceResponse::Empty => break,
                MarketplaceResponse::RateLimited => {
                    return Err(TaskError::new(TaskErrorKind::TransientExternal, "cards_list", "rate limited"));
                }
            };

            let total = page.cursor.total;
            out.extend(page.cards.into_iter().map(|c| CardsListRow {
                nm_id: c.nm_id,
                vendor_code: c.vendor_code,
                title: c.title,
            }));

            cursor = CardsListCursor {
                limit: PAGE_LIMIT,
                nm_id: page.cursor.nm_id,
                updated_at: page.cursor.updated_at,
            };

            if total < PAGE_LIMIT {
                break;
            }
        }

        Ok(out)
    }
}

#[async_trait]
impl Task for CardsListTask {
    fn name(&self) -> &'static str {
        "cards_list"
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
        let repo = CardsListRepository::new(ctx.pool.clone());
        let (actual, count_all) = repo
            .freshness(ctx.store_id, SLA)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "cards_list", e.to_string()))?;

        if count_all > 0 && actual == count_all {
            self.status = TaskStatus::Success;
            return Ok(self.status);
        }

        let rows = self.fetch_all(ctx).await?;
        if rows.is_empty() {
            return Err(TaskError::new(TaskErrorKind::MalformedExternal, "cards_list", "cards list data is empty"));
        }

        repo.replace_all(ctx.store_id, &rows)
            .await
            .map_err(|e| TaskError::new(TaskErrorKind::DatabaseTransient, "cards_list", e.to_string()))?;

        self.status = TaskStatus::Success;
        Ok(self.status)
    }
}
