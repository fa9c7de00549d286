// [apps/worker/src/store_process.rs]
/*!
 * =================================================================
 * APARATO: STORE PROCESS STATE MACHINE (V5.0 - FLOTA SOBERANA)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: RONDA DE SEIS TAREAS POR TIENDA, PRESUPUESTO DE ERRORES
 *
 * VISION:
 * 1. ROUND ROBIN NOMINAL: La tarea más atrasada (`last_run_time` mínimo)
 *    siempre se adelanta primero — ninguna tarea queda varada.
 * 2. VEREDICTO SIN AMBIGÜEDAD: Todas las tareas terminales -> SUCCESS,
 *    sin excepción por tareas que terminaron en ERROR; solo el
 *    presupuesto de errores o el tiempo de vida máximo escalan a ERROR.
 *    =================================================================
 */

use std::time::{Duration, Instant};

use async_trait::async_trait;
use fleet_domain::{TaskError, TaskErrorKind, TaskStatus};
use marketplace_client::MarketplaceClient;
use tracing::{error, info, warn};

use crate::tasks::{
    advert_info::AdvertInfoTask, advert_stats::AdvertStatsTask, cards_list::CardsListTask,
    fact_sales::FactSalesTask, fact_stock::FactStockTask, nm_report_detail::NmReportDetailTask,
};

pub const MAX_STORE_LIVE: Duration = Duration::from_secs(5600);
pub const MAX_STORE_ERRORS: u32 = 100;

/// Everything a task needs to do its work, threaded through by reference so
/// `StoreProcess` owns exactly one of each and every task step borrows it.
pub struct TaskContext {
    pub pool: sqlx::PgPool,
    pub marketplace: MarketplaceClient,
    pub store_id: i64,
}

/// One idempotent unit of per-store ingestion work. Every implementation is
/// free to run its own internal multi-call pagination inside a single
/// `step()`; `StoreProcess` only cares about the terminal status it settles
/// into.
#[async_trait]
pub trait Task: Send {
    fn name(&self) -> &'static str;
    fn status(&self) -> TaskStatus;
    fn last_run_time(&self) -> Instant;
    fn set_last_run_time(&mut self, at: Instant);
    async fn step(&mut self, ctx: &TaskContext) -> Result<TaskStatus, TaskError>;
}

/// Outcome of one `store_process_iter()` call: either the store is still
/// being worked, or it finished one way or the other and should be dropped
/// from the worker's round-robin list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreProcessOutcome {
    InProgress,
    Success,
    Error,
}

/// The six-task state machine for one store, mirroring
/// `store_process.py`'s construction order and staggered initial
/// `last_run_time` offsets so the first round-robin cycle still prioritizes
/// `CardsList` first.
pub struct StoreProcess {
    pub store_id: i64,
    pub store_process_id: i64,
    tasks: Vec<Box<dyn Task>>,
    started_at: Instant,
    error_count: u32,
}

impl StoreProcess {
    pub fn new(store_id: i64, store_process_id: i64) -> Self {
        let now = Instant::now();
        let stagger = |secs: u64| now - Duration::from_secs(45u64.saturating_sub(secs));

        let tasks: Vec<Box<dyn Task>> = vec![
            Box::new(CardsListTask::new(stagger(0))),
            Box::new(NmReportDetailTask::new(stagger(5))),
            Box::new(FactStockTask::new(stagger(10))),
            Box::new(FactSalesTask::new(stagger(15))),
            Box::new(AdvertInfoTask::new(stagger(30))),
            Box::new(AdvertStatsTask::new(stagger(40))),
        ];

        Self {
            store_id,
            store_process_id,
            tasks,
            started_at: now,
            error_count: 0,
        }
    }

    fn earliest_pending(&mut self) -> Option<&mut Box<dyn Task>> {
        self.tasks
            .iter_mut()
            .filter(|t| !t.status().is_terminal())
            .min_by_key(|t| t.last_run_time())
    }

    fn all_terminal(&self) -> bool {
        self.tasks.iter().all(|t| t.status().is_terminal())
    }

    /// Runs the single most-overdue non-terminal task once. This is the Rust
    /// equivalent of `store_process_iter()`: the error-count and lifetime
    /// overruns *do* return `StoreProcessOutcome::Error` here (the original
    /// constructed but never returned that response on those two branches —
    /// fixed per the documented intended behavior rather than preserved).
    /// Every task reaching a terminal state, errored or not, is SUCCESS —
    /// mirroring `check_tasks_ready()`'s unconditional "no task IN_PROGRESS"
    /// check with no carve-out for ERROR among the terminal tasks.
    pub async fn tick(&mut self, ctx: &TaskContext) -> StoreProcessOutcome {
        if self.error_count > MAX_STORE_ERRORS {
            error!(store_id = self.store_id, count = self.error_count, "store exceeded max task errors");
            return StoreProcessOutcome::Error;
        }

        if self.started_at.elapsed() > MAX_STORE_LIVE {
            error!(store_id = self.store_id, "store process exceeded max lifetime");
            return StoreProcessOutcome::Error;
        }

        let Some(task) = self.earliest_pending() else {
            return StoreProcessOutcome::Success;
        };

        let name = task.name();
        let now = Instant::now();
        task.set_last_run_time(now);

        match task.step(ctx).await {
            Ok(status) => {
                info!(store_id = self.store_id, task = name, ?status, "task step completed");
            }
            Err(e) => {
                self.error_count += 1;
                match e.kind {
                    TaskErrorKind::BusinessFinal => {
                        error!(store_id = self.store_id, task = name, error = %e, "task failed permanently");
                    }
                    _ => {
                        warn!(store_id = self.store_id, task = name, error = %e, "task step failed, will retry");
                    }
                }
            }
        }

        if self.all_terminal() {
            StoreProcessOutcome::Success
        } else {
            StoreProcessOutcome::InProgress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubTask {
        name: &'static str,
        status: TaskStatus,
        last_run_time: Instant,
        outcome: Result<TaskStatus, TaskError>,
    }

    #[async_trait]
    impl Task for StubTask {
        fn name(&self) -> &'static str {
            self.name
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
        async fn step(&mut self, _ctx: &TaskContext) -> Result<TaskStatus, TaskError> {
            self.outcome.clone().inspect(|&status| {
                self.status = status;
            })
        }
    }

    fn process_with(tasks: Vec<Box<dyn Task>>) -> StoreProcess {
        StoreProcess {
            store_id: 1,
            store_process_id: 1,
            tasks,
            started_at: Instant::now(),
            error_count: 0,
        }
    }

    fn ctx() -> TaskContext {
        TaskContext {
            pool: sqlx::PgPool::connect_lazy("postgres://localhost/does-not-matter").unwrap(),
            marketplace: MarketplaceClient::new("test-token", Default::default()).unwrap(),
            store_id: 1,
        }
    }

    #[tokio::test]
    async fn picks_earliest_pending_first() {
        let now = Instant::now();
        let mut process = process_with(vec![
            Box::new(StubTask {
                name: "late",
                status: TaskStatus::InProgress,
                last_run_time: now,
                outcome: Ok(TaskStatus::Success),
            }),
            Box::new(StubTask {
                name: "early",
                status: TaskStatus::InProgress,
                last_run_time: now - Duration::from_secs(100),
                outcome: Ok(TaskStatus::Success),
            }),
        ]);

        let task = process.earliest_pending().unwrap();
        assert_eq!(task.name(), "early");
    }

    #[tokio::test]
    async fn in_progress_until_every_task_is_terminal() {
        let mut process = process_with(vec![
            Box::new(StubTask {
                name: "a",
                status: TaskStatus::InProgress,
                last_run_time: Instant::now() - Duration::from_secs(10),
                outcome: Ok(TaskStatus::Success),
            }),
            Box::new(StubTask {
                name: "b",
                status: TaskStatus::InProgress,
                last_run_time: Instant::now(),
                outcome: Ok(TaskStatus::Success),
            }),
        ]);

        let ctx = ctx();
        assert_eq!(process.tick(&ctx).await, StoreProcessOutcome::InProgress);
        assert_eq!(process.tick(&ctx).await, StoreProcessOutcome::Success);
    }

    #[tokio::test]
    async fn a_failing_task_stays_in_progress_and_counts_toward_the_error_budget() {
        let mut process = process_with(vec![Box::new(StubTask {
            name: "a",
            status: TaskStatus::InProgress,
            last_run_time: Instant::now(),
            outcome: Err(TaskError::new(TaskErrorKind::BusinessFinal, "a", "nope")),
        })]);

        let ctx = ctx();
        assert_eq!(process.tick(&ctx).await, StoreProcessOutcome::InProgress);
        assert_eq!(process.error_count, 1);
    }

    #[tokio::test]
    async fn all_terminal_is_success_even_with_an_errored_task() {
        let mut process = process_with(vec![
            Box::new(StubTask {
                name: "already-done",
                status: TaskStatus::Success,
                last_run_time: Instant::now() - Duration::from_secs(10),
                outcome: Ok(TaskStatus::Success),
            }),
            Box::new(StubTask {
                name: "settles-errored",
                status: TaskStatus::InProgress,
                last_run_time: Instant::now(),
                outcome: Ok(TaskStatus::Error),
            }),
        ]);

        let ctx = ctx();
        assert_eq!(process.tick(&ctx).await, StoreProcessOutcome::Success);
    }

    #[tokio::test]
    async fn repeated_task_errors_eventually_fail_the_store() {
        let mut process = process_with(vec![Box::new(StubTask {
            name: "a",
            status: TaskStatus::InProgress,
            last_run_time: Instant::now(),
            outcome: Err(TaskError::new(TaskErrorKind::DatabaseTransient, "a", "nope")),
        })]);

        let ctx = ctx();
        let mut outcome = StoreProcessOutcome::InProgress;
        for _ in 0..=MAX_STORE_ERRORS + 1 {
            outcome = process.tick(&ctx).await;
            if outcome == StoreProcessOutcome::Error {
                break;
            }
        }
        assert_eq!(outcome, StoreProcessOutcome::Error);
    }

    #[tokio::test]
    async fn exceeding_max_errors_returns_error_outcome() {
        let mut process = process_with(vec![Box::new(StubTask {
            name: "a",
            status: TaskStatus::InProgress,
            last_run_time: Instant::now(),
            outcome: Ok(TaskStatus::InProgress),
        })]);
        process.error_count = MAX_STORE_ERRORS + 1;

        let ctx = ctx();
        assert_eq!(process.tick(&ctx).await, StoreProcessOutcome::Error);
    }

    #[tokio::test]
    async fn exceeding_max_lifetime_returns_error_outcome() {
        let mut process = process_with(vec![Box::new(StubTask {
            name: "a",
            status: TaskStatus::InProgress,
            last_run_time: Instant::now(),
            outcome: Ok(TaskStatus::InProgress),
        })]);
        process.started_at = Instant::now() - MAX_STORE_LIVE - Duration::from_secs(1);

        let ctx = ctx();
        assert_eq!(process.tick(&ctx).await, StoreProcessOutcome::Error);
    }
}
