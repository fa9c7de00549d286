//! Library root for the store-analytics ingestion worker.
//!
//! Re-exports the pieces `main.rs` needs to wire up: the tick engine, the
//! per-store task state machine, and the HTTP control surface.

pub mod control;
pub mod engine;
pub mod store_process;
pub mod tasks;

pub mod prelude {
    pub use crate::control::{build_router, ControlState};
    pub use crate::engine::{WorkerEngine, WorkerStatus};
}

pub use engine::{WorkerEngine, WorkerStatus};
