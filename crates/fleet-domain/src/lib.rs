pub mod dimensional;
pub mod lease;
pub mod log_record;
pub mod store;
pub mod task;

pub use dimensional::DimensionalRow;
pub use lease::{ServiceHealth, Stage, StoreProcess};
pub use log_record::{LogLevel, LogRecord};
pub use store::Store;
pub use task::{TaskError, TaskErrorKind, TaskStatus};
