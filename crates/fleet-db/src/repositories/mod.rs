pub mod dimensional;
pub mod lease;
pub mod staging;
pub mod store;

pub use dimensional::{DimensionalRepository, ExportTable};
pub use lease::LeaseRepository;
pub use store::StoreRepository;
