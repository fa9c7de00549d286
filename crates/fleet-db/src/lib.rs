pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::FleetDatabase;
pub use errors::DbError;
pub use repositories::staging::{
    AdvertInfoRepository, AdvertStatsRepository, CardsListRepository, FactSalesRepository,
    FactStockRepository, NmReportDetailRepository,
};
pub use repositories::{DimensionalRepository, ExportTable, LeaseRepository, StoreRepository};
