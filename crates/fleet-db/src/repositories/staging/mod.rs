pub mod advert_info;
pub mod advert_stats;
pub mod cards_list;
pub mod fact_sales;
pub mod fact_stock;
pub mod nm_report_detail;

pub use advert_info::AdvertInfoRepository;
pub use advert_stats::AdvertStatsRepository;
pub use cards_list::CardsListRepository;
pub use fact_sales::FactSalesRepository;
pub use fact_stock::FactStockRepository;
pub use nm_report_detail::NmReportDetailRepository;
