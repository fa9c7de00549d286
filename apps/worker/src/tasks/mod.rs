pub mod advert_info;
pub mod advert_stats;
pub mod cards_list;
pub mod fact_sales;
pub mod fact_stock;
pub mod nm_report_detail;
