use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// --- content/v2/get/cards/list ---

#[derive(Serialize)]
pub struct CardsListCursor {
    pub limit: i64,
    #[serde(rename = "nmID", skip_serializing_if = "Option::is_none")]
    pub nm_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Serialize)]
pub struct CardsListFilter {
    #[serde(rename = "withPhoto")]
    pub with_photo: i32,
}

#[derive(Serialize)]
pub struct CardsListSettings {
    pub cursor: CardsListCursor,
    pub filter: CardsListFilter,
}

#[derive(Serialize)]
pub struct CardsListRequest {
    pub settings: CardsListSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Card {
    #[serde(rename = "nmID")]
    pub nm_id: i64,
    #[serde(default, rename = "vendorCode")]
    pub vendor_code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
pub struct CardsListResponseCursor {
    #[serde(default, rename = "nmID")]
    pub nm_id: Option<i64>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub total: i64,
}

#[derive(Deserialize, Default, Debug)]
pub struct CardsListResponse {
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub cursor: CardsListResponseCursor,
}

// --- seller-analytics/v2/nm-report/detail ---

#[derive(Debug, Serialize)]
pub struct ReportPeriod {
    pub begin: String,
    pub end: String,
}

#[derive(Serialize)]
pub struct ReportOrderBy {
    pub field: String,
    pub mode: String,
}

#[derive(Serialize)]
pub struct NmReportDetailRequest {
    pub period: ReportPeriod,
    #[serde(rename = "orderBy")]
    pub order_by: ReportOrderBy,
    pub page: i32,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct NmReportDetailStats {
    #[serde(default, rename = "openCardCount")]
    pub open_card_count: i64,
    #[serde(default, rename = "addToCartCount")]
    pub add_to_cart_count: i64,
    #[serde(default, rename = "ordersCount")]
    pub orders_count: i64,
    #[serde(default, rename = "ordersSumRub")]
    pub orders_sum_rub: f64,
    #[serde(default, rename = "buyoutsCount")]
    pub buyouts_count: i64,
    #[serde(default, rename = "buyoutsSumRub")]
    pub buyouts_sum_rub: f64,
    #[serde(default, rename = "cancelCount")]
    pub cancel_count: i64,
    #[serde(default, rename = "cancelSumRub")]
    pub cancel_sum_rub: f64,
    #[serde(default, rename = "avgPriceRub")]
    pub avg_price_rub: f64,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct NmReportDetailSelectedPeriod {
    #[serde(default, rename = "selectedPeriod")]
    pub selected_period: NmReportDetailStats,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct NmReportDetailCard {
    #[serde(rename = "nmID")]
    pub nm_id: i64,
    #[serde(default)]
    pub statistics: NmReportDetailSelectedPeriod,
}

#[derive(Deserialize, Default, Debug)]
pub struct NmReportDetailData {
    #[serde(default)]
    pub cards: Vec<NmReportDetailCard>,
    #[serde(default)]
    pub page: i32,
    #[serde(default, rename = "isNextPage")]
    pub is_next_page: bool,
}

#[derive(Deserialize, Default, Debug)]
pub struct NmReportDetailResponse {
    #[serde(default)]
    pub data: NmReportDetailData,
}

// --- seller-analytics/v2/stocks-report/products/products ---

#[derive(Serialize)]
pub struct StocksReportRequest {
    #[serde(rename = "currentPeriod")]
    pub current_period: ReportPeriod,
    pub limit: i64,
    pub offset: i64,
    #[serde(rename = "availabilityFilters")]
    pub availability_filters: Vec<String>,
    #[serde(rename = "orderBy")]
    pub order_by: ReportOrderBy,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct StockMetrics {
    #[serde(default, rename = "stockCount")]
    pub stock_count: i64,
    #[serde(default, rename = "toClientCount")]
    pub to_client_count: i64,
    #[serde(default, rename = "fromClientCount")]
    pub from_client_count: i64,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct StockItem {
    #[serde(rename = "nmID")]
    pub nm_id: i64,
    #[serde(default)]
    pub metrics: StockMetrics,
}

#[derive(Deserialize, Default, Debug)]
pub struct StocksReportData {
    #[serde(default)]
    pub items: Vec<StockItem>,
}

#[derive(Deserialize, Default, Debug)]
pub struct StocksReportResponse {
    #[serde(default)]
    pub data: StocksReportData,
}

// --- statistics/v1/supplier/sales ---

#[derive(Deserialize, Debug, Clone)]
pub struct SaleRecord {
    #[serde(rename = "nmId")]
    pub nm_id: i64,
    #[serde(rename = "lastChangeDate")]
    pub last_change_date: DateTime<Utc>,
    pub date: DateTime<Utc>,
    #[serde(rename = "saleID")]
    pub sale_id: String,
    #[serde(default, rename = "priceWithDisc")]
    pub price_with_disc: Option<f64>,
}

// --- advert/v1/promotion/count ---

#[derive(Deserialize, Debug, Clone)]
pub struct AdvertListEntry {
    #[serde(rename = "advertId")]
    pub advert_id: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AdvertCountGroup {
    #[serde(rename = "type")]
    pub advert_type: i32,
    #[serde(default, rename = "advert_list")]
    pub advert_list: Vec<AdvertListEntry>,
}

#[derive(Deserialize, Default, Debug)]
pub struct AdvertCountResponse {
    #[serde(default)]
    pub adverts: Vec<AdvertCountGroup>,
}

// --- advert/v1/promotion/adverts ---

#[derive(Deserialize, Debug, Clone)]
pub struct AdvertDetail {
    #[serde(rename = "advertId")]
    pub advert_id: i64,
    #[serde(default, rename = "startTime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, rename = "endTime")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, rename = "createTime")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, rename = "changeTime")]
    pub change_time: Option<DateTime<Utc>>,
}

// --- advert/v2/fullstats ---

#[derive(Serialize)]
pub struct FullstatsRequestItem {
    pub id: i64,
    pub dates: Vec<NaiveDate>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FullstatsNm {
    #[serde(rename = "nmId")]
    pub nm_id: i64,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub cpc: f64,
    #[serde(default)]
    pub sum: f64,
    #[serde(default)]
    pub atbs: i64,
    #[serde(default)]
    pub orders: i64,
    #[serde(default)]
    pub shks: i64,
    #[serde(default, rename = "sum_price")]
    pub sum_price: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FullstatsApp {
    #[serde(rename = "appType")]
    pub app_type: i32,
    #[serde(default)]
    pub nm: Vec<FullstatsNm>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FullstatsDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub apps: Vec<FullstatsApp>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FullstatsEntry {
    #[serde(rename = "advertId")]
    pub advert_id: i64,
    #[serde(default)]
    pub days: Vec<FullstatsDay>,
}
