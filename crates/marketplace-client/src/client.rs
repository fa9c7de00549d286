use crate::dto::*;
use crate::errors::ClientError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

/// Base URLs for the marketplace's API families — these differ per family
/// in the original integration, so they are configuration rather than
/// hard-coded per task.
#[derive(Clone)]
pub struct MarketplaceEndpoints {
    pub content_api: String,
    pub seller_analytics_api: String,
    pub statistics_api: String,
    pub advert_api: String,
}

impl Default for MarketplaceEndpoints {
    fn default() -> Self {
        Self {
            content_api: "https://content-api.wildberries.ru".to_string(),
            seller_analytics_api: "https://seller-analytics-api.wildberries.ru".to_string(),
            statistics_api: "https://statistics-api.wildberries.ru".to_string(),
            advert_api: "https://advert-api.wildberries.ru".to_string(),
        }
    }
}

/// Outcome of a single marketplace call per spec.md §6's status semantics:
/// 200 carries data, 400 means "no data" (not an error), 429 means the task
/// should self rate-limit.
pub enum MarketplaceResponse<T> {
    Data(T),
    Empty,
    RateLimited,
}

#[derive(Clone)]
pub struct MarketplaceClient {
    http: Client,
    endpoints: MarketplaceEndpoints,
}

impl MarketplaceClient {
    pub fn new(api_token: &str, endpoints: MarketplaceEndpoints) -> Result<Self, ClientError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_token}"))
            .map_err(|_| ClientError::ServerRejection("invalid api token".into()))?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self { http, endpoints })
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<MarketplaceResponse<T>, ClientError> {
        let response = self.http.post(url).json(body).send().await?;
        Self::interpret(response).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<MarketplaceResponse<T>, ClientError> {
        let response = self.http.get(url).send().await?;
        Self::interpret(response).await
    }

    async fn interpret<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<MarketplaceResponse<T>, ClientError> {
        match response.status() {
            StatusCode::OK => {
                let body = response.json::<T>().await?;
                Ok(MarketplaceResponse::Data(body))
            }
            StatusCode::BAD_REQUEST => Ok(MarketplaceResponse::Empty),
            StatusCode::TOO_MANY_REQUESTS => Ok(MarketplaceResponse::RateLimited),
            other => Err(ClientError::ServerRejection(format!("HTTP {other}"))),
        }
    }

    #[instrument(skip(self, cursor))]
    pub async fn cards_list(
        &self,
        cursor: CardsListCursor,
    ) -> Result<MarketplaceResponse<CardsListResponse>, ClientError> {
        let url = format!("{}/content/v2/get/cards/list", self.endpoints.content_api);
        let request = CardsListRequest {
            settings: CardsListSettings {
                cursor,
                filter: CardsListFilter { with_photo: -1 },
            },
        };
        self.post_json(&url, &request).await
    }

    #[instrument(skip(self))]
    pub async fn nm_report_detail(
        &self,
        period: ReportPeriod,
        page: i32,
    ) -> Result<MarketplaceResponse<NmReportDetailResponse>, ClientError> {
        let url = format!("{}/seller-analytics/v2/nm-report/detail", self.endpoints.seller_analytics_api);
        let request = NmReportDetailRequest {
            period,
            order_by: ReportOrderBy { field: "openCard".to_string(), mode: "asc".to_string() },
            page,
        };
        self.post_json(&url, &request).await
    }

    #[instrument(skip(self))]
    pub async fn stocks_report(
        &self,
        current_period: ReportPeriod,
    ) -> Result<MarketplaceResponse<StocksReportResponse>, ClientError> {
        let url = format!(
            "{}/seller-analytics/v2/stocks-report/products/products",
            self.endpoints.seller_analytics_api
        );
        let request = StocksReportRequest {
            current_period,
            limit: 1000,
            offset: 0,
            availability_filters: vec!["actual".to_string()],
            order_by: ReportOrderBy { field: "stockCount".to_string(), mode: "desc".to_string() },
        };
        self.post_json(&url, &request).await
    }

    #[instrument(skip(self))]
    pub async fn supplier_sales(
        &self,
        date_from: &str,
    ) -> Result<MarketplaceResponse<Vec<SaleRecord>>, ClientError> {
        let url = format!(
            "{}/statistics/v1/supplier/sales?dateFrom={date_from}&flag=0",
            self.endpoints.statistics_api
        );
        self.get(&url).await
    }

    #[instrument(skip(self))]
    pub async fn advert_count(&self) -> Result<MarketplaceResponse<AdvertCountResponse>, ClientError> {
        let url = format!("{}/advert/v1/promotion/count", self.endpoints.advert_api);
        self.get(&url).await
    }

    #[instrument(skip(self, advert_ids))]
    pub async fn advert_info(
        &self,
        advert_ids: &[i64],
    ) -> Result<MarketplaceResponse<Vec<AdvertDetail>>, ClientError> {
        let url = format!("{}/advert/v1/promotion/adverts", self.endpoints.advert_api);
        self.post_json(&url, &advert_ids).await
    }

    #[instrument(skip(self, items))]
    pub async fn advert_fullstats(
        &self,
        items: &[FullstatsRequestItem],
    ) -> Result<MarketplaceResponse<Vec<FullstatsEntry>>, ClientError> {
        let url = format!("{}/advert/v2/fullstats", self.endpoints.advert_api);
        self.post_json(&url, &items).await
    }
}
