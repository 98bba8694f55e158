use crate::cache::QueryCache;
use crate::config::SPEED_TEST_TREND_KEY;
use crate::error::ServiceError;
use crate::models::{OptimizationRecommendation, SpeedTestResult, WifiConfig};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// The remote analysis service.
pub trait WifiService: Send + Sync + 'static {
    fn analyze_wifi(
        &self,
        config: &WifiConfig,
    ) -> impl Future<Output = Result<OptimizationRecommendation, ServiceError>> + Send;

    fn get_speed_test_trend(
        &self,
    ) -> impl Future<Output = Result<Vec<SpeedTestResult>, ServiceError>> + Send;

    fn record_speed_test(
        &self,
        result: &SpeedTestResult,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

/// JSON-over-HTTP binding of [`WifiService`].
pub struct HttpWifiService {
    http: Client,
    base_url: String,
}

impl HttpWifiService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        Ok(Self::from_reqwest(base_url, Client::builder().build()?))
    }

    pub fn from_reqwest(base_url: &str, http: Client) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation)
    }
}

async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let bytes = check_status(response).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

impl WifiService for HttpWifiService {
    async fn analyze_wifi(
        &self,
        config: &WifiConfig,
    ) -> Result<OptimizationRecommendation, ServiceError> {
        debug!(ssid = %config.ssid, channel = config.channel, "analyzeWiFi");
        let response = self
            .http
            .post(self.url("analyzeWiFi"))
            .json(config)
            .send()
            .await?;
        decode(response).await
    }

    async fn get_speed_test_trend(&self) -> Result<Vec<SpeedTestResult>, ServiceError> {
        debug!("getSpeedTestTrend");
        let response = self.http.get(self.url("getSpeedTestTrend")).send().await?;
        decode(response).await
    }

    async fn record_speed_test(&self, result: &SpeedTestResult) -> Result<(), ServiceError> {
        debug!(
            timestamp = result.timestamp,
            download_speed = result.download_speed,
            "recordSpeedTest"
        );
        let response = self
            .http
            .post(self.url("recordSpeedTest"))
            .json(result)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Service handle shared by the dashboard and the speed-test runner.
///
/// Trend reads go through the query cache; recording a sample drops the cached
/// trend so the next read goes back to the service.
pub struct ServiceClient<S> {
    service: S,
    trend_cache: QueryCache<Vec<SpeedTestResult>>,
}

impl<S: WifiService> ServiceClient<S> {
    pub fn new(service: S) -> Arc<Self> {
        Arc::new(Self {
            service,
            trend_cache: QueryCache::new(),
        })
    }

    pub async fn analyze(
        &self,
        config: &WifiConfig,
    ) -> Result<OptimizationRecommendation, ServiceError> {
        let recommendation = self.service.analyze_wifi(config).await?;
        info!(
            ssid = %config.ssid,
            optimal = recommendation.is_optimal(),
            "Analysis complete"
        );
        Ok(recommendation)
    }

    pub async fn speed_test_trend(&self) -> Result<Vec<SpeedTestResult>, ServiceError> {
        self.trend_cache
            .get_or_fetch(SPEED_TEST_TREND_KEY, || self.service.get_speed_test_trend())
            .await
    }

    pub async fn record_speed_test(&self, result: &SpeedTestResult) -> Result<(), ServiceError> {
        self.service.record_speed_test(result).await?;
        self.trend_cache.invalidate(SPEED_TEST_TREND_KEY).await;
        Ok(())
    }

    #[cfg(test)]
    pub fn service(&self) -> &S {
        &self.service
    }
}
