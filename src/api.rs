// Front-desk backend API client
// Wire types for the endpoints the billing dialog talks to, the client trait, and the reqwest implementation.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::money::{Money, Percentage};
use crate::session::SessionHandle;
use crate::stay::StayPeriod;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    Status { status_code: u16, message: String },

    #[error("Session expired or not signed in")]
    Unauthorized,

    #[error("Unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Other error: {0}")]
    Other(String),
}

impl ApiError {
    // Only transport failures and server-side errors are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => true,
            ApiError::Status { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry_config: RetryConfig,
}

// Backoff for idempotent reads; payments are never retried
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 100,
            max_backoff_ms: 5000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

// One ancillary service line on a stay record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCharge {
    pub id: i64,
    pub name: String,
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: i64,
    pub name: String,
    pub percentage: Percentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StayStatus {
    Reserved,
    CheckedIn,
    CheckedOut,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRecord {
    pub id: i64,
    pub room_number: String,
    pub guest_name: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub room_rate: Money,
    pub status: StayStatus,
}

impl StayRecord {
    pub fn period(&self) -> Result<StayPeriod, crate::billing::BillingError> {
        StayPeriod::new(self.check_in_date, self.check_out_date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

// Body of POST /stay_records/:id/payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSubmission {
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub total_service_charges: Money,
    pub discount_percentage: Percentage,
    pub discount_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

// Backend operations the billing dialog depends on
#[async_trait]
pub trait FrontDeskApi: Send + Sync + 'static {
    async fn stay_record(&self, stay_record_id: i64) -> Result<StayRecord, ApiError>;

    async fn stay_services(&self, stay_record_id: i64) -> Result<Vec<ServiceCharge>, ApiError>;

    async fn discounts(&self) -> Result<Vec<Discount>, ApiError>;

    async fn submit_payment(
        &self,
        stay_record_id: i64,
        payment: &PaymentSubmission,
    ) -> Result<PaymentReceipt, ApiError>;
}

pub struct HttpFrontDeskClient {
    http: Client,
    config: ClientConfig,
    session: SessionHandle,
}

impl HttpFrontDeskClient {
    pub fn new(config: ClientConfig, session: SessionHandle) -> Result<Self, ClientError> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::ConfigError("base_url is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            http,
            config,
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, endpoint: &str) -> Result<Bytes, ApiError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("{} returned 401, clearing session token", endpoint);
            self.session.clear_token();
            return Err(ApiError::Unauthorized);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status_code: status.as_u16(),
                message: error_message(&body),
            });
        }

        debug!("{} returned {} ({} bytes)", endpoint, status.as_u16(), body.len());
        Ok(body)
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.config.timeout_ms)
        } else {
            ApiError::Network(e.to_string())
        }
    }

    // GET with backoff between attempts for retryable failures
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let mut attempt = 0;

        loop {
            match self.send(self.http.get(&url), path).await {
                Ok(body) => return decode(path, &body),
                Err(e) if e.is_retryable() && attempt < self.config.retry_config.max_retries => {
                    let backoff = calculate_backoff(attempt, &self.config.retry_config);
                    warn!(
                        "GET {} failed ({}), retrying in {}ms",
                        path,
                        e,
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl FrontDeskApi for HttpFrontDeskClient {
    async fn stay_record(&self, stay_record_id: i64) -> Result<StayRecord, ApiError> {
        self.get_json(&format!("stay_records/{}", stay_record_id))
            .await
    }

    async fn stay_services(&self, stay_record_id: i64) -> Result<Vec<ServiceCharge>, ApiError> {
        self.get_json(&format!("stay_records/{}/services", stay_record_id))
            .await
    }

    async fn discounts(&self) -> Result<Vec<Discount>, ApiError> {
        self.get_json("discounts").await
    }

    async fn submit_payment(
        &self,
        stay_record_id: i64,
        payment: &PaymentSubmission,
    ) -> Result<PaymentReceipt, ApiError> {
        let path = format!("stay_records/{}/payment", stay_record_id);
        info!(
            "Submitting {:?} payment of {} for stay record {}",
            payment.payment_method, payment.amount, stay_record_id
        );

        let body = self
            .send(self.http.post(self.url(&path)).json(payment), &path)
            .await?;

        // Some deployments answer with an empty 201
        if body.is_empty() {
            return Ok(PaymentReceipt {
                id: None,
                message: None,
            });
        }
        decode(&path, &body)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

// Pull a readable message out of an error body; the backend uses {"message": ...} or {"error": ...}
fn error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }

    let text = String::from_utf8_lossy(body);
    if text.len() > 200 {
        let cut = text
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|i| *i <= 200)
            .last()
            .unwrap_or(0);
        format!("{}...", &text[..cut])
    } else {
        text.into_owned()
    }
}

// Exponential backoff with jitter
pub fn calculate_backoff(retry_attempt: u32, config: &RetryConfig) -> Duration {
    let base_backoff_ms = (config.initial_backoff_ms as f64
        * config.backoff_multiplier.powf(retry_attempt as f64))
    .min(config.max_backoff_ms as f64);

    let jitter = rand::random::<f64>() * config.jitter_factor * base_backoff_ms;
    let backoff_ms = base_backoff_ms * (1.0 - config.jitter_factor / 2.0) + jitter;

    Duration::from_millis(backoff_ms as u64)
}
