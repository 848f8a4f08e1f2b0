use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde_json::Value;
use shared::{
    error::ApiError,
    protocol::{GENERATE_REPORT_PATH, JSON_CONTENT_TYPE, VALIDATE_PATH},
};
use tracing::{debug, warn};

pub mod controller;
pub mod download;
pub mod error;
pub mod report;

pub use controller::{FetchOutcome, FetchSnapshot, FetchState, ReportFetchController};
pub use error::ClientError;
pub use report::{Report, TractionChart};
pub use shared::protocol::ValidateRequest;

/// Binary report document returned by `/generate_report`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ValidationApi: Send + Sync {
    async fn validate(&self, request: &ValidateRequest) -> Result<Report, ClientError>;
    async fn generate_report(&self) -> Result<ReportDocument, ClientError>;
}

pub struct HttpValidationApi {
    http: Client,
    api_base: String,
}

impl HttpValidationApi {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_base)
    }

    pub fn with_client(http: Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self { http, api_base }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[async_trait]
impl ValidationApi for HttpValidationApi {
    async fn validate(&self, request: &ValidateRequest) -> Result<Report, ClientError> {
        let response = self
            .http
            .post(format!("{}{VALIDATE_PATH}", self.api_base))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        let payload: Value = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => return Err(ClientError::Status { status }),
            Err(source) => return Err(ClientError::Decode { status, source }),
        };

        if let Some(error) = ApiError::from_payload(&payload) {
            return Err(ClientError::Api { status, error });
        }
        if !status.is_success() {
            return Err(ClientError::Status { status });
        }

        debug!(%status, "validate response accepted");
        Ok(Report::from_validate_payload(payload))
    }

    async fn generate_report(&self) -> Result<ReportDocument, ClientError> {
        let response = self
            .http
            .get(format!("{}{GENERATE_REPORT_PATH}", self.api_base))
            .send()
            .await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        if content_type
            .as_deref()
            .is_some_and(|ct| ct.contains(JSON_CONTENT_TYPE))
        {
            let error = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|payload| ApiError::from_payload(&payload))
                .unwrap_or(ApiError { message: None });
            warn!(error = %error, "report generation returned an error payload");
            return Err(ClientError::ReportGeneration(error));
        }

        Ok(ReportDocument {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
