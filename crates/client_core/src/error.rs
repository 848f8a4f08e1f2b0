use std::path::PathBuf;

use reqwest::StatusCode;
use shared::error::ApiError;
use thiserror::Error;

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";
pub const REPORT_GENERATION_FAILED_MESSAGE: &str = "Report generation failed";
pub const DOWNLOAD_FAILED_MESSAGE: &str = "Failed to download report";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request cancelled")]
    Cancelled,
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request failed with status {status}")]
    Status { status: StatusCode },
    #[error("application error (status {status}): {error}")]
    Api { status: StatusCode, error: ApiError },
    #[error("failed to decode response body (status {status}): {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
    #[error("report generation failed: {0}")]
    ReportGeneration(ApiError),
    #[error("failed to save report to {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    /// Message shown inline on the results page when validation fails.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api {
                error:
                    ApiError {
                        message: Some(message),
                    },
                ..
            } => message.clone(),
            ClientError::Api { status, .. } | ClientError::Status { status } => {
                format!("Validate failed: {}", status.as_u16())
            }
            ClientError::ReportGeneration(error) => error
                .message
                .clone()
                .unwrap_or_else(|| REPORT_GENERATION_FAILED_MESSAGE.to_string()),
            ClientError::Cancelled
            | ClientError::Transport(_)
            | ClientError::Decode { .. }
            | ClientError::Save { .. } => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Message for the blocking alert raised when a report download fails.
    pub fn alert_message(&self) -> String {
        match self {
            ClientError::ReportGeneration(_) => self.user_message(),
            _ => DOWNLOAD_FAILED_MESSAGE.to_string(),
        }
    }
}
