use serde::{Deserialize, Serialize};

use crate::domain::Mode;

pub const VALIDATE_PATH: &str = "/validate";
pub const GENERATE_REPORT_PATH: &str = "/generate_report";

/// File name the downloaded report document is saved under.
pub const REPORT_FILE_NAME: &str = "Startup_Validation_Report.docx";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Body of `POST /validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub idea: String,
    pub mode: Mode,
}

impl ValidateRequest {
    pub fn new(idea: impl Into<String>, mode: Mode) -> Self {
        Self {
            idea: idea.into(),
            mode,
        }
    }
}
