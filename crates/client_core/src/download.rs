//! One-shot report download. Independent of the fetch controller: no shared
//! state and no cancellation.

use std::path::{Path, PathBuf};

use shared::protocol::REPORT_FILE_NAME;
use tracing::{info, warn};

use crate::{error::ClientError, ValidationApi};

/// Fetches the generated report and saves it as
/// [`REPORT_FILE_NAME`] inside `target_dir`.
pub async fn download_report(
    api: &dyn ValidationApi,
    target_dir: &Path,
) -> Result<PathBuf, ClientError> {
    let document = api.generate_report().await.inspect_err(|err| {
        warn!(error = %err, "report download failed");
    })?;

    let path = target_dir.join(REPORT_FILE_NAME);
    tokio::fs::write(&path, &document.bytes)
        .await
        .map_err(|source| ClientError::Save {
            path: path.clone(),
            source,
        })?;

    info!(
        path = %path.display(),
        bytes = document.bytes.len(),
        content_type = document.content_type.as_deref().unwrap_or("unknown"),
        "saved generated report"
    );
    Ok(path)
}
