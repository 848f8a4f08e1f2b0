use std::{fs, path::PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "validator.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    /// Origin of the externally hosted app shown on the embed page.
    pub embed_origin: String,
    pub download_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".into(),
            embed_origin: "http://localhost:3001/".into(),
            download_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    api_base: Option<String>,
    embed_origin: Option<String>,
    download_dir: Option<String>,
}

/// Defaults, then `path` (missing file is fine), then environment.
pub fn load_settings(path: &str) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            apply_file(&mut settings, &raw)
                .with_context(|| format!("failed to parse config file '{path}'"))?;
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config file '{path}'"));
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.api_base = normalize_api_base(&settings.api_base);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_base {
        settings.api_base = v;
    }
    if let Some(v) = file_cfg.embed_origin {
        settings.embed_origin = v;
    }
    if let Some(v) = file_cfg.download_dir {
        settings.download_dir = PathBuf::from(v);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("NEXT_PUBLIC_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = non_empty("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = non_empty("NEXT_PUBLIC_AGENTIX_ORIGIN") {
        settings.embed_origin = v;
    }
    if let Some(v) = non_empty("APP__EMBED_ORIGIN") {
        settings.embed_origin = v;
    }

    if let Some(v) = non_empty("APP__DOWNLOAD_DIR") {
        settings.download_dir = PathBuf::from(v);
    }
}

pub fn normalize_api_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Settings::default().api_base;
    }
    trimmed.to_string()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
