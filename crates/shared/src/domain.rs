use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Path of the results page inside the frontend.
pub const RESULT_PATH: &str = "/result";

// Addresses are usually relative (`/result?idea=...`); they are resolved
// against this placeholder origin and the origin is dropped again on output.
const PLACEHOLDER_ORIGIN: &str = "http://localhost";

/// Analysis depth selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Fast,
    Deep,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Fast => "fast",
            Mode::Deep => "deep",
        }
    }

    /// Anything other than `deep` (case-insensitive, surrounding whitespace
    /// ignored) is `fast`.
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("deep") {
            Mode::Deep
        } else {
            Mode::Fast
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("invalid page address '{address}': {source}")]
pub struct AddressError {
    pub address: String,
    #[source]
    pub source: url::ParseError,
}

/// The `idea` and `mode` parameters of a results page address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    pub idea: String,
    pub mode: Mode,
}

impl QueryParams {
    pub fn new(idea: impl Into<String>, mode: Mode) -> Self {
        Self {
            idea: idea.into(),
            mode,
        }
    }

    pub fn from_address(address: &str) -> Result<Self, AddressError> {
        let url = parse_address(address)?;
        let mut idea = String::new();
        let mut mode = Mode::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "idea" => idea = value.into_owned(),
                "mode" => mode = Mode::parse_lenient(&value),
                _ => {}
            }
        }
        Ok(Self { idea, mode })
    }

    /// The idea with surrounding whitespace removed; empty means "no idea".
    pub fn trimmed_idea(&self) -> &str {
        self.idea.trim()
    }

    pub fn has_idea(&self) -> bool {
        !self.trimmed_idea().is_empty()
    }

    /// Address the landing form navigates to after submitting an idea.
    pub fn to_address(&self) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("idea", &self.idea)
            .append_pair("mode", self.mode.as_str())
            .finish();
        format!("{RESULT_PATH}?{query}")
    }
}

/// Rewrites the `mode` parameter of `address`, keeping path and every other
/// parameter in their original order.
pub fn replace_mode(address: &str, mode: Mode) -> Result<String, AddressError> {
    let mut url = parse_address(address)?;
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "mode")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    pairs.push(("mode".to_string(), mode.as_str().to_string()));

    url.query_pairs_mut().clear().extend_pairs(pairs);

    if address.contains("://") {
        Ok(url.to_string())
    } else {
        Ok(strip_placeholder_origin(&url))
    }
}

fn parse_address(address: &str) -> Result<Url, AddressError> {
    let parsed = if address.contains("://") {
        Url::parse(address)
    } else {
        Url::parse(PLACEHOLDER_ORIGIN).and_then(|base| base.join(address))
    };
    parsed.map_err(|source| AddressError {
        address: address.to_string(),
        source,
    })
}

fn strip_placeholder_origin(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}
