//! Nil-safe view over the report payload returned by `/validate`.
//!
//! The service does not guarantee the payload shape, so every accessor
//! tolerates missing or mistyped fields and falls back to "absent".

use serde_json::Value;

pub const NO_MRR_PLACEHOLDER: &str = "No MRR data returned for this idea.";
pub const MRR_CHART_TITLE: &str = "Monthly Recurring Revenue Growth";
pub const MRR_DATASET_LABEL: &str = "MRR Growth ($k)";

const PREFERRED_MRR_FIELD: &str = "monthly_mrr";
// Older backends emit a mock series under this name.
const LEGACY_MRR_FIELD: &str = "MRR";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report(Value);

impl Report {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Extracts the nested `report` object of a `/validate` response body.
    pub fn from_validate_payload(payload: Value) -> Self {
        match payload {
            Value::Object(mut body) => Self(body.remove("report").unwrap_or(Value::Null)),
            _ => Self(Value::Null),
        }
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn problem(&self) -> Option<&str> {
        non_empty_str(self.0.get("problem"))
    }

    pub fn solution(&self) -> Option<&str> {
        non_empty_str(self.0.get("solution"))
    }

    pub fn trends(&self) -> Vec<String> {
        text_items(self.0.get("trends"))
    }

    pub fn risks(&self) -> Vec<String> {
        text_items(self.0.get("risks"))
    }

    pub fn market(&self) -> MarketSize {
        let market = self.0.get("market");
        let figure = |key: &str| market.and_then(|m| m.get(key)).and_then(as_number);
        MarketSize {
            tam: figure("TAM"),
            sam: figure("SAM"),
            som: figure("SOM"),
        }
    }

    pub fn report_text(&self) -> Option<&str> {
        non_empty_str(self.0.get("report_text"))
    }

    /// Long-form agent output, only populated by deep runs.
    pub fn agent_sections(&self) -> AgentSections<'_> {
        let sections = self.0.get("sections");
        let text = |key: &str| non_empty_str(sections.and_then(|s| s.get(key)));
        AgentSections {
            market: text("market"),
            competitors: text("competitors"),
            financials: text("financials"),
        }
    }

    /// Structured headings and bullets extracted from the agent output.
    pub fn deep_details(&self) -> Vec<AgentDetails> {
        let Some(deep) = self.0.get("deep_json") else {
            return Vec::new();
        };

        AGENTS
            .iter()
            .filter_map(|(key, agent)| {
                let sections: Vec<DetailSection> = deep
                    .get(*key)
                    .and_then(|entry| entry.get("sections"))
                    .and_then(Value::as_array)
                    .map(|items| items.iter().filter_map(DetailSection::from_value).collect())
                    .unwrap_or_default();
                (!sections.is_empty()).then(|| AgentDetails {
                    agent: agent.to_string(),
                    sections,
                })
            })
            .collect()
    }

    /// MRR series for the traction chart.
    ///
    /// Reads `traction.monthly_mrr` when it is a sequence, otherwise
    /// `traction.MRR`, otherwise nothing. Non-numeric entries are skipped.
    pub fn mrr_series(&self) -> Vec<f64> {
        let traction = self.0.get("traction");
        let series = traction
            .and_then(|t| t.get(PREFERRED_MRR_FIELD))
            .and_then(Value::as_array)
            .or_else(|| {
                traction
                    .and_then(|t| t.get(LEGACY_MRR_FIELD))
                    .and_then(Value::as_array)
            });

        series
            .map(|values| values.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default()
    }

    pub fn traction_chart(&self) -> TractionChart {
        TractionChart::from_series(self.mrr_series())
    }
}

const AGENTS: [(&str, &str); 3] = [
    ("market", "Market Researcher"),
    ("competitors", "Competitor Analyst"),
    ("financials", "Financial Modeler"),
];

/// Market size figures in billions of USD.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarketSize {
    pub tam: Option<f64>,
    pub sam: Option<f64>,
    pub som: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgentSections<'a> {
    pub market: Option<&'a str>,
    pub competitors: Option<&'a str>,
    pub financials: Option<&'a str>,
}

impl<'a> AgentSections<'a> {
    pub fn is_empty(&self) -> bool {
        self.market.is_none() && self.competitors.is_none() && self.financials.is_none()
    }

    /// Present sections labelled with the agent that wrote them.
    pub fn labelled(&self) -> Vec<(&'static str, &'a str)> {
        [
            (AGENTS[0].1, self.market),
            (AGENTS[1].1, self.competitors),
            (AGENTS[2].1, self.financials),
        ]
        .into_iter()
        .filter_map(|(label, text)| text.map(|text| (label, text)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDetails {
    pub agent: String,
    pub sections: Vec<DetailSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSection {
    pub title: String,
    pub bullets: Vec<String>,
}

impl DetailSection {
    fn from_value(value: &Value) -> Option<Self> {
        let title = value.get("title").and_then(Value::as_str).unwrap_or_default();
        let bullets = text_items(value.get("bullets"));
        if title.is_empty() && bullets.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            bullets,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TractionChart {
    Series(ChartData),
    /// Nothing to plot; the view shows [`NO_MRR_PLACEHOLDER`].
    NoData,
}

impl TractionChart {
    pub fn from_series(values: Vec<f64>) -> Self {
        if values.is_empty() {
            return TractionChart::NoData;
        }
        let labels = (1..=values.len()).map(|month| format!("Month {month}")).collect();
        TractionChart::Series(ChartData {
            title: MRR_CHART_TITLE.to_string(),
            dataset_label: MRR_DATASET_LABEL.to_string(),
            labels,
            values,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub title: String,
    pub dataset_label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

fn text_items(value: Option<&Value>) -> Vec<String> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        })
        .collect()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
