//! Plain-text rendering of the results page.

use std::fmt::Write as _;

use client_core::{
    report::{ChartData, MarketSize, NO_MRR_PLACEHOLDER},
    FetchSnapshot, FetchState, Report, TractionChart,
};
use shared::domain::{Mode, QueryParams};

const HEADING: &str = "🚀 Validation Report";
const CHART_WIDTH: usize = 40;

pub const NO_IDEA_MESSAGE: &str = "❌ No idea provided.";

pub fn render(snapshot: &FetchSnapshot) -> String {
    match &snapshot.state {
        FetchState::MissingIdea => format!("{NO_IDEA_MESSAGE}\n"),
        FetchState::Loading => format!("⏳ {}\n", loading_message(snapshot.params.mode)),
        FetchState::Error(message) => render_error(&snapshot.params, message),
        FetchState::Success(report) => render_report(&snapshot.params, report),
    }
}

pub fn loading_message(mode: Mode) -> &'static str {
    match mode {
        Mode::Deep => "Running deep research…",
        Mode::Fast => "Analyzing your idea…",
    }
}

fn render_error(params: &QueryParams, message: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{HEADING}");
    let _ = writeln!(out, "Idea: {}", params.idea);
    let _ = writeln!(out);
    let _ = writeln!(out, "! {message}");
    let _ = writeln!(out);
    let _ = writeln!(out, "[r] Retry   [f] Run Fast   [d] Deep Research   [q] Quit");
    out
}

fn render_report(params: &QueryParams, report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{HEADING} [{}]", params.mode.as_str().to_uppercase());
    let _ = writeln!(out, "Idea: {}", params.idea);

    section(&mut out, "Problem");
    let _ = writeln!(out, "{}", report.problem().unwrap_or_default());
    section(&mut out, "Solution");
    let _ = writeln!(out, "{}", report.solution().unwrap_or_default());

    section(&mut out, "Trends");
    bullets(&mut out, &report.trends());
    section(&mut out, "Risks");
    bullets(&mut out, &report.risks());

    if params.mode == Mode::Deep {
        render_deep(&mut out, report);
    }

    section(&mut out, "Traction (MRR Growth)");
    match report.traction_chart() {
        TractionChart::Series(chart) => render_chart(&mut out, &chart),
        TractionChart::NoData => {
            let _ = writeln!(out, "{NO_MRR_PLACEHOLDER}");
        }
    }

    section(&mut out, "Market Size");
    render_market(&mut out, report.market());

    if let Some(text) = report.report_text() {
        section(&mut out, "Narrative");
        let _ = writeln!(out, "{text}");
    }

    let _ = writeln!(out);
    let fast_marker = if params.mode == Mode::Fast { "*" } else { " " };
    let deep_marker = if params.mode == Mode::Deep { "*" } else { " " };
    let _ = writeln!(
        out,
        "[f]{fast_marker}Run Fast   [d]{deep_marker}Deep Research   [s] Download Pitch Deck Report   [r] Retry   [q] Quit"
    );
    out
}

fn render_deep(out: &mut String, report: &Report) {
    let agent_sections = report.agent_sections();
    if !agent_sections.is_empty() {
        section(out, "🔍 Deep Research Details");
        for (agent, text) in agent_sections.labelled() {
            let _ = writeln!(out, "-- {agent} --");
            let _ = writeln!(out, "{text}");
        }
    }

    for details in report.deep_details() {
        section(out, &format!("{} (structured)", details.agent));
        for detail in details.sections {
            let _ = writeln!(out, "{}", detail.title);
            bullets(out, &detail.bullets);
        }
    }
}

fn render_chart(out: &mut String, chart: &ChartData) {
    let _ = writeln!(out, "{} ({})", chart.title, chart.dataset_label);
    let max = chart
        .values
        .iter()
        .copied()
        .fold(0.0_f64, |acc, value| acc.max(value));
    let label_width = chart.labels.iter().map(String::len).max().unwrap_or(0);

    for (label, value) in chart.labels.iter().zip(&chart.values) {
        let bar_len = if max > 0.0 && *value > 0.0 {
            ((value / max) * CHART_WIDTH as f64).round().max(1.0) as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{label:<label_width$} | {} {value}",
            "█".repeat(bar_len)
        );
    }
}

fn render_market(out: &mut String, market: MarketSize) {
    for (label, figure) in [("TAM", market.tam), ("SAM", market.sam), ("SOM", market.som)] {
        match figure {
            Some(value) => {
                let _ = writeln!(out, "  • {label}: ${value}B");
            }
            None => {
                let _ = writeln!(out, "  • {label}: n/a");
            }
        }
    }
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "## {title}");
}

fn bullets(out: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(out, "  • {item}");
    }
}
