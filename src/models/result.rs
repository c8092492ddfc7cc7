//! Classified result variants for final agent responses.
//!
//! Every final payload maps to exactly one of these variants; the decision
//! procedure lives in [`crate::classify`].

use serde::{Deserialize, Serialize};
use sqlformat::{FormatOptions, QueryParams};

/// The typed outcome of classifying a final agent payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifiedResult {
    /// Plain prose, or the stringified fallback for unrecognized shapes.
    Text { text: String },
    /// Tabular query output.
    Table(TableResult),
    /// Chart-ready series or breakdown data.
    Chart(ChartResult),
    /// Pointer to an externally-hosted dashboard embed.
    Embed(EmbedPointer),
    /// Composite agent result: query narrative and/or visualization parts.
    Analysis(AnalysisResult),
    /// Explicit error payload.
    Error { message: String },
}

impl ClassifiedResult {
    /// Returns the variant tag as a string, for logging and display.
    pub fn tag(&self) -> &'static str {
        match self {
            ClassifiedResult::Text { .. } => "text",
            ClassifiedResult::Table(_) => "table",
            ClassifiedResult::Chart(_) => "chart",
            ClassifiedResult::Embed(_) => "embed",
            ClassifiedResult::Analysis(_) => "analysis",
            ClassifiedResult::Error { .. } => "error",
        }
    }
}

/// A column descriptor for tabular results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableColumn {
    pub key: String,
    pub label: String,
}

/// Tabular query output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub columns: Vec<TableColumn>,
    /// Row values, kept structurally opaque; rendering decides layout.
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_count: usize,
    /// Reporting period the table covers, when the backend names one.
    #[serde(default)]
    pub period_label: Option<String>,
    #[serde(default)]
    pub summary: String,
}

/// One named series of a multi-series chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<f64>,
}

/// The data shape of a chart result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    /// Category/percentage breakdown (pie-style).
    Breakdown {
        categories: Vec<String>,
        percentages: Vec<f64>,
    },
    /// Multi-series values over ordered labels (line/bar-style).
    Series {
        labels: Vec<String>,
        datasets: Vec<ChartSeries>,
    },
}

/// Chart-ready output plus derived insights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartResult {
    #[serde(default)]
    pub title: String,
    pub data: ChartData,
    /// Narrative insight derived from the chart data.
    #[serde(default)]
    pub insights: Option<String>,
}

/// A URL plus title referencing an externally-hosted dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbedPointer {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Composite agent result.
///
/// Carries a data-narrative part (query, explanation, sample analysis, CSV
/// export) and a visualization part (chart URL, visualization analysis) in
/// one value; both are optional and rendering composes whatever is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    #[serde(default)]
    pub query_id: Option<String>,
    /// Raw generated query text. Render through [`Self::formatted_query`].
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub sample_analysis: Option<String>,
    #[serde(default)]
    pub csv_url: Option<String>,
    #[serde(default)]
    pub chart_url: Option<String>,
    #[serde(default, alias = "visualization_analysis_result")]
    pub visualization_analysis: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl AnalysisResult {
    /// Render the generated query through a SQL-aware formatter.
    ///
    /// Formatting never blocks display: an empty formatter result falls back
    /// to the raw query text.
    pub fn formatted_query(&self) -> Option<String> {
        let raw = self.query.as_deref()?;
        let formatted = sqlformat::format(raw, &QueryParams::None, FormatOptions::default());
        if formatted.trim().is_empty() {
            Some(raw.to_string())
        } else {
            Some(formatted)
        }
    }

    /// Whether the data-narrative sub-part has anything to show.
    pub fn has_narrative(&self) -> bool {
        self.query.is_some()
            || self.explanation.is_some()
            || self.sample_analysis.is_some()
            || self.csv_url.is_some()
    }

    /// Whether the visualization sub-part has anything to show.
    pub fn has_visualization(&self) -> bool {
        self.chart_url.is_some() || self.visualization_analysis.is_some()
    }
}
