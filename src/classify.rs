//! Runtime discrimination of final agent payloads into typed results.
//!
//! Payload shapes overlap structurally, so classification is an ordered list
//! of (predicate, tag) rules evaluated top to bottom - the order is part of
//! the contract, not an accident:
//!
//! | # | predicate                                              | tag      |
//! |---|--------------------------------------------------------|----------|
//! | 1 | non-object primitive                                   | text     |
//! | 2 | `type` is an embed marker and a URL field is present   | embed    |
//! | 3 | single-field object whose only field is `message`      | error    |
//! | 4 | any analysis marker field present                      | analysis |
//! | 5 | tabular marker (`columns`/`rows`/`table_data`)         | table    |
//! | 6 | chart marker (`chart_type`, labels+datasets, ...)      | chart    |
//! | 7 | anything else                                          | text     |
//!
//! Rule 3 must run before rule 4: a bare `{message}` error would otherwise
//! never be reached once broader structural checks match. Classification is
//! total - every input produces exactly one tag, and the same input always
//! produces the same tag.

use serde_json::Value;

use crate::models::{
    AnalysisResult, ChartData, ChartResult, ChartSeries, ClassifiedResult, EmbedPointer,
    TableColumn, TableResult,
};
use crate::salvage;

/// `type` values that mark an embeddable dashboard pointer.
const EMBED_MARKERS: &[&str] = &["embed", "dashboard"];

/// Fields whose presence marks the composite analysis result.
const ANALYSIS_MARKERS: &[&str] = &[
    "query_id",
    "query",
    "explanation",
    "sample_analysis",
    "csv_url",
    "chart_url",
    "visualization_analysis_result",
];

/// URL fields accepted on an embed pointer, in priority order.
const EMBED_URL_FIELDS: &[&str] = &["url", "dashboard_url", "quicksight_url"];

struct Rule {
    tag: &'static str,
    applies: fn(&Value) -> bool,
    build: fn(&Value) -> ClassifiedResult,
}

static RULES: &[Rule] = &[
    Rule {
        tag: "text",
        applies: is_primitive,
        build: build_text,
    },
    Rule {
        tag: "embed",
        applies: is_embed,
        build: build_embed,
    },
    Rule {
        tag: "error",
        applies: is_single_field_error,
        build: build_error,
    },
    Rule {
        tag: "analysis",
        applies: is_analysis,
        build: build_analysis,
    },
    Rule {
        tag: "table",
        applies: is_table,
        build: build_table,
    },
    Rule {
        tag: "chart",
        applies: is_chart,
        build: build_chart,
    },
];

/// Classify a final payload into exactly one result variant.
///
/// The payload is salvaged first (it may be a JSON document serialized into
/// a string) and response-formatter envelopes (`{type, data}`) are unwrapped
/// before the rule table runs.
pub fn classify(value: Value) -> ClassifiedResult {
    let value = salvage::salvage(value);
    match unwrap_envelope(&value) {
        Some(result) => result,
        None => classify_value(&value),
    }
}

/// Run the ordered rule table over an already-unwrapped value.
pub fn classify_value(value: &Value) -> ClassifiedResult {
    for rule in RULES {
        if (rule.applies)(value) {
            let result = (rule.build)(value);
            tracing::debug!(tag = rule.tag, "classified final payload");
            return result;
        }
    }
    tracing::debug!(
        payload = %excerpt(value),
        "no classification rule matched, falling back to text"
    );
    ClassifiedResult::Text {
        text: stringify(value),
    }
}

/// Unwrap a `{type, data}` formatter envelope.
///
/// The envelope's `type` is only a hint: known envelope kinds short-circuit
/// to their builder, everything else re-enters the rule table with the
/// salvaged inner value.
fn unwrap_envelope(value: &Value) -> Option<ClassifiedResult> {
    let obj = value.as_object()?;
    let kind = obj.get("type")?.as_str()?;
    let data = obj.get("data")?;
    let inner = salvage::salvage(data.clone());

    let result = match kind {
        "error" => build_error(&inner),
        "table" => build_table(&inner),
        "dashboard" => build_embed(&inner),
        "analysis" => build_analysis(&inner),
        k if k == "chart" || k.ends_with("_chart") => build_chart_with_kind(&inner, Some(k)),
        // "text" and unknown envelope kinds: the inner value decides.
        _ => classify_value(&inner),
    };
    Some(result)
}

// ---- predicates ----

fn is_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

fn is_embed(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    let marker = obj
        .get("type")
        .and_then(Value::as_str)
        .map(|t| EMBED_MARKERS.contains(&t))
        .unwrap_or(false);
    marker && EMBED_URL_FIELDS.iter().any(|f| obj.contains_key(*f))
}

fn is_single_field_error(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.len() == 1 && obj.get("message").map(Value::is_string).unwrap_or(false))
        .unwrap_or(false)
}

fn is_analysis(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| ANALYSIS_MARKERS.iter().any(|f| obj.contains_key(*f)))
        .unwrap_or(false)
}

fn is_table(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| {
            obj.contains_key("columns")
                || obj.contains_key("rows")
                || obj.contains_key("table_data")
        })
        .unwrap_or(false)
}

fn is_chart(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    obj.contains_key("chart_type")
        || (obj.contains_key("labels") && obj.contains_key("datasets"))
        || (obj.contains_key("categories")
            && (obj.contains_key("percentages") || obj.contains_key("values")))
}

// ---- builders ----

fn build_text(value: &Value) -> ClassifiedResult {
    ClassifiedResult::Text {
        text: stringify(value),
    }
}

fn build_embed(value: &Value) -> ClassifiedResult {
    let url = string_field(value, EMBED_URL_FIELDS).unwrap_or_default();
    ClassifiedResult::Embed(EmbedPointer {
        url,
        title: string_field(value, &["title"]),
    })
}

fn build_error(value: &Value) -> ClassifiedResult {
    let message = string_field(value, &["message", "error"])
        .unwrap_or_else(|| "An unknown error occurred.".to_string());
    ClassifiedResult::Error { message }
}

fn build_analysis(value: &Value) -> ClassifiedResult {
    ClassifiedResult::Analysis(AnalysisResult {
        query_id: string_field(value, &["query_id"]),
        query: string_field(value, &["query"]),
        explanation: string_field(value, &["explanation", "analysis"]),
        sample_analysis: string_field(value, &["sample_analysis", "result"]),
        csv_url: string_field(value, &["csv_url"]),
        chart_url: string_field(value, &["chart_url", "quicksight_url"]),
        visualization_analysis: string_field(value, &["visualization_analysis_result"]),
        recommendations: string_list(value, "recommendations"),
    })
}

fn build_table(value: &Value) -> ClassifiedResult {
    let columns = value
        .get("columns")
        .and_then(Value::as_array)
        .map(|cols| cols.iter().map(table_column).collect())
        .unwrap_or_default();
    let rows: Vec<Value> = value
        .get("rows")
        .or_else(|| value.get("table_data"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let total_count = value
        .get("total_count")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(rows.len());

    ClassifiedResult::Table(TableResult {
        title: string_field(value, &["title"]).unwrap_or_default(),
        columns,
        total_count,
        period_label: string_field(value, &["period", "period_label"]),
        summary: string_field(value, &["summary"]).unwrap_or_default(),
        rows,
    })
}

fn build_chart(value: &Value) -> ClassifiedResult {
    build_chart_with_kind(value, None)
}

fn build_chart_with_kind(value: &Value, envelope_kind: Option<&str>) -> ClassifiedResult {
    let chart_type = string_field(value, &["chart_type"])
        .or_else(|| envelope_kind.map(|k| k.trim_end_matches("_chart").to_string()))
        .unwrap_or_default();
    let labels = label_list(value, &["labels", "categories"]);

    let is_breakdown = matches!(chart_type.as_str(), "pie" | "doughnut");
    let percentages = value
        .get("percentages")
        .or_else(|| value.get("values"))
        .and_then(Value::as_array)
        .map(|v| v.iter().filter_map(Value::as_f64).collect::<Vec<_>>());

    let data = match percentages {
        Some(values) if is_breakdown || !value.get("datasets").map_or(false, Value::is_array) => {
            ChartData::Breakdown {
                categories: labels,
                percentages: values,
            }
        }
        _ => ChartData::Series {
            labels,
            datasets: dataset_list(value),
        },
    };

    ClassifiedResult::Chart(ChartResult {
        title: string_field(value, &["title"]).unwrap_or_default(),
        data,
        insights: string_field(value, &["description", "insights"]),
    })
}

// ---- field helpers ----

/// First present field among `keys`, coerced to a string.
///
/// Numbers coerce via their display form; other shapes are treated as absent.
fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    let obj = value.as_object()?;
    for key in keys {
        match obj.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn label_list(value: &Value, keys: &[&str]) -> Vec<String> {
    for key in keys {
        if let Some(items) = value.get(*key).and_then(Value::as_array) {
            return items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
        }
    }
    Vec::new()
}

fn dataset_list(value: &Value) -> Vec<ChartSeries> {
    let Some(datasets) = value.get("datasets").and_then(Value::as_array) else {
        return Vec::new();
    };
    datasets
        .iter()
        .enumerate()
        .map(|(idx, ds)| match ds {
            Value::Array(values) => ChartSeries {
                label: format!("Dataset {}", idx + 1),
                values: values.iter().filter_map(Value::as_f64).collect(),
            },
            other => ChartSeries {
                label: string_field(other, &["label"])
                    .unwrap_or_else(|| format!("Dataset {}", idx + 1)),
                values: other
                    .get("data")
                    .or_else(|| other.get("values"))
                    .and_then(Value::as_array)
                    .map(|v| v.iter().filter_map(Value::as_f64).collect())
                    .unwrap_or_default(),
            },
        })
        .collect()
}

fn table_column(value: &Value) -> TableColumn {
    match value {
        Value::String(s) => TableColumn {
            key: s.to_lowercase().replace(' ', "_"),
            label: s.clone(),
        },
        other => TableColumn {
            key: string_field(other, &["key"]).unwrap_or_default(),
            label: string_field(other, &["label"]).unwrap_or_default(),
        },
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn excerpt(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 200 {
        let head: String = text.chars().take(200).collect();
        format!("{}...", head)
    } else {
        text
    }
}
