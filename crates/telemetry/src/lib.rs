//! Pure span/cost/token extraction from an agent invocation's trace (spec
//! §4.6). The extractor never throws: any shape it doesn't recognize is
//! treated as "no data here", and [`Performance::extraction_error`] records
//! the one case the original flagged explicitly rather than panicking.

pub mod pricing;
pub mod span;

pub use pricing::{NoopPricingTable, PricingTable};
pub use span::Span;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `cost_info` block (spec §3 data model).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostInfo {
    pub total_cost: f64,
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// `performance` block (spec §4.6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub total_duration_ms: f64,
    pub total_cost: f64,
    pub total_tokens: u64,
    pub span_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
}

/// The full extracted trace (spec §3 data model).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub final_output: String,
    pub spans: Vec<Span>,
    pub cost_info: CostInfo,
    pub performance: Performance,
}

/// Extracts [`Trace`] from an agent invocation's raw trace value, a
/// collaborator-supplied `final_output`, and the wall-clock duration of the
/// invocation (used when the trace itself carries no span-derived total).
///
/// Grounded on `_extract_cost_info_from_trace`/`_extract_performance_metrics`/
/// `_extract_spans_from_trace` (`original_source/backend/services/
/// workflow_executor.py`): spans live under a top-level `spans` array;
/// anything else (an opaque value, or a malformed span) is skipped rather
/// than treated as an error.
#[must_use]
pub fn extract(
    raw: &Value,
    final_output: &str,
    fallback_duration: Duration,
    model_id: Option<&str>,
    pricing: &dyn PricingTable,
) -> Trace {
    let spans: Vec<Span> = raw
        .get("spans")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(span::parse_span).collect())
        .unwrap_or_default();

    let mut total_cost = 0.0;
    let mut input_tokens: u64 = 0;
    let mut output_tokens: u64 = 0;

    for span in &spans {
        let (span_input_cost, span_output_cost, span_input_tokens, span_output_tokens) =
            span::extract_cost_and_tokens(&span.attributes);

        let mut span_cost = span_input_cost + span_output_cost;
        let span_tokens = span_input_tokens + span_output_tokens;

        if span_tokens > 0 && span_cost == 0.0 {
            if let Some(model) = model_id {
                if let Some((priced_input, priced_output)) =
                    pricing.price(model, span_input_tokens, span_output_tokens)
                {
                    span_cost = priced_input + priced_output;
                }
            }
        }

        total_cost += span_cost;
        input_tokens += span_input_tokens;
        output_tokens += span_output_tokens;
    }

    let total_tokens = input_tokens + output_tokens;
    let cost_info = CostInfo {
        total_cost,
        total_tokens,
        input_tokens,
        output_tokens,
    };

    let total_duration_ms = if spans.is_empty() {
        fallback_duration.as_secs_f64() * 1000.0
    } else {
        spans
            .iter()
            .filter_map(|s| s.duration_ms)
            .sum::<f64>()
            .max(fallback_duration.as_secs_f64() * 1000.0)
    };

    let performance = Performance {
        total_duration_ms,
        total_cost,
        total_tokens,
        span_count: spans.len(),
        extraction_error: None,
    };

    Trace {
        final_output: final_output.to_string(),
        spans,
        cost_info,
        performance,
    }
}
