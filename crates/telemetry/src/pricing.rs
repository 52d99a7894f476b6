//! Fallback cost calculation for spans that report token counts but no
//! cost (spec §4.6: "if tokens present but cost zero and model known,
//! invoke pricing"). Grounded on the litellm-based cost lookup in
//! `_extract_cost_info_from_trace` (`original_source/backend/services/
//! workflow_executor.py`), kept here as a collaborator seam rather than a
//! bundled price table since per-model pricing changes independently of
//! extraction logic.

/// Prices a model's input/output token counts, returning `(input_cost,
/// output_cost)`. Returns `None` when the model is unknown to this table;
/// callers leave cost at zero in that case rather than guessing.
pub trait PricingTable: Send + Sync {
    fn price(&self, model_id: &str, input_tokens: u64, output_tokens: u64) -> Option<(f64, f64)>;
}

/// A pricing table that knows no models. Used when no real price list is
/// wired in, or in tests that don't exercise the pricing fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPricingTable;

impl PricingTable for NoopPricingTable {
    fn price(&self, _model_id: &str, _input_tokens: u64, _output_tokens: u64) -> Option<(f64, f64)> {
        None
    }
}
