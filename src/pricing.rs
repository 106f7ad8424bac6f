//! Cost calculation from token usage and model pricing.
//!
//! Single source of truth for converting reported token usage into cents,
//! used by every reasoning call so that per-agent ledgers and the run total
//! agree by construction.

/// Model pricing in nanodollars per token (1 USD = 1_000_000_000 nanodollars).
/// Integer nanodollars avoid floating-point drift when costs are summed
/// across dozens of agents.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    /// Cost per input token in nanodollars
    pub input_nano_per_token: u64,
    /// Cost per output token in nanodollars
    pub output_nano_per_token: u64,
}

/// Token usage reported by the reasoning service for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenCounts {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Check if there is any usage to compute cost from.
    pub fn has_usage(&self) -> bool {
        self.input_tokens > 0 || self.output_tokens > 0
    }
}

/// Normalize model names to canonical form for pricing lookup.
fn normalize_model(model: &str) -> &str {
    let trimmed = model.trim();
    // Provider-prefixed and versioned ids map to base names
    match trimmed {
        s if s.contains("claude-sonnet-4") || s.contains("claude-4-sonnet") => "claude-sonnet-4",
        s if s.contains("claude-opus-4") || s.contains("claude-4-opus") => "claude-opus-4",
        s if s.contains("claude-3-5-haiku") || s.contains("claude-3.5-haiku") => "claude-3-5-haiku",
        s if s.contains("gpt-5-mini") => "gpt-5-mini",
        s if s.contains("gpt-5") => "gpt-5",
        s if s.contains("gpt-4o-mini") => "gpt-4o-mini",
        s if s.contains("gpt-4o") => "gpt-4o",
        s if s.contains("gemini-2.5-pro") || s.contains("gemini-2-5-pro") => "gemini-2.5-pro",
        s if s.contains("gemini-2.5-flash") || s.contains("gemini-2-5-flash") => "gemini-2.5-flash",
        _ => trimmed,
    }
}

/// Get pricing for a model. Returns None if the model is unknown.
///
/// Prices are per 1M tokens converted to nanodollars per token:
/// $3/1M input = 3_000 nanodollars per token.
pub fn pricing_for_model(model: &str) -> Option<ModelPricing> {
    match normalize_model(model) {
        // Claude Sonnet 4: $3/1M input, $15/1M output
        "claude-sonnet-4" => Some(ModelPricing {
            input_nano_per_token: 3_000,
            output_nano_per_token: 15_000,
        }),
        // Claude Opus 4: $15/1M input, $75/1M output
        "claude-opus-4" => Some(ModelPricing {
            input_nano_per_token: 15_000,
            output_nano_per_token: 75_000,
        }),
        // Claude 3.5 Haiku: $0.80/1M input, $4/1M output
        "claude-3-5-haiku" => Some(ModelPricing {
            input_nano_per_token: 800,
            output_nano_per_token: 4_000,
        }),
        // GPT-5: $5/1M input, $15/1M output
        "gpt-5" => Some(ModelPricing {
            input_nano_per_token: 5_000,
            output_nano_per_token: 15_000,
        }),
        // GPT-5-mini: $0.25/1M input, $2/1M output
        "gpt-5-mini" => Some(ModelPricing {
            input_nano_per_token: 250,
            output_nano_per_token: 2_000,
        }),
        // GPT-4o: $2.50/1M input, $10/1M output
        "gpt-4o" => Some(ModelPricing {
            input_nano_per_token: 2_500,
            output_nano_per_token: 10_000,
        }),
        // GPT-4o-mini: $0.15/1M input, $0.60/1M output
        "gpt-4o-mini" => Some(ModelPricing {
            input_nano_per_token: 150,
            output_nano_per_token: 600,
        }),
        // Gemini 2.5 Pro: $1.25/1M input, $10/1M output
        "gemini-2.5-pro" => Some(ModelPricing {
            input_nano_per_token: 1_250,
            output_nano_per_token: 10_000,
        }),
        // Gemini 2.5 Flash: $0.15/1M input, $0.60/1M output
        "gemini-2.5-flash" => Some(ModelPricing {
            input_nano_per_token: 150,
            output_nano_per_token: 600,
        }),
        _ => None,
    }
}

/// Calculate cost in cents from token usage and model.
///
/// Returns 0 if the model is unknown (logged as a warning) or no usage was
/// reported.
pub fn cost_cents_from_usage(model: &str, usage: &TokenCounts) -> u64 {
    if !usage.has_usage() {
        return 0;
    }

    let Some(pricing) = pricing_for_model(model) else {
        tracing::warn!(model = %model, "Unknown model for cost calculation, using 0 cost");
        return 0;
    };

    let cost_nano = usage
        .input_tokens
        .saturating_mul(pricing.input_nano_per_token)
        .saturating_add(
            usage
                .output_tokens
                .saturating_mul(pricing.output_nano_per_token),
        );

    // 1 cent = 10_000_000 nanodollars; round to nearest cent
    (cost_nano + 5_000_000) / 10_000_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_model() {
        assert_eq!(
            normalize_model("anthropic/claude-sonnet-4.5"),
            "claude-sonnet-4"
        );
        assert_eq!(normalize_model("openai/gpt-5-mini"), "gpt-5-mini");
        assert_eq!(normalize_model("gpt-4o-2024-08-06"), "gpt-4o");
        assert_eq!(normalize_model("google/gemini-2.5-pro"), "gemini-2.5-pro");
    }

    #[test]
    fn test_pricing_for_known_models() {
        assert!(pricing_for_model("claude-sonnet-4").is_some());
        assert!(pricing_for_model("openai/gpt-5-mini").is_some());
        assert!(pricing_for_model("gemini-2.5-flash").is_some());
    }

    #[test]
    fn test_pricing_for_unknown_model() {
        assert!(pricing_for_model("unknown-model-xyz").is_none());
    }

    #[test]
    fn test_cost_calculation_basic() {
        // Claude Sonnet 4: (1000 * 3000 + 500 * 15000) nano = 1.05 cents
        let usage = TokenCounts::new(1000, 500);
        assert_eq!(cost_cents_from_usage("claude-sonnet-4", &usage), 1);
    }

    #[test]
    fn test_cost_calculation_large_usage() {
        // (100_000 * 3000 + 10_000 * 15000) nano = 45 cents
        let usage = TokenCounts::new(100_000, 10_000);
        assert_eq!(cost_cents_from_usage("claude-sonnet-4", &usage), 45);
    }

    #[test]
    fn test_cost_zero_for_no_usage() {
        assert_eq!(
            cost_cents_from_usage("claude-sonnet-4", &TokenCounts::default()),
            0
        );
    }

    #[test]
    fn test_cost_zero_for_unknown_model() {
        let usage = TokenCounts::new(1000, 500);
        assert_eq!(cost_cents_from_usage("no-such-model", &usage), 0);
    }
}
