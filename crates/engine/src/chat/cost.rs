use std::collections::HashMap;
use std::sync::LazyLock;

use crate::llm::types::TokenUsage;

/// Per-1000-token USD rates for one model.
#[derive(Clone, Copy, Debug)]
pub struct ModelRates {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

/// Process-wide read-only rate table, keyed by provider model identifier.
static MODEL_RATES: LazyLock<HashMap<&'static str, ModelRates>> = LazyLock::new(|| {
    HashMap::from([
        (
            "anthropic.claude-3-sonnet-20240229-v1:0",
            ModelRates {
                input_per_1k: 0.003,
                output_per_1k: 0.015,
            },
        ),
        (
            "claude-3-haiku-20240307",
            ModelRates {
                input_per_1k: 0.00025,
                output_per_1k: 0.00125,
            },
        ),
        (
            "claude-3-opus-20240229",
            ModelRates {
                input_per_1k: 0.015,
                output_per_1k: 0.075,
            },
        ),
        (
            "meta.llama2-70b-chat-v1",
            ModelRates {
                input_per_1k: 0.00195,
                output_per_1k: 0.00256,
            },
        ),
        (
            "ai21.j2-ultra-v1",
            ModelRates {
                input_per_1k: 0.0188,
                output_per_1k: 0.0188,
            },
        ),
    ])
});

/// Errors from cost estimation. Fatal only to the estimate itself — the
/// conversation carries on.
#[derive(Debug, thiserror::Error)]
pub enum CostError {
    #[error("no cost rate entry for model '{0}'")]
    UnknownModel(String),
}

/// Estimated USD cost of one LLM call.
pub fn estimate(model: &str, usage: &TokenUsage) -> Result<f64, CostError> {
    let rates = MODEL_RATES
        .get(model)
        .ok_or_else(|| CostError::UnknownModel(model.to_string()))?;

    Ok(rates.input_per_1k * (usage.input_tokens as f64 / 1000.0)
        + rates.output_per_1k * (usage.output_tokens as f64 / 1000.0))
}

/// Cost of one LLM call within a turn. `cost_usd` is None when the model id
/// had no rate entry.
#[derive(Clone, Debug)]
pub struct CallCost {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: Option<f64>,
}

/// Accumulated cost records for one user turn.
#[derive(Clone, Debug, Default)]
pub struct TurnCost {
    calls: Vec<CallCost>,
}

impl TurnCost {
    /// Record one LLM call. An unknown model id fails only the estimate:
    /// the call is still recorded, with no dollar figure.
    pub fn record(&mut self, model: &str, usage: &TokenUsage) {
        let cost_usd = match estimate(model, usage) {
            Ok(cost) => Some(cost),
            Err(e) => {
                tracing::warn!(model = model, error = %e, "Cost estimate unavailable");
                None
            }
        };

        self.calls.push(CallCost {
            model: model.to_string(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cost_usd,
        });
    }

    pub fn calls(&self) -> &[CallCost] {
        &self.calls
    }

    /// Sum of the estimable calls, in USD.
    pub fn total_usd(&self) -> f64 {
        self.calls.iter().filter_map(|c| c.cost_usd).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_is_linear_in_tokens() {
        let usage = TokenUsage {
            input_tokens: 1000,
            output_tokens: 1000,
        };
        let cost = estimate("claude-3-haiku-20240307", &usage).unwrap();
        assert!((cost - (0.00025 + 0.00125)).abs() < 1e-12);

        let doubled = TokenUsage {
            input_tokens: 2000,
            output_tokens: 2000,
        };
        let cost2 = estimate("claude-3-haiku-20240307", &doubled).unwrap();
        assert!((cost2 - 2.0 * cost).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_unknown_model() {
        let usage = TokenUsage::default();
        let err = estimate("not-a-model", &usage).unwrap_err();
        assert!(matches!(err, CostError::UnknownModel(_)));
    }

    #[test]
    fn test_turn_cost_survives_unknown_model() {
        let mut turn = TurnCost::default();
        turn.record(
            "claude-3-haiku-20240307",
            &TokenUsage {
                input_tokens: 1000,
                output_tokens: 0,
            },
        );
        turn.record(
            "not-a-model",
            &TokenUsage {
                input_tokens: 999_999,
                output_tokens: 999_999,
            },
        );

        assert_eq!(turn.calls().len(), 2);
        assert!(turn.calls()[1].cost_usd.is_none());
        // The unknown call contributes nothing to the running total.
        assert!((turn.total_usd() - 0.00025).abs() < 1e-12);
    }
}
