//! Built-in pricing table for common LLM models.
//!
//! Prices are in USD per 1 million tokens. Each model has an input and
//! output price. Custom pricing can be added at runtime from TOML config.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Per-million-token pricing for a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Price per 1M input tokens in USD.
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD.
    pub output_per_m: f64,
}

impl ModelPricing {
    /// Create a new pricing entry.
    pub fn new(input_per_m: f64, output_per_m: f64) -> Self {
        Self {
            input_per_m,
            output_per_m,
        }
    }

    /// Cost of the prompt side of a call.
    pub fn prompt_cost(&self, input_tokens: u32) -> f64 {
        input_tokens as f64 * self.input_per_m / 1_000_000.0
    }

    /// Cost of the completion side of a call.
    pub fn completion_cost(&self, output_tokens: u32) -> f64 {
        output_tokens as f64 * self.output_per_m / 1_000_000.0
    }

    /// Split cost for the given token counts.
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> CallCost {
        let prompt = self.prompt_cost(input_tokens);
        let completion = self.completion_cost(output_tokens);
        CallCost {
            prompt,
            completion,
            total: prompt + completion,
        }
    }
}

/// Dollar cost of one call, split by side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CallCost {
    pub prompt: f64,
    pub completion: f64,
    pub total: f64,
}

/// `(model, input $/1M, output $/1M)` for models commonly used to run the
/// agent benchmarks. Keys carry the provider prefix.
const BUILTIN_PRICES: &[(&str, f64, f64)] = &[
    ("openai/gpt-3.5-turbo", 0.5, 1.5),
    ("openai/gpt-3.5-turbo-instruct", 1.5, 2.0),
    ("openai/gpt-4", 30.0, 60.0),
    ("openai/gpt-4-turbo", 10.0, 30.0),
    ("openai/gpt-4o", 2.5, 10.0),
    ("openai/gpt-4o-mini", 0.15, 0.6),
    ("openai/o3-mini", 1.1, 4.4),
    ("anthropic/claude-3-haiku", 0.25, 1.25),
    ("anthropic/claude-3.5-haiku", 0.8, 4.0),
    ("anthropic/claude-sonnet-4", 3.0, 15.0),
    ("google/gemini-1.5-flash", 0.075, 0.3),
    ("google/gemini-2.0-flash", 0.1, 0.4),
    ("meta-llama/llama-3.1-8b", 0.055, 0.055),
    ("meta-llama/llama-3.1-70b", 0.52, 0.75),
    ("mistral/mistral-small", 0.2, 0.6),
    ("deepseek/deepseek-v3", 0.27, 1.1),
];

/// Thread-safe pricing table with built-in defaults and custom overrides.
pub struct PricingTable {
    prices: RwLock<HashMap<String, ModelPricing>>,
}

impl PricingTable {
    /// Create a pricing table with the built-in model prices.
    pub fn with_defaults() -> Self {
        let prices = BUILTIN_PRICES
            .iter()
            .map(|&(model, input, output)| (model.to_string(), ModelPricing::new(input, output)))
            .collect();
        Self {
            prices: RwLock::new(prices),
        }
    }

    /// Create an empty pricing table.
    pub fn empty() -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
        }
    }

    /// Add or update pricing for a model.
    pub fn set(&self, model: impl Into<String>, pricing: ModelPricing) {
        let mut prices = self.prices.write().unwrap_or_else(|e| e.into_inner());
        prices.insert(model.into(), pricing);
    }

    /// Resolve pricing for a model name.
    ///
    /// Tries an exact match first, then common provider prefixes
    /// (`gpt-4o` → `openai/gpt-4o`), then the longest key whose bare name is
    /// a prefix of the model (`gpt-4o-mini-2024-07-18` → `gpt-4o-mini`).
    pub fn lookup(&self, model: &str) -> Option<ModelPricing> {
        let prices = self.prices.read().unwrap_or_else(|e| e.into_inner());

        if let Some(p) = prices.get(model) {
            return Some(*p);
        }

        for prefix in ["openai", "anthropic", "google", "mistral", "deepseek", "meta-llama"] {
            if let Some(p) = prices.get(&format!("{prefix}/{model}")) {
                return Some(*p);
            }
        }

        let model_lower = model.to_lowercase();
        let bare_model = model_lower.rsplit('/').next().unwrap_or(&model_lower);

        prices
            .iter()
            .filter_map(|(key, pricing)| {
                let bare_key = key.rsplit('/').next().unwrap_or(key).to_lowercase();
                bare_model
                    .starts_with(&bare_key)
                    .then_some((bare_key.len(), *pricing))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, p)| p)
    }

    /// Compute split cost for a model call; zero if the model is unknown.
    pub fn compute_cost(&self, model: &str, input_tokens: u32, output_tokens: u32) -> CallCost {
        match self.lookup(model) {
            Some(p) => p.cost(input_tokens, output_tokens),
            None => {
                tracing::debug!(model, "No pricing for model, recording zero cost");
                CallCost::default()
            }
        }
    }

    /// List all known model names.
    pub fn models(&self) -> Vec<String> {
        let prices = self.prices.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = prices.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of models in the pricing table.
    pub fn len(&self) -> usize {
        self.prices.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
