//! LLM call wrapper: one prompt in, one priced and timed [`Response`] out.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use trialmind_core::error::Result;
use trialmind_core::provider::{Provider, ProviderRequest};
use trialmind_telemetry::{CallMetrics, PricingTable};

use crate::context::token::estimate_tokens;

/// One completed LLM call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub input_text: String,
    pub output_text: String,
    #[serde(flatten)]
    pub metrics: CallMetrics,
}

/// A provider bound to a model, sampling settings, and a pricing table.
#[derive(Clone)]
pub struct Llm {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    pricing: Arc<PricingTable>,
}

impl Llm {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            pricing: Arc::new(PricingTable::with_defaults()),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the completion length of every call.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_pricing(mut self, pricing: Arc<PricingTable>) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Complete `prompt`, stopping at any of `stop`.
    ///
    /// Token counts come from the provider's usage report when present,
    /// otherwise from the character heuristic.
    pub async fn generate(&self, prompt: &str, stop: &[&str]) -> Result<Response> {
        let mut request = ProviderRequest::prompt(&self.model, prompt)
            .with_stop(stop.iter().map(|s| s.to_string()).collect());
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let start = Instant::now();
        let response = self.provider.complete(request).await?;
        let prompt_time = start.elapsed().as_secs_f64();

        let output_text = response.message.content;
        let (prompt_tokens, completion_tokens) = match response.usage {
            Some(usage) => (usage.prompt_tokens, usage.completion_tokens),
            None => (
                u32::try_from(estimate_tokens(prompt)).unwrap_or(u32::MAX),
                u32::try_from(estimate_tokens(&output_text)).unwrap_or(u32::MAX),
            ),
        };

        let cost = self
            .pricing
            .compute_cost(&self.model, prompt_tokens, completion_tokens);

        debug!(
            model = %self.model,
            prompt_tokens,
            completion_tokens,
            cost = cost.total,
            "LLM call complete"
        );

        Ok(Response {
            input_text: prompt.to_string(),
            output_text,
            metrics: CallMetrics::new(prompt_tokens, completion_tokens, cost, prompt_time),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, make_text_response};
    use trialmind_core::message::Message;
    use trialmind_core::provider::ProviderResponse;
    use trialmind_telemetry::ModelPricing;

    #[tokio::test]
    async fn uses_reported_usage_and_pricing() {
        let provider = Arc::new(ScriptedProvider::new(vec![make_text_response("Search[Rust]")]));
        let pricing = PricingTable::empty();
        pricing.set("mock-model", ModelPricing::new(1_000_000.0, 2_000_000.0));
        let llm = Llm::new(provider.clone(), "mock-model").with_pricing(Arc::new(pricing));

        let response = llm.generate("Question: x", &["Observation"]).await.unwrap();
        assert_eq!(response.output_text, "Search[Rust]");
        assert_eq!(response.input_text, "Question: x");
        assert_eq!(response.metrics.prompt_tokens, 10);
        assert_eq!(response.metrics.completion_tokens, 5);
        assert_eq!(response.metrics.total_tokens, 15);
        assert!((response.metrics.prompt_cost - 10.0).abs() < 1e-9);
        assert!((response.metrics.completion_cost - 10.0).abs() < 1e-9);
        assert!((response.metrics.total_cost - 20.0).abs() < 1e-9);

        let requests = provider.requests();
        assert_eq!(requests[0].stop, vec!["Observation".to_string()]);
        assert_eq!(requests[0].temperature, 0.0);
    }

    #[tokio::test]
    async fn estimates_when_usage_missing() {
        let provider = Arc::new(ScriptedProvider::new(vec![ProviderResponse {
            message: Message::assistant("abcdefgh"),
            usage: None,
            model: "mock-model".into(),
        }]));
        let llm = Llm::new(provider, "unknown-model");

        let response = llm.generate("abcd", &[]).await.unwrap();
        assert_eq!(response.metrics.prompt_tokens, 1);
        assert_eq!(response.metrics.completion_tokens, 2);
        assert_eq!(response.metrics.total_cost, 0.0);
    }

    #[tokio::test]
    async fn settings_reach_the_request() {
        let provider = Arc::new(ScriptedProvider::new(vec![make_text_response("ok")]));
        let llm = Llm::new(provider.clone(), "m")
            .with_temperature(0.7)
            .with_max_tokens(256);
        llm.generate("p", &[]).await.unwrap();

        let request = &provider.requests()[0];
        assert_eq!(request.max_tokens, Some(256));
        assert!((request.temperature - 0.7).abs() < 1e-6);
        assert_eq!(request.messages[0].content, "p");
    }
}
