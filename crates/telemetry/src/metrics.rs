//! Per-call metrics and their accumulation across a run.

use serde::{Deserialize, Serialize};

use crate::pricing::CallCost;

/// Token, cost, and latency figures for one LLM call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CallMetrics {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    /// USD
    pub prompt_cost: f64,
    /// USD
    pub completion_cost: f64,
    /// USD
    pub total_cost: f64,
    /// Seconds spent waiting on the provider.
    pub prompt_time: f64,
}

impl CallMetrics {
    pub fn new(prompt_tokens: u32, completion_tokens: u32, cost: CallCost, prompt_time: f64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
            prompt_cost: cost.prompt,
            completion_cost: cost.completion,
            total_cost: cost.total,
            prompt_time,
        }
    }
}

/// Sums of [`CallMetrics`] over every call of a run, plus wall-clock time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_tokens: u64,
    pub total_prompt_cost: f64,
    pub total_completion_cost: f64,
    pub total_cost: f64,
    pub total_prompt_time: f64,
    /// Wall-clock seconds for the whole run, including tool time.
    pub total_time: f64,
}

impl RunTotals {
    /// Fold one call into the totals.
    pub fn add(&mut self, call: &CallMetrics) {
        self.total_prompt_tokens += u64::from(call.prompt_tokens);
        self.total_completion_tokens += u64::from(call.completion_tokens);
        self.total_tokens += u64::from(call.total_tokens);
        self.total_prompt_cost += call.prompt_cost;
        self.total_completion_cost += call.completion_cost;
        self.total_cost += call.total_cost;
        self.total_prompt_time += call.prompt_time;
    }

    /// Totals for a sequence of calls, with `total_time` left at zero.
    pub fn from_calls<'a>(calls: impl IntoIterator<Item = &'a CallMetrics>) -> Self {
        let mut totals = Self::default();
        for call in calls {
            totals.add(call);
        }
        totals
    }

    pub fn with_total_time(mut self, seconds: f64) -> Self {
        self.total_time = seconds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(p: u32, c: u32, cost: f64, t: f64) -> CallMetrics {
        CallMetrics::new(
            p,
            c,
            CallCost {
                prompt: cost / 2.0,
                completion: cost / 2.0,
                total: cost,
            },
            t,
        )
    }

    #[test]
    fn call_total_tokens_is_sum() {
        let m = call(10, 5, 0.0, 0.0);
        assert_eq!(m.total_tokens, 15);
    }

    #[test]
    fn oversized_usage_saturates() {
        let m = call(u32::MAX, 1, 0.0, 0.0);
        assert_eq!(m.total_tokens, u32::MAX);
    }

    #[test]
    fn totals_equal_sum_of_steps() {
        let calls: Vec<CallMetrics> = (1..=5).map(|i| call(10 * i, i, 0.001 * i as f64, 0.5)).collect();
        let totals = RunTotals::from_calls(&calls);

        // prompt: 10+20+30+40+50, completion: 1+2+3+4+5
        assert_eq!(totals.total_prompt_tokens, 150);
        assert_eq!(totals.total_completion_tokens, 15);
        assert_eq!(totals.total_tokens, 165);
        assert!((totals.total_cost - 0.015).abs() < 1e-12);
        assert!((totals.total_prompt_cost - 0.0075).abs() < 1e-12);
        assert!((totals.total_prompt_time - 2.5).abs() < 1e-12);
        assert_eq!(totals.total_time, 0.0);
    }

    #[test]
    fn empty_run_is_zero() {
        let totals = RunTotals::from_calls(std::iter::empty());
        assert_eq!(totals, RunTotals::default());
        assert_eq!(totals.with_total_time(1.5).total_time, 1.5);
    }
}
