//! Cost tracking for trialmind agent runs.
//!
//! Every LLM call is priced from a built-in per-model table (with TOML
//! overrides) and summarised as [`CallMetrics`]. Agent outputs carry the
//! per-call figures and their [`RunTotals`].

pub mod metrics;
pub mod pricing;

pub use metrics::{CallMetrics, RunTotals};
pub use pricing::{CallCost, ModelPricing, PricingTable};
