//! Per-trial context: the scratchpad transcript and token estimation.
//!
//! The scratchpad is the only state an agent keeps within a trial. It is
//! rendered verbatim into every prompt, so its size drives the token
//! budget checked by the halting condition.

pub mod scratchpad;
pub mod token;

pub use scratchpad::{Scratchpad, truncate_scratchpad};
pub use token::estimate_tokens;
