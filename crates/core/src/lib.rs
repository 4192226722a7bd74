//! # trialmind core
//!
//! Domain types, traits, and error definitions shared by the trialmind
//! agent loops. It carries no I/O of its own; it defines the boundaries
//! the other crates implement:
//!
//! - [`Provider`]: the language model (text in, text + usage out)
//! - [`Docstore`]: page search for the QA agents
//! - [`CodeExecutor`]: sandboxed code execution for math and code agents

pub mod docstore;
pub mod error;
pub mod executor;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use docstore::{Docstore, Document, SearchOutcome};
pub use error::{Error, ProviderError, Result, ToolError};
pub use executor::{CodeExecutor, Execution, STATUS_DONE};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
