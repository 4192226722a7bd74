//! Tool implementations for trialmind.
//!
//! Tools give the agents their environment:
//! search and read pages (Wikipedia or an in-memory docstore) and run
//! python snippets for the math and code benchmarks.

pub mod explorer;
pub mod memory_docstore;
pub mod python;
pub mod wikipedia;

pub use explorer::DocstoreExplorer;
pub use memory_docstore::InMemoryDocstore;
pub use python::PythonExecutor;
pub use wikipedia::WikipediaDocstore;
