//! Configuration and dependency wiring for the issue indexer.

mod dependencies;

pub use dependencies::Dependencies;
