//! Ports the generation service depends on.
//!
//! There is a single driven port, [`Filesystem`]. `stamp-adapters` provides
//! the atomic on-disk implementation and an in-memory one for tests. The CLI
//! drives the service directly, so no input port is declared.

pub mod output;

pub use output::Filesystem;
