//! Infrastructure adapters for Stamp.
//!
//! This crate implements the ports defined in `stamp-core::application::ports`.
//! It contains all external dependencies and I/O operations: the atomic
//! local filesystem, the `stamp.toml` descriptor loader and the built-in
//! template sets.

pub mod builtin_templates;
pub mod descriptor;
pub mod filesystem;

// Re-export commonly used adapters
pub use builtin_templates::{TemplateSet, builtin_sets, find_set};
pub use descriptor::{DESCRIPTOR_FILE, DescriptorLoader, LoadedDescriptor};
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
