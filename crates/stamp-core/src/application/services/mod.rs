//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "regenerate every remote".

pub mod generation_service;

pub use generation_service::{GenerationOptions, GenerationService};
