//! Application layer: runs the marker engine over real files.
//!
//! [`GenerationService`] owns the per-run pipeline and reaches storage only
//! through the [`Filesystem`] port. Rules about markers, units and names stay
//! in `crate::domain`; failures of the pipeline itself are
//! [`ApplicationError`]s.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::Filesystem;
pub use services::{GenerationOptions, GenerationService};
