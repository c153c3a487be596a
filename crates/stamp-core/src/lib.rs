//! Stamp Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for Stamp, a
//! scaffolding tool that keeps generated files in sync by rewriting only the
//! marker regions inside them.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            stamp-cli (CLI)              │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │          (GenerationService)            │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │            (Filesystem)                 │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     stamp-adapters (Infrastructure)     │
//! │ (LocalFilesystem, descriptor loader)    │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (scanner, synthesizer, merger, gate)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stamp_core::prelude::*;
//!
//! let checkout = SubProject::new("checkout", "apps/checkout")
//!     .with_file(TargetFile::new(RelativePath::new("src/App.jsx"), APP_TEMPLATE))
//!     .with_registry(UnitRegistry::new().with_unit(GenerationUnit::import("imports", "Cart")));
//!
//! let service = GenerationService::new(Box::new(filesystem));
//! let report = service.generate(&[checkout])?;
//! assert!(report.is_success());
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{GenerationOptions, GenerationService, ports::Filesystem};
    pub use crate::domain::{
        GenerationReport, GenerationUnit, IssueKind, MarkerSyntax, NameValidator, RelativePath,
        SubProject, TargetFile, UnitKind, UnitRegistry,
    };
    pub use crate::error::{StampError, StampResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
