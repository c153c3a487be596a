pub mod common;
pub mod document;
pub mod sub_project;
pub mod template;

pub use crate::domain::DomainError;
pub use document::FileDocument;
pub use sub_project::SubProject;
pub use template::{RenderContext, TargetFile};
