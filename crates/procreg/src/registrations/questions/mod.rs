//! Question definitions, the registry that indexes them by slug, and instances bound
//! to stored records.

pub mod definition;
pub mod instance;
pub mod registry;

pub use definition::{
    FieldKind, FieldSpec, ProgressMeta, QuestionDefinition, QuestionRule, RenderStrategy,
    Requirement,
};
pub use instance::{Completion, QuestionInstance, QuestionKey, ValidationResult};
pub use registry::{slugs, QuestionRegistry};
