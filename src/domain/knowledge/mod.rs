//! Knowledge module - Requested-knowledge schema, record, and merge logic.
//!
//! Everything needed to turn a declarative field schema plus model
//! extraction output into a schema-valid, progressively-filled record.

mod field;
mod merge;
mod phase;
mod record;
mod schema;

pub use field::{FieldSpec, FieldType};
pub use merge::{merge_response, MergeError, MergeReport};
pub use phase::{Mode, PromptAssemblyKind, SessionPhase};
pub use record::{normalize_null, KnowledgeRecord};
pub use schema::{validate, SchemaError};
