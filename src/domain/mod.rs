//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `knowledge` - Requested-knowledge schema, record, and merge logic

pub mod foundation;
pub mod knowledge;
