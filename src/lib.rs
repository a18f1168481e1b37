//! Elicit - Schema-Driven Knowledge Extraction
//!
//! This crate implements a conversational extraction engine: a host
//! application declares the values it needs as a question schema, and the
//! engine fills them from dialogue turns until every field is resolved.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
