//! # lab-core
//!
//! Core types for the laboratory exam catalog.
//!
//! This crate holds everything that is pure data or pure computation:
//! - Entity structs for definitions, fields, instances and captures
//! - Status enums with state machine transitions
//! - Typed identifiers
//! - Cross-cutting error types
//! - Reference-range parsing and evaluation
//! - Section grouping and request aggregation
//! - View types and audit detail payloads

pub mod aggregate;
pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod range;
pub mod responses;
pub mod sections;
