//! Entity structs for the exam catalog and per-request state.
//!
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON
//! roundtrip and schema validation.

mod audit;
mod capture;
mod definition;
mod field;
mod instance;

pub use audit::AuditEntry;
pub use capture::{ResultCapture, ResultValue};
pub use definition::{ExamDefinition, ExamKind};
pub use field::FieldSchema;
pub use instance::ExamInstance;
