//! # lab-engine
//!
//! Catalog authoring, exam instantiation, result capture and status
//! transitions over in-memory stores.
//!
//! All operations live on [`LabService`](service::LabService) as `impl` blocks
//! spread across the modules under [`repos`]. Every mutation appends an audit
//! entry.
//!
//! The catalog lock and the instance mutexes are never held together:
//! instances carry a snapshot of their definition's fields, so capture and
//! completion never consult the catalog. Among instances the order is parent
//! before child. The instance index lock is only held long enough to clone an
//! `Arc`; no instance mutex is ever taken while it is held.

pub mod graph;
pub mod inputs;
pub mod repos;
pub mod service;
mod store;
mod validation;

#[cfg(test)]
mod test_support;

pub use repos::audit::AuditFilter;
pub use service::{EngineSettings, LabService};
