//! Operation modules for the exam catalog and its instances.
//!
//! Each module adds methods to `LabService` via `impl LabService` blocks.

pub mod audit;
pub mod capture;
pub mod definition;
pub mod instance;
pub mod render;
