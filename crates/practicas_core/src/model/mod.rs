//! Portal domain model.
//!
//! # Responsibility
//! - Define the persisted shape of every table record.
//! - Keep field names of the stored JSON stable (`tutorEmpresarialId`, ...)
//!   while exposing Rust-side names.
//!
//! # Invariants
//! - Every record is identified by an opaque string id.
//! - Records are never archived; cancelled or rejected records stay.

pub mod application;
pub mod company;
pub mod evaluation;
pub mod internship;
pub mod posting;
pub mod report;
pub mod task;
pub mod tutor_assignment;
pub mod user;
pub mod validation;

/// Opaque record identifier (timestamp-derived for new records).
pub type RecordId = String;
