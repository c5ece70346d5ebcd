//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define record and relation data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Record writes enforce `Record::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `NotPersisted`) in
//!   addition to DB transport errors.

pub mod record_repo;
pub mod relation_repo;
