//! Record model shared by every concrete model type.
//!
//! # Responsibility
//! - Define the attribute mapping and value shapes persisted per record.
//! - Define the `Model` / `RelationKey` contracts concrete types implement.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId`.
//! - A record reaches storage only through `Record::validate()`.

pub mod attribute;
pub mod record;
