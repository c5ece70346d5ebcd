//! Validation-gated record store with many-to-many relation helpers.
//!
//! Concrete models implement [`Model`] to declare their validation rules and
//! relations; [`ModelService`] refuses to persist a record that fails them.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::attribute::{AttributeValue, Attributes};
pub use model::record::{Model, NoRelations, Record, RecordId, RelationKey};
pub use repo::record_repo::{
    RecordListQuery, RecordRepository, RepoError, RepoResult, SqliteRecordRepository,
};
pub use repo::relation_repo::{RelationRepository, SyncChanges};
pub use service::model_service::ModelService;
pub use validation::{validate_attributes, Rule, RuleKind, RuleSet, ValidationFailed};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
