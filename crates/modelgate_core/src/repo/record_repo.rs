//! Record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the generic `records` table.
//! - Keep SQL and JSON attribute encoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Record::validate()` before SQL mutations.
//! - Reads are scoped to `Model::MODEL_NAME`; a row of another model is
//!   invisible.
//! - Read paths reject corrupt persisted state instead of masking it.

use crate::db::DbError;
use crate::model::attribute::{AttributeValue, Attributes};
use crate::model::record::{Model, Record, RecordId};
use crate::validation::ValidationFailed;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const RECORDS_DEFAULT_LIMIT: u32 = 20;
const RECORDS_LIMIT_MAX: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record and relation persistence.
#[derive(Debug)]
pub enum RepoError {
    /// The record failed its model's validation rules; nothing was written.
    Validation(ValidationFailed),
    Db(DbError),
    NotFound(RecordId),
    /// Relation operation on a record that was never saved.
    NotPersisted {
        model: &'static str,
        id: RecordId,
    },
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::NotPersisted { model, id } => {
                write!(f, "{model} record {id} must be saved before linking relations")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationFailed> for RepoError {
    fn from(value: ValidationFailed) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Pagination options for listing records of one model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordListQuery {
    /// Maximum rows to return. Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for record CRUD operations.
pub trait RecordRepository {
    fn insert_record<M: Model>(&self, record: &Record<M>) -> RepoResult<RecordId>;
    fn update_record<M: Model>(&self, record: &Record<M>) -> RepoResult<()>;
    fn find_record<M: Model>(&self, id: RecordId) -> RepoResult<Option<Record<M>>>;
    /// Lists records ordered by `updated_at DESC, id ASC`.
    fn list_records<M: Model>(&self, query: &RecordListQuery) -> RepoResult<Vec<Record<M>>>;
    /// Hard-deletes one record; its relation links cascade.
    fn delete_record<M: Model>(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed record and relation repository.
pub struct SqliteRecordRepository<'conn> {
    pub(crate) conn: &'conn mut Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// # Errors
    /// - Returns `MissingRequiredTable`/`MissingRequiredColumn` when the
    ///   connection was not bootstrapped through `db::open_db*`.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn insert_record<M: Model>(&self, record: &Record<M>) -> RepoResult<RecordId> {
        record.validate()?;

        self.conn.execute(
            "INSERT INTO records (id, model, attributes) VALUES (?1, ?2, ?3);",
            params![
                record.id().to_string(),
                M::MODEL_NAME,
                encode_attributes(record.attributes())?,
            ],
        )?;

        Ok(record.id())
    }

    fn update_record<M: Model>(&self, record: &Record<M>) -> RepoResult<()> {
        record.validate()?;

        let changed = self.conn.execute(
            "UPDATE records
             SET
                attributes = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND model = ?2;",
            params![
                record.id().to_string(),
                M::MODEL_NAME,
                encode_attributes(record.attributes())?,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(record.id()));
        }

        Ok(())
    }

    fn find_record<M: Model>(&self, id: RecordId) -> RepoResult<Option<Record<M>>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, attributes
             FROM records
             WHERE id = ?1
               AND model = ?2;",
        )?;

        let mut rows = stmt.query(params![id.to_string(), M::MODEL_NAME])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }

        Ok(None)
    }

    fn list_records<M: Model>(&self, query: &RecordListQuery) -> RepoResult<Vec<Record<M>>> {
        let limit = normalize_list_limit(query.limit);
        let mut stmt = self.conn.prepare(
            "SELECT id, attributes
             FROM records
             WHERE model = ?1
             ORDER BY updated_at DESC, id ASC
             LIMIT ?2 OFFSET ?3;",
        )?;

        let mut rows = stmt.query(params![
            M::MODEL_NAME,
            i64::from(limit),
            i64::from(query.offset)
        ])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn delete_record<M: Model>(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM records WHERE id = ?1 AND model = ?2;",
            params![id.to_string(), M::MODEL_NAME],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

/// Normalizes list limit according to the record listing contract.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => RECORDS_DEFAULT_LIMIT,
        Some(value) if value > RECORDS_LIMIT_MAX => RECORDS_LIMIT_MAX,
        Some(value) => value,
    }
}

pub(crate) fn record_exists(conn: &Connection, model: &str, id: RecordId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM records
            WHERE id = ?1
              AND model = ?2
        );",
        params![id.to_string(), model],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<RecordId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_record_row<M: Model>(row: &Row<'_>) -> RepoResult<Record<M>> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "records.id")?;

    let attributes_text: String = row.get("attributes")?;
    let attributes: Attributes = serde_json::from_str(&attributes_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid attributes json for record {id} in records.attributes: {err}"
        ))
    })?;

    Ok(Record::hydrate(id, attributes))
}

fn encode_attributes(attributes: &Attributes) -> RepoResult<String> {
    // JSON has no NaN/inf; serde_json would silently write them as null.
    if let Some((name, value)) = attributes
        .iter()
        .find(|(_, value)| matches!(value, AttributeValue::Real(real) if !real.is_finite()))
    {
        return Err(RepoError::InvalidData(format!(
            "attribute `{name}` holds non-finite number `{value}`"
        )));
    }

    serde_json::to_string(attributes)
        .map_err(|err| RepoError::InvalidData(format!("attributes cannot be encoded: {err}")))
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    const REQUIRED: &[(&str, &[&str])] = &[
        ("records", &["id", "model", "attributes", "updated_at"]),
        ("relation_links", &["pivot", "left_id", "right_id"]),
    ];

    for &(table, columns) in REQUIRED {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
