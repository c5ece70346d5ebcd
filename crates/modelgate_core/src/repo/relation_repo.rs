//! Many-to-many relation link persistence.
//!
//! # Responsibility
//! - Add, remove, read and replace links in `relation_links`.
//! - Resolve which pivot column holds the owner for inverse relations.
//!
//! # Invariants
//! - Links have set semantics per `(pivot, left_id, right_id)`.
//! - Both ends of a new link must be stored records of the expected models.
//! - `sync_links` replaces the whole membership in one immediate transaction.

use crate::model::record::{Model, Record, RecordId, RelationKey};
use crate::repo::record_repo::{
    parse_uuid, record_exists, RepoError, RepoResult, SqliteRecordRepository,
};
use rusqlite::{params, Connection, TransactionBehavior};
use std::collections::BTreeSet;

/// Membership changes applied by one sync call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncChanges {
    /// Ids linked by this call, ascending.
    pub attached: Vec<RecordId>,
    /// Ids unlinked by this call, ascending.
    pub detached: Vec<RecordId>,
}

impl SyncChanges {
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty()
    }
}

/// Repository interface for many-to-many links.
pub trait RelationRepository {
    /// Links `related` to `owner`. Returns `false` when the link already existed.
    fn attach_link<M: Model>(
        &self,
        owner: &Record<M>,
        relation: M::Relation,
        related: RecordId,
    ) -> RepoResult<bool>;
    /// Unlinks `related` from `owner`. Returns `false` when no link existed.
    fn detach_link<M: Model>(
        &self,
        owner: &Record<M>,
        relation: M::Relation,
        related: RecordId,
    ) -> RepoResult<bool>;
    /// Replaces the full membership of `relation` with `related`.
    fn sync_links<M: Model>(
        &mut self,
        owner: &Record<M>,
        relation: M::Relation,
        related: &BTreeSet<RecordId>,
    ) -> RepoResult<SyncChanges>;
    /// Loads the current membership of `relation`.
    fn load_links<M: Model>(
        &self,
        owner: &Record<M>,
        relation: M::Relation,
    ) -> RepoResult<BTreeSet<RecordId>>;
}

impl RelationRepository for SqliteRecordRepository<'_> {
    fn attach_link<M: Model>(
        &self,
        owner: &Record<M>,
        relation: M::Relation,
        related: RecordId,
    ) -> RepoResult<bool> {
        ensure_owner_stored(self.conn, owner)?;
        ensure_related_stored(self.conn, relation, related)?;

        let changed = insert_link(self.conn, owner.id(), relation, related)?;
        Ok(changed > 0)
    }

    fn detach_link<M: Model>(
        &self,
        owner: &Record<M>,
        relation: M::Relation,
        related: RecordId,
    ) -> RepoResult<bool> {
        ensure_owner_stored(self.conn, owner)?;

        let changed = delete_link(self.conn, owner.id(), relation, related)?;
        Ok(changed > 0)
    }

    fn sync_links<M: Model>(
        &mut self,
        owner: &Record<M>,
        relation: M::Relation,
        related: &BTreeSet<RecordId>,
    ) -> RepoResult<SyncChanges> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_owner_stored(&tx, owner)?;
        for id in related {
            ensure_related_stored(&tx, relation, *id)?;
        }

        let current = select_links(&tx, owner.id(), relation)?;
        let changes = SyncChanges {
            attached: related.difference(&current).copied().collect(),
            detached: current.difference(related).copied().collect(),
        };

        for id in &changes.detached {
            delete_link(&tx, owner.id(), relation, *id)?;
        }
        for id in &changes.attached {
            insert_link(&tx, owner.id(), relation, *id)?;
        }

        tx.commit()?;
        Ok(changes)
    }

    fn load_links<M: Model>(
        &self,
        owner: &Record<M>,
        relation: M::Relation,
    ) -> RepoResult<BTreeSet<RecordId>> {
        ensure_owner_stored(self.conn, owner)?;
        select_links(self.conn, owner.id(), relation)
    }
}

/// Returns `(owner_column, related_column)` for the relation's side of the pivot.
fn link_columns<K: RelationKey>(relation: K) -> (&'static str, &'static str) {
    if relation.inverse() {
        ("right_id", "left_id")
    } else {
        ("left_id", "right_id")
    }
}

fn ensure_owner_stored<M: Model>(conn: &Connection, owner: &Record<M>) -> RepoResult<()> {
    if !owner.exists() {
        return Err(RepoError::NotPersisted {
            model: M::MODEL_NAME,
            id: owner.id(),
        });
    }
    if !record_exists(conn, M::MODEL_NAME, owner.id())? {
        return Err(RepoError::NotFound(owner.id()));
    }
    Ok(())
}

fn ensure_related_stored<K: RelationKey>(
    conn: &Connection,
    relation: K,
    related: RecordId,
) -> RepoResult<()> {
    if !record_exists(conn, relation.related_model(), related)? {
        return Err(RepoError::NotFound(related));
    }
    Ok(())
}

fn insert_link<K: RelationKey>(
    conn: &Connection,
    owner: RecordId,
    relation: K,
    related: RecordId,
) -> RepoResult<usize> {
    let (owner_column, related_column) = link_columns(relation);
    let changed = conn.execute(
        &format!(
            "INSERT OR IGNORE INTO relation_links (pivot, {owner_column}, {related_column})
             VALUES (?1, ?2, ?3);"
        ),
        params![relation.pivot(), owner.to_string(), related.to_string()],
    )?;
    Ok(changed)
}

fn delete_link<K: RelationKey>(
    conn: &Connection,
    owner: RecordId,
    relation: K,
    related: RecordId,
) -> RepoResult<usize> {
    let (owner_column, related_column) = link_columns(relation);
    let changed = conn.execute(
        &format!(
            "DELETE FROM relation_links
             WHERE pivot = ?1
               AND {owner_column} = ?2
               AND {related_column} = ?3;"
        ),
        params![relation.pivot(), owner.to_string(), related.to_string()],
    )?;
    Ok(changed)
}

fn select_links<K: RelationKey>(
    conn: &Connection,
    owner: RecordId,
    relation: K,
) -> RepoResult<BTreeSet<RecordId>> {
    let (owner_column, related_column) = link_columns(relation);
    let mut stmt = conn.prepare(&format!(
        "SELECT {related_column}
         FROM relation_links
         WHERE pivot = ?1
           AND {owner_column} = ?2;"
    ))?;
    let mut rows = stmt.query(params![relation.pivot(), owner.to_string()])?;
    let mut members = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        members.insert(parse_uuid(&value, "relation_links")?);
    }
    Ok(members)
}
