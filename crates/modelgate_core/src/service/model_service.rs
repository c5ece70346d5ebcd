//! Model use-case service.
//!
//! # Responsibility
//! - Save records behind the validation gate (insert or update).
//! - Mutate many-to-many relations and keep the record's relation cache in
//!   step with storage.
//! - Provide lookup, refresh and delete entry points.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - After `attach`/`detach` the cached relation is reloaded from storage.
//! - After `sync` the cached relation equals the synchronized set without a
//!   reload query.
//! - Repository errors are returned unchanged.

use crate::model::record::{Model, Record, RecordId, RelationKey};
use crate::repo::record_repo::{RecordListQuery, RecordRepository, RepoError, RepoResult};
use crate::repo::relation_repo::{RelationRepository, SyncChanges};
use log::{debug, info};
use std::collections::BTreeSet;

/// Use-case facade over a record/relation repository.
pub struct ModelService<R> {
    repo: R,
}

impl<R: RecordRepository + RelationRepository> ModelService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates the record against its model rules without writing.
    pub fn validate<M: Model>(&self, record: &Record<M>) -> RepoResult<()> {
        record.validate().map_err(RepoError::from)
    }

    /// Persists the record after validation passes.
    ///
    /// Inserts records that were never stored and updates the rest.
    ///
    /// # Errors
    /// - `RepoError::Validation` when any rule fails; nothing is written.
    /// - `RepoError::NotFound` when updating a record whose row is gone.
    pub fn save<M: Model>(&self, record: &mut Record<M>) -> RepoResult<RecordId> {
        if record.exists() {
            self.repo.update_record(record)?;
            debug!(
                "event=record_save module=service status=ok op=update model={} record_id={}",
                M::MODEL_NAME,
                record.id()
            );
        } else {
            self.repo.insert_record(record)?;
            record.mark_persisted();
            info!(
                "event=record_save module=service status=ok op=insert model={} record_id={}",
                M::MODEL_NAME,
                record.id()
            );
        }
        Ok(record.id())
    }

    /// Finds one record of model `M` by id.
    pub fn find<M: Model>(&self, id: RecordId) -> RepoResult<Option<Record<M>>> {
        self.repo.find_record(id)
    }

    /// Lists records of model `M`, newest update first.
    pub fn list<M: Model>(&self, query: &RecordListQuery) -> RepoResult<Vec<Record<M>>> {
        self.repo.list_records(query)
    }

    /// Reloads attributes from storage and drops cached relations.
    pub fn refresh<M: Model>(&self, record: &mut Record<M>) -> RepoResult<()> {
        let stored = self
            .repo
            .find_record::<M>(record.id())?
            .ok_or(RepoError::NotFound(record.id()))?;
        record.replace_attributes(stored.attributes().clone());
        record.mark_persisted();
        record.forget_relations();
        Ok(())
    }

    /// Deletes the record and every relation link that references it.
    pub fn delete<M: Model>(&self, record: Record<M>) -> RepoResult<()> {
        self.repo.delete_record::<M>(record.id())?;
        info!(
            "event=record_delete module=service status=ok model={} record_id={}",
            M::MODEL_NAME,
            record.id()
        );
        Ok(())
    }

    /// Returns the members of `relation`, loading them on first access.
    pub fn related<'r, M: Model>(
        &self,
        record: &'r mut Record<M>,
        relation: M::Relation,
    ) -> RepoResult<&'r BTreeSet<RecordId>> {
        if !record.relation_loaded(relation) {
            let members = self.repo.load_links(record, relation)?;
            record.cache_relation(relation, members);
        }
        Ok(record.relations_mut().entry(relation).or_default())
    }

    /// Adds `related` to `relation`, then reloads the relation so the new
    /// member is visible on the record immediately.
    ///
    /// Costs one extra query for the reload.
    pub fn attach<M: Model>(
        &self,
        record: &mut Record<M>,
        relation: M::Relation,
        related: RecordId,
    ) -> RepoResult<()> {
        let inserted = self.repo.attach_link(record, relation, related)?;
        debug!(
            "event=relation_attach module=service status=ok model={} relation={} record_id={} inserted={}",
            M::MODEL_NAME,
            relation.name(),
            record.id(),
            inserted
        );
        self.reload_relation(record, relation)
    }

    /// Removes `related` from `relation`, then reloads the relation so the
    /// removal is visible on the record immediately.
    pub fn detach<M: Model>(
        &self,
        record: &mut Record<M>,
        relation: M::Relation,
        related: RecordId,
    ) -> RepoResult<()> {
        let removed = self.repo.detach_link(record, relation, related)?;
        debug!(
            "event=relation_detach module=service status=ok model={} relation={} record_id={} removed={}",
            M::MODEL_NAME,
            relation.name(),
            record.id(),
            removed
        );
        self.reload_relation(record, relation)
    }

    /// Leaves exactly `related` in `relation`.
    ///
    /// The cached relation is set to the committed set directly; no reload
    /// query is issued.
    pub fn sync<M, I>(
        &mut self,
        record: &mut Record<M>,
        relation: M::Relation,
        related: I,
    ) -> RepoResult<SyncChanges>
    where
        M: Model,
        I: IntoIterator<Item = RecordId>,
    {
        let members: BTreeSet<RecordId> = related.into_iter().collect();
        let changes = self.repo.sync_links(record, relation, &members)?;
        info!(
            "event=relation_sync module=service status=ok model={} relation={} record_id={} attached={} detached={}",
            M::MODEL_NAME,
            relation.name(),
            record.id(),
            changes.attached.len(),
            changes.detached.len()
        );
        record.cache_relation(relation, members);
        Ok(changes)
    }

    /// Reloads one relation from storage into the record's cache.
    pub fn reload_relation<M: Model>(
        &self,
        record: &mut Record<M>,
        relation: M::Relation,
    ) -> RepoResult<()> {
        let members = self.repo.load_links(record, relation)?;
        record.cache_relation(relation, members);
        Ok(())
    }
}
