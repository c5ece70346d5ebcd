//! Record type and the traits concrete models implement.
//!
//! # Responsibility
//! - Describe a model type: storage name, validation rules, relations.
//! - Hold one record's attributes and its owned relation cache.
//! - Gate persistence behind `Record::validate()`.
//!
//! # Invariants
//! - `id` is generated once and never reused for another record.
//! - `exists` is true only after the record was written or loaded.
//! - The relation cache only holds sets that were loaded or written through
//!   the record store.

use crate::model::attribute::{AttributeValue, Attributes};
use crate::validation::{validate_attributes, RuleSet, ValidationFailed};
use log::warn;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::marker::PhantomData;
use uuid::Uuid;

/// Stable identifier for every stored record.
pub type RecordId = Uuid;

/// Names one many-to-many relation of a model.
///
/// Implemented by a per-model enum, so relations are addressed by variant
/// instead of by property name.
pub trait RelationKey: Copy + Ord + Debug {
    /// Relation name used in logs.
    fn name(self) -> &'static str;

    /// Join-table discriminator shared by both sides of the relation.
    fn pivot(self) -> &'static str;

    /// `Model::MODEL_NAME` of the records on the other side.
    fn related_model(self) -> &'static str;

    /// True when the owner is stored on the right-hand side of the pivot.
    fn inverse(self) -> bool {
        false
    }
}

/// Relation key for models without many-to-many relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoRelations {}

impl RelationKey for NoRelations {
    fn name(self) -> &'static str {
        match self {}
    }

    fn pivot(self) -> &'static str {
        match self {}
    }

    fn related_model(self) -> &'static str {
        match self {}
    }
}

/// A concrete record type.
pub trait Model {
    /// Storage discriminator written to `records.model`.
    const MODEL_NAME: &'static str;

    type Relation: RelationKey;

    /// Rules checked before every write. Empty by default.
    fn validation_rules() -> RuleSet {
        RuleSet::new()
    }
}

/// One record of model `M`.
pub struct Record<M: Model> {
    id: RecordId,
    exists: bool,
    attributes: Attributes,
    relations: BTreeMap<M::Relation, BTreeSet<RecordId>>,
    _model: PhantomData<M>,
}

impl<M: Model> Record<M> {
    /// Creates an unsaved record with a generated id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Creates an unsaved record with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(id: RecordId) -> Self {
        Self {
            id,
            exists: false,
            attributes: Attributes::new(),
            relations: BTreeMap::new(),
            _model: PhantomData,
        }
    }

    /// Creates an unsaved record from an attribute mapping.
    pub fn from_attributes(attributes: Attributes) -> Self {
        let mut record = Self::new();
        record.attributes = attributes;
        record
    }

    pub(crate) fn hydrate(id: RecordId, attributes: Attributes) -> Self {
        let mut record = Self::with_id(id);
        record.attributes = attributes;
        record.exists = true;
        record
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns whether the record has been written to (or read from) storage.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.exists = true;
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, attribute: &str) -> Option<&AttributeValue> {
        self.attributes.get(attribute)
    }

    /// Sets one attribute, replacing any previous value.
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(attribute.into(), value.into());
    }

    /// Builder-style variant of [`Record::set`].
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(attribute, value);
        self
    }

    pub fn remove(&mut self, attribute: &str) -> Option<AttributeValue> {
        self.attributes.remove(attribute)
    }

    pub(crate) fn replace_attributes(&mut self, attributes: Attributes) {
        self.attributes = attributes;
    }

    /// Cached members of `relation`, or `None` when not loaded yet.
    pub fn relation(&self, relation: M::Relation) -> Option<&BTreeSet<RecordId>> {
        self.relations.get(&relation)
    }

    pub fn relation_loaded(&self, relation: M::Relation) -> bool {
        self.relations.contains_key(&relation)
    }

    pub(crate) fn cache_relation(&mut self, relation: M::Relation, members: BTreeSet<RecordId>) {
        self.relations.insert(relation, members);
    }

    pub(crate) fn relations_mut(&mut self) -> &mut BTreeMap<M::Relation, BTreeSet<RecordId>> {
        &mut self.relations
    }

    /// Drops every cached relation; the next access reloads from storage.
    pub fn forget_relations(&mut self) {
        self.relations.clear();
    }

    /// Checks the current attributes against `M::validation_rules()`.
    ///
    /// # Errors
    /// - Returns `ValidationFailed` with every violation message when at least
    ///   one rule fails.
    pub fn validate(&self) -> Result<(), ValidationFailed> {
        let rules = M::validation_rules();
        if rules.is_empty() {
            return Ok(());
        }

        let report = validate_attributes(&self.attributes, &rules);
        if report.passes() {
            return Ok(());
        }

        warn!(
            "event=record_validate module=model status=rejected model={} record_id={} violations={}",
            M::MODEL_NAME,
            self.id,
            report.messages().len()
        );
        Err(ValidationFailed::new(M::MODEL_NAME, report.into_messages()))
    }
}

impl<M: Model> Clone for Record<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            exists: self.exists,
            attributes: self.attributes.clone(),
            relations: self.relations.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> Debug for Record<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("model", &M::MODEL_NAME)
            .field("id", &self.id)
            .field("exists", &self.exists)
            .field("attributes", &self.attributes)
            .field("relations", &self.relations)
            .finish()
    }
}

impl<M: Model> Default for Record<M> {
    fn default() -> Self {
        Self::new()
    }
}
