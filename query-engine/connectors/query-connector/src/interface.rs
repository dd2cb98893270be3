use crate::Record;
use async_trait::async_trait;
use entity_model::{filter::Filter, EntitySpec, FieldObject, FieldValue};
use std::sync::Arc;

pub type StoreRef = Arc<dyn Store>;

/// The persistence engine as seen by the query core.
#[async_trait]
pub trait Store: Send + Sync {
    /// Name of the backing store, used in logs.
    fn name(&self) -> &'static str;

    /// Records of `entity` matching `filter`.
    ///
    /// Conditions on a to-many relation are evaluated against a single related member, and a
    /// record is returned once per matching combination of related members. Callers that need
    /// distinct records deduplicate with [`dedup_by_id`](crate::dedup_by_id).
    async fn filter(&self, entity: &EntitySpec, filter: &Filter) -> crate::Result<Vec<Record>>;

    /// The record with the given identity, if any.
    async fn get(&self, entity: &EntitySpec, id: &FieldValue) -> crate::Result<Option<Record>>;

    /// Updates the record matching every value of `unique_match` with `defaults`, or creates
    /// one from both when none matches.
    ///
    /// Returns the record and whether it was created.
    async fn update_or_create(
        &self,
        entity: &EntitySpec,
        unique_match: &FieldObject,
        defaults: &FieldObject,
    ) -> crate::Result<(Record, bool)>;

    /// Number of distinct records of `entity` matching `filter`.
    async fn count(&self, entity: &EntitySpec, filter: &Filter) -> crate::Result<usize>;
}
