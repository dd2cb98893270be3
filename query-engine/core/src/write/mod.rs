//! Validated writes: permissions, derived unique values, document merging and scope checks
//! run before the update-or-create reaches the store.

mod documents;
mod scope;
mod unique;
mod validate;

pub use documents::merge_documents_on_update;
pub use scope::{validate_scope_instances, ScopeInstancesConfig};
pub use unique::{enforce_unique_props, increment_until_unique};
pub use validate::validate_input;

use crate::{plan_upsert, CoreError, CoreResult};
use entity_model::{FieldObject, FieldValue, Operation, OperationHint};
use itertools::Itertools;
use query_connector::{Record, Store};
use schema::QuerySchema;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Denied,
    MissingRequired,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WriteError {
    #[error("Field `{entity}.{field}` {} for the {operation} operation.", violation(.kind))]
    PermissionViolation {
        entity: String,
        field: String,
        operation: Operation,
        kind: ViolationKind,
    },

    #[error(
        "Could not generate a unique value for `{entity}.{field}` from `{value}`. The following matching ones exist: {}",
        .existing.join(", ")
    )]
    UniquenessExhausted {
        entity: String,
        field: String,
        value: String,
        existing: Vec<String>,
    },

    #[error(
        "Some `{entity}` ids among ids:[{}] do not exist. Found the following instances: {}",
        .requested_ids.iter().join(", "),
        found(.found_ids)
    )]
    ScopeIntegrity {
        entity: String,
        requested_ids: Vec<FieldValue>,
        found_ids: Vec<FieldValue>,
    },

    #[error("The scope `{path}` refers to the unknown entity `{entity}`.")]
    UnknownScope { entity: String, path: String },
}

fn violation(kind: &ViolationKind) -> &'static str {
    match kind {
        ViolationKind::Denied => "is not permitted",
        ViolationKind::MissingRequired => "is required",
    }
}

fn found(ids: &[FieldValue]) -> String {
    if ids.is_empty() {
        "None".to_owned()
    } else {
        ids.iter().join(", ")
    }
}

/// Runs update-or-create writes for one schema and store.
pub struct UpsertExecutor<'a> {
    schema: &'a QuerySchema,
    store: &'a dyn Store,
    scopes: Vec<(String, ScopeInstancesConfig)>,
}

impl<'a> UpsertExecutor<'a> {
    pub fn new(schema: &'a QuerySchema, store: &'a dyn Store) -> Self {
        UpsertExecutor {
            schema,
            store,
            scopes: Vec::new(),
        }
    }

    /// Requires the instances `config` points to in writes of `entity` to exist.
    pub fn with_scope(mut self, entity: impl Into<String>, config: ScopeInstancesConfig) -> Self {
        self.scopes.push((entity.into(), config));
        self
    }

    fn scopes_of<'s>(&'s self, entity: &'s str) -> impl Iterator<Item = &'s ScopeInstancesConfig> + 's {
        self.scopes
            .iter()
            .filter(move |(name, _)| name == entity)
            .map(|(_, config)| config)
    }

    /// Writes `values` to `entity`, returning the stored record and whether it was created.
    ///
    /// Nothing reaches the store unless the payload passes validation for the resolved
    /// operation.
    #[tracing::instrument(skip(self, hint, values))]
    pub async fn upsert(&self, entity: &str, hint: OperationHint, values: FieldObject) -> CoreResult<(Record, bool)> {
        let spec = self
            .schema
            .find_entity(entity)
            .ok_or_else(|| CoreError::UnknownEntity(entity.to_owned()))?;

        let op = hint.resolve(&values);
        tracing::debug!(operation = %op, "resolved write operation");

        validate_input(self.schema, spec, op, &values)?;

        let scopes: Vec<&ScopeInstancesConfig> = self.scopes_of(entity).collect();
        validate_scope_instances(self.store, self.schema.data_model(), &scopes, &values).await?;

        let values = enforce_unique_props(self.store, spec, values).await?;

        let values = match op {
            Operation::Update => merge_documents_on_update(self.store, spec, values).await?,
            _ => values,
        };

        let plan = plan_upsert(spec, &values)?;
        let (record, created) = self
            .store
            .update_or_create(spec, &plan.unique_match, &plan.defaults)
            .await?;

        tracing::debug!(created, "stored record");

        Ok((record, created))
    }
}
