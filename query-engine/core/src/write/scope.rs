use super::WriteError;
use crate::CoreResult;
use entity_model::{filter::PathCompare, DataModel, FieldObject, FieldValue, ID_FIELD};
use query_connector::{dedup_by_id, Store};

/// Instances of `entity` a write payload refers to under a dot-separated `path`, e.g.
/// `group` or `members.account`. Lists along the path are traversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeInstancesConfig {
    pub entity: String,
    pub path: String,
}

impl ScopeInstancesConfig {
    pub fn new(entity: impl Into<String>, path: impl Into<String>) -> Self {
        ScopeInstancesConfig {
            entity: entity.into(),
            path: path.into(),
        }
    }

    /// Distinct non-null identities of the objects found at the path.
    fn instance_ids(&self, values: &FieldObject) -> Vec<FieldValue> {
        let segments: Vec<&str> = self.path.split('.').collect();
        let mut found = Vec::new();

        if let Some((head, rest)) = segments.split_first() {
            if let Some(value) = values.get(*head) {
                collect(value, rest, &mut found);
            }
        }

        let mut ids: Vec<FieldValue> = Vec::with_capacity(found.len());

        for id in found.into_iter().filter_map(FieldValue::id) {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }

        ids
    }
}

fn collect<'v>(value: &'v FieldValue, segments: &[&str], out: &mut Vec<&'v FieldValue>) {
    if let FieldValue::List(items) = value {
        for item in items {
            collect(item, segments, out);
        }

        return;
    }

    match segments.split_first() {
        None => out.push(value),
        Some((head, rest)) => {
            if let Some(child) = value.get(head) {
                collect(child, rest, out);
            }
        }
    }
}

/// Verifies that every instance the scopes point to exists, with one lookup per scope.
pub async fn validate_scope_instances(
    store: &dyn Store,
    data_model: &DataModel,
    scopes: &[&ScopeInstancesConfig],
    values: &FieldObject,
) -> CoreResult<()> {
    for scope in scopes {
        let entity = data_model
            .find_entity(&scope.entity)
            .ok_or_else(|| WriteError::UnknownScope {
                entity: scope.entity.clone(),
                path: scope.path.clone(),
            })?;

        let ids = scope.instance_ids(values);

        if ids.is_empty() {
            continue;
        }

        let found: Vec<FieldValue> = dedup_by_id(store.filter(entity, &ID_FIELD.is_in(ids.clone())).await?)
            .iter()
            .filter_map(|record| record.id().cloned())
            .collect();

        tracing::debug!(entity = %entity.name, path = %scope.path, requested = ids.len(), found = found.len(), "checked scope");

        if found.len() != ids.len() {
            return Err(WriteError::ScopeIntegrity {
                entity: entity.name.clone(),
                requested_ids: ids,
                found_ids: found,
            }
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use entity_model::{FieldSpec, ScalarKind};
    use memory_connector::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn object(value: serde_json::Value) -> FieldObject {
        FieldValue::from(value).into_object().unwrap()
    }

    fn model() -> DataModel {
        let mut builder = DataModel::builder();
        builder
            .entity(
                "Group",
                vec![
                    FieldSpec::scalar("id", ScalarKind::Int).primary(),
                    FieldSpec::scalar("name", ScalarKind::String),
                ],
            )
            .unwrap();

        builder.build().unwrap()
    }

    async fn store() -> MemoryStore {
        let store = MemoryStore::new(Arc::new(model()));
        store.insert("Group", object(json!({ "name": "admins" }))).await.unwrap();
        store.insert("Group", object(json!({ "name": "ops" }))).await.unwrap();
        store
    }

    async fn validate(store: &MemoryStore, path: &str, values: serde_json::Value) -> CoreResult<()> {
        let scope = ScopeInstancesConfig::new("Group", path);

        validate_scope_instances(store, &model(), &[&scope], &object(values)).await
    }

    #[test]
    fn ids_are_collected_through_lists() {
        let scope = ScopeInstancesConfig::new("Group", "memberships.group");
        let values = object(json!({
            "memberships": [
                { "group": { "id": 1 } },
                { "group": { "id": 2 } },
                { "group": { "id": 1 } },
                { "group": null },
            ]
        }));

        assert_eq!(scope.instance_ids(&values), vec![FieldValue::Int(1), FieldValue::Int(2)]);
    }

    #[tokio::test]
    async fn existing_instances_pass() {
        let store = store().await;

        validate(&store, "groups", json!({ "groups": [{ "id": 1 }, { "id": 2 }] }))
            .await
            .unwrap();
        validate(&store, "group", json!({ "name": "no group given" })).await.unwrap();
    }

    #[tokio::test]
    async fn missing_instances_are_reported() {
        let store = store().await;

        let err = validate(&store, "groups", json!({ "groups": [{ "id": 1 }, { "id": 9 }] }))
            .await
            .unwrap_err();

        match err {
            CoreError::WriteError(err) => assert_eq!(
                err,
                WriteError::ScopeIntegrity {
                    entity: "Group".to_owned(),
                    requested_ids: vec![FieldValue::Int(1), FieldValue::Int(9)],
                    found_ids: vec![FieldValue::Int(1)],
                }
            ),
            other => panic!("unexpected error: {other}"),
        }
    }
}
