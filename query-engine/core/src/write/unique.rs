use super::WriteError;
use crate::CoreResult;
use entity_model::{
    filter::{FieldPath, PathCompare},
    EntitySpec, FieldObject, FieldValue, UniqueStrategy, ID_FIELD,
};
use query_connector::{dedup_by_id, Store};

/// Derives a value of `field` no other record of `entity` holds.
///
/// Stored values starting with `value` are collected, ignoring the record `own_id` itself.
/// Without any, `value` is kept. Otherwise the strategy proposes one candidate per stored
/// value and the first free candidate wins.
pub async fn increment_until_unique(
    store: &dyn Store,
    entity: &EntitySpec,
    field: &str,
    strategy: &UniqueStrategy,
    value: &str,
    own_id: Option<&FieldValue>,
) -> CoreResult<String> {
    let mut filter = FieldPath::from(field).starts_with(value);

    if let Some(id) = own_id {
        filter = filter.conjoin(ID_FIELD.not_equals(id.clone()));
    }

    let taken: Vec<String> = dedup_by_id(store.filter(entity, &filter).await?)
        .iter()
        .filter_map(|record| record.get(field).and_then(FieldValue::as_str).map(str::to_owned))
        .collect();

    if taken.is_empty() {
        return Ok(value.to_owned());
    }

    let unique = (0..taken.len())
        .map(|index| strategy.attempt(value, index))
        .find(|candidate| !taken.contains(candidate));

    match unique {
        Some(unique) => {
            tracing::debug!(field, from = value, to = %unique, "derived unique value");
            Ok(unique)
        }
        None => Err(WriteError::UniquenessExhausted {
            entity: entity.name.clone(),
            field: field.to_owned(),
            value: value.to_owned(),
            existing: taken,
        }
        .into()),
    }
}

/// Replaces the value of every field with a uniqueness strategy by a free one.
pub async fn enforce_unique_props(store: &dyn Store, entity: &EntitySpec, mut values: FieldObject) -> CoreResult<FieldObject> {
    let own_id = values.get(ID_FIELD).filter(|id| !id.is_null()).cloned();

    for field in entity.strategy_fields() {
        let Some(strategy) = &field.unique_with else {
            continue;
        };

        let Some(current) = values.get(&field.name).and_then(FieldValue::as_str).map(str::to_owned) else {
            continue;
        };

        let unique = increment_until_unique(store, entity, &field.name, strategy, &current, own_id.as_ref()).await?;
        values.insert(field.name.clone(), FieldValue::String(unique));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use entity_model::{DataModel, DataModelRef, FieldSpec, ScalarKind};
    use memory_connector::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn model() -> DataModelRef {
        let mut builder = DataModel::builder();
        builder
            .entity(
                "User",
                vec![
                    FieldSpec::scalar("id", ScalarKind::Int).primary(),
                    FieldSpec::scalar("username", ScalarKind::String).unique_with(UniqueStrategy::AppendIndex),
                    FieldSpec::scalar("slug", ScalarKind::String)
                        .unique_with(UniqueStrategy::Template("{value}-{index}".to_owned())),
                ],
            )
            .unwrap();

        Arc::new(builder.build().unwrap())
    }

    async fn store(usernames: &[&str]) -> MemoryStore {
        let store = MemoryStore::new(model());

        for name in usernames {
            let row = FieldValue::from(json!({ "username": name })).into_object().unwrap();
            store.insert("User", row).await.unwrap();
        }

        store
    }

    async fn derive(store: &MemoryStore, value: &str, own_id: Option<FieldValue>) -> CoreResult<String> {
        let model = model();
        let user = model.find_entity("User").unwrap();
        let strategy = UniqueStrategy::AppendIndex;

        increment_until_unique(store, user, "username", &strategy, value, own_id.as_ref()).await
    }

    #[tokio::test]
    async fn free_values_are_kept() {
        let store = store(&["bob", "joann"]).await;

        assert_eq!(derive(&store, "ann", None).await.unwrap(), "ann");
    }

    #[tokio::test]
    async fn taken_values_get_the_first_free_index() {
        let store = store(&["ann", "ann1", "anna"]).await;

        assert_eq!(derive(&store, "ann", None).await.unwrap(), "ann2");
    }

    #[tokio::test]
    async fn the_own_record_does_not_count() {
        let store = store(&["ann"]).await;

        assert_eq!(derive(&store, "ann", Some(FieldValue::Int(1))).await.unwrap(), "ann");
    }

    #[tokio::test]
    async fn exhausted_candidates_are_reported() {
        let store = store(&["ann", "ann1"]).await;
        let model = model();
        let user = model.find_entity("User").unwrap();
        let stuck = UniqueStrategy::Template("ann1".to_owned());

        let err = increment_until_unique(&store, user, "username", &stuck, "ann", None)
            .await
            .unwrap_err();

        match err {
            CoreError::WriteError(WriteError::UniquenessExhausted { existing, .. }) => {
                assert_eq!(existing, vec!["ann".to_owned(), "ann1".to_owned()])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn every_strategy_field_is_enforced() {
        let store = store(&["ann"]).await;
        store
            .insert("User", FieldValue::from(json!({ "slug": "post" })).into_object().unwrap())
            .await
            .unwrap();

        let model = model();
        let user = model.find_entity("User").unwrap();
        let values = FieldValue::from(json!({ "username": "ann", "slug": "post" })).into_object().unwrap();

        let values = enforce_unique_props(&store, user, values).await.unwrap();

        assert_eq!(values, FieldValue::from(json!({ "username": "ann1", "slug": "post-1" })).into_object().unwrap());
    }
}
