use crate::evaluate::Evaluator;
use async_trait::async_trait;
use entity_model::{filter::Filter, DataModelRef, EntitySpec, FieldObject, FieldValue, ID_FIELD};
use query_connector::{
    error::{ConnectorError, ErrorKind},
    Record, Store,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub(crate) type Tables = HashMap<String, Table>;

#[derive(Debug, Default)]
pub(crate) struct Table {
    pub(crate) rows: Vec<FieldObject>,
    last_id: i64,
}

impl Table {
    /// Gives the row an integer identity unless it carries one, keeping `id` first.
    fn assign_id(&mut self, values: FieldObject) -> FieldObject {
        match values.get(ID_FIELD) {
            Some(FieldValue::Int(id)) => {
                self.last_id = self.last_id.max(*id);
                values
            }
            Some(id) if !id.is_null() => values,
            _ => {
                self.last_id += 1;

                let mut row = FieldObject::with_capacity(values.len() + 1);
                row.insert(ID_FIELD.to_owned(), FieldValue::Int(self.last_id));
                row.extend(values.into_iter().filter(|(key, _)| key != ID_FIELD));
                row
            }
        }
    }

    fn matching(&self, unique_match: &FieldObject) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| unique_match.iter().all(|(key, value)| row.get(key) == Some(value)))
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// An in-memory store over the entities of a data model.
///
/// Rows are plain value maps: to-one references are kept as `{field}_id`, to-many references
/// as the list of member ids under the field name.
#[derive(Debug)]
pub struct MemoryStore {
    data_model: DataModelRef,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new(data_model: DataModelRef) -> Self {
        let tables = data_model
            .entities()
            .map(|entity| (entity.name.clone(), Table::default()))
            .collect();

        MemoryStore {
            data_model,
            tables: RwLock::new(tables),
        }
    }

    /// Inserts a row as is.
    pub async fn insert(&self, entity: &str, values: FieldObject) -> crate::Result<Record> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, entity)?;

        let row = table.assign_id(values);
        table.rows.push(row.clone());

        Ok(Record::new(row))
    }

    /// Every row of the entity, in insertion order.
    pub async fn records(&self, entity: &str) -> crate::Result<Vec<Record>> {
        let tables = self.tables.read().await;
        let table = tables.get(entity).ok_or_else(|| unknown_entity(entity))?;

        Ok(table.rows.iter().cloned().map(Record::new).collect())
    }

    async fn scan(&self, entity: &EntitySpec, filter: &Filter) -> crate::Result<Vec<(Record, usize)>> {
        let tables = self.tables.read().await;
        let table = tables.get(&entity.name).ok_or_else(|| unknown_entity(&entity.name))?;
        let evaluator = Evaluator::new(&self.data_model, &tables, entity);

        let mut matched = Vec::new();

        for row in table.rows.iter() {
            let times = evaluator.matches(row, filter)?;

            if times > 0 {
                matched.push((Record::new(row.clone()), times));
            }
        }

        Ok(matched)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    #[tracing::instrument(skip(self, entity, filter), fields(entity = %entity.name, filter = %filter))]
    async fn filter(&self, entity: &EntitySpec, filter: &Filter) -> crate::Result<Vec<Record>> {
        let matched = self.scan(entity, filter).await?;
        let records: Vec<Record> = matched
            .into_iter()
            .flat_map(|(record, times)| itertools::repeat_n(record, times))
            .collect();

        tracing::trace!(rows = records.len(), "memory filter");

        Ok(records)
    }

    async fn get(&self, entity: &EntitySpec, id: &FieldValue) -> crate::Result<Option<Record>> {
        let tables = self.tables.read().await;
        let table = tables.get(&entity.name).ok_or_else(|| unknown_entity(&entity.name))?;

        Ok(table
            .rows
            .iter()
            .find(|row| row.get(ID_FIELD) == Some(id))
            .cloned()
            .map(Record::new))
    }

    async fn update_or_create(
        &self,
        entity: &EntitySpec,
        unique_match: &FieldObject,
        defaults: &FieldObject,
    ) -> crate::Result<(Record, bool)> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, &entity.name)?;

        match table.matching(unique_match).as_slice() {
            [] => {
                let mut values = unique_match.clone();
                values.extend(defaults.iter().map(|(k, v)| (k.clone(), v.clone())));

                let row = table.assign_id(values);
                table.rows.push(row.clone());

                Ok((Record::new(row), true))
            }
            [idx] => {
                let row = &mut table.rows[*idx];
                row.extend(defaults.iter().map(|(k, v)| (k.clone(), v.clone())));

                Ok((Record::new(row.clone()), false))
            }
            _ => Err(ConnectorError::from_kind(ErrorKind::AmbiguousUniqueMatch {
                entity: entity.name.clone(),
            })),
        }
    }

    async fn count(&self, entity: &EntitySpec, filter: &Filter) -> crate::Result<usize> {
        Ok(self.scan(entity, filter).await?.len())
    }
}

fn table_mut<'t>(tables: &'t mut Tables, entity: &str) -> crate::Result<&'t mut Table> {
    tables.get_mut(entity).ok_or_else(|| unknown_entity(entity))
}

fn unknown_entity(entity: &str) -> ConnectorError {
    ConnectorError::from_kind(ErrorKind::UnknownEntity {
        entity: entity.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_model::{
        filter::{FieldPath, PathCompare},
        DataModel, FieldSpec, ScalarKind,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn object(pairs: Vec<(&str, FieldValue)>) -> FieldObject {
        pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    async fn seeded() -> (DataModelRef, MemoryStore) {
        let mut builder = DataModel::builder();
        builder
            .entity(
                "Group",
                vec![
                    FieldSpec::scalar("id", ScalarKind::Int),
                    FieldSpec::scalar("name", ScalarKind::String),
                ],
            )
            .unwrap()
            .entity(
                "Tag",
                vec![
                    FieldSpec::scalar("id", ScalarKind::Int),
                    FieldSpec::scalar("name", ScalarKind::String),
                ],
            )
            .unwrap()
            .entity(
                "User",
                vec![
                    FieldSpec::scalar("id", ScalarKind::Int),
                    FieldSpec::scalar("username", ScalarKind::String),
                    FieldSpec::nested("group", "Group"),
                    FieldSpec::nested("tags", "Tag").list(),
                ],
            )
            .unwrap();

        let model = Arc::new(builder.build().unwrap());
        let store = MemoryStore::new(model.clone());

        store.insert("Group", object(vec![("name", "admins".into())])).await.unwrap();
        store.insert("Tag", object(vec![("name", "x".into())])).await.unwrap();
        store.insert("Tag", object(vec![("name", "y".into())])).await.unwrap();
        store.insert("Tag", object(vec![("name", "x-ray".into())])).await.unwrap();

        let users = vec![
            ("ann", FieldValue::Int(1), vec![1, 2]),
            ("bob", FieldValue::Null, vec![1, 3]),
            ("cid", FieldValue::Null, vec![]),
        ];

        for (username, group, tags) in users {
            let tags = FieldValue::List(tags.into_iter().map(FieldValue::from).collect());
            let values = object(vec![("username", username.into()), ("group_id", group), ("tags", tags)]);
            store.insert("User", values).await.unwrap();
        }

        (model, store)
    }

    fn usernames(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(|r| r.get("username")?.as_str()).collect()
    }

    #[tokio::test]
    async fn filters_through_to_one_references() {
        let (model, store) = seeded().await;
        let user = model.find_entity("User").unwrap();

        let records = store.filter(user, &"group.name".equals("admins")).await.unwrap();
        assert_eq!(usernames(&records), vec!["ann"]);

        let records = store.filter(user, &"group".is_null(true)).await.unwrap();
        assert_eq!(usernames(&records), vec!["bob", "cid"]);
    }

    #[tokio::test]
    async fn to_many_conditions_fan_out_per_member() {
        let (model, store) = seeded().await;
        let user = model.find_entity("User").unwrap();

        let filter = FieldPath::from("tags.name").starts_with("x");

        let records = store.filter(user, &filter).await.unwrap();
        assert_eq!(usernames(&records), vec!["ann", "bob", "bob"]);
        assert_eq!(store.count(user, &filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn conditions_in_one_filter_bind_the_same_member() {
        let (model, store) = seeded().await;
        let user = model.find_entity("User").unwrap();

        let both = Filter::and(vec!["tags.name".equals("x"), "tags.name".equals("y")]);
        assert!(store.filter(user, &both).await.unwrap().is_empty());

        let members = Filter::members(FieldPath::from("tags"), vec![2.into(), 3.into()]);
        assert_eq!(usernames(&store.filter(user, &members).await.unwrap()), vec!["ann", "bob"]);
    }

    #[tokio::test]
    async fn negations_exclude_rows_unless_the_member_is_bound() {
        let (model, store) = seeded().await;
        let user = model.find_entity("User").unwrap();

        let without_y = Filter::not("tags.name".equals("y"));
        assert_eq!(usernames(&store.filter(user, &without_y).await.unwrap()), vec!["bob", "cid"]);
        assert_eq!(store.count(user, &without_y).await.unwrap(), 2);

        let same_member = Filter::and(vec![FieldPath::from("tags.name").starts_with("x"), without_y]);
        assert_eq!(
            usernames(&store.filter(user, &same_member).await.unwrap()),
            vec!["ann", "bob", "bob"]
        );
    }

    #[tokio::test]
    async fn update_or_create_matches_on_every_unique_value() {
        let (model, store) = seeded().await;
        let user = model.find_entity("User").unwrap();

        let (record, created) = store
            .update_or_create(
                user,
                &object(vec![("username", "ann".into())]),
                &object(vec![("group_id", FieldValue::Null)]),
            )
            .await
            .unwrap();

        assert!(!created);
        assert_eq!(record.id(), Some(&FieldValue::Int(1)));
        assert_eq!(record.get("group_id"), Some(&FieldValue::Null));

        let (record, created) = store
            .update_or_create(user, &object(vec![("username", "dan".into())]), &FieldObject::new())
            .await
            .unwrap();

        assert!(created);
        assert_eq!(record.id(), Some(&FieldValue::Int(4)));
        assert_eq!(store.get(user, &4.into()).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn unknown_fields_are_reported() {
        let (model, store) = seeded().await;
        let user = model.find_entity("User").unwrap();

        let err = store.filter(user, &"nickname".equals("a")).await.unwrap_err();
        assert_eq!(err.to_string(), "Field `nickname` does not exist on `User`.");
    }
}
