#![allow(dead_code)]

use entity_model::{DataModel, FieldObject, FieldSpec, FieldValue, Operation, ScalarKind, UniqueStrategy};
use memory_connector::MemoryStore;
use query_connector::Record;
use schema::{QuerySchema, SchemaConfig};
use std::sync::Arc;

pub struct TestContext {
    pub schema: QuerySchema,
    pub store: MemoryStore,
}

pub fn object(value: serde_json::Value) -> FieldObject {
    FieldValue::from(value).into_object().unwrap()
}

pub fn usernames(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get("username").and_then(FieldValue::as_str).map(str::to_owned))
        .collect()
}

fn data_model() -> DataModel {
    let mut builder = DataModel::builder();

    builder
        .entity(
            "Group",
            vec![
                FieldSpec::scalar("id", ScalarKind::Int).primary(),
                FieldSpec::scalar("name", ScalarKind::String),
            ],
        )
        .unwrap()
        .entity(
            "Tag",
            vec![
                FieldSpec::scalar("id", ScalarKind::Int).primary(),
                FieldSpec::scalar("name", ScalarKind::String),
            ],
        )
        .unwrap()
        .entity(
            "User",
            vec![
                FieldSpec::scalar("id", ScalarKind::Int)
                    .primary()
                    .deny(Operation::Create)
                    .require(Operation::Update),
                FieldSpec::scalar("username", ScalarKind::String)
                    .require(Operation::Create)
                    .unique()
                    .unique_with(UniqueStrategy::AppendIndex),
                FieldSpec::scalar("password", ScalarKind::String)
                    .require(Operation::Create)
                    .deny(Operation::Read),
                FieldSpec::scalar("email", ScalarKind::String).require(Operation::Create),
                FieldSpec::scalar("data", ScalarKind::Document),
                FieldSpec::nested("group", "Group"),
                FieldSpec::nested("tags", "Tag").list(),
            ],
        )
        .unwrap();

    builder.build().unwrap()
}

/// Groups `admins` (1) and `ops` (2), tags `x` (1) and `y` (2), users `ann` (admins, x and y),
/// `bob` (ops, x) and `cid` (no group, no tags).
pub async fn setup() -> TestContext {
    let model = Arc::new(data_model());
    let schema = schema::build(model.clone(), SchemaConfig::default()).unwrap();
    let store = MemoryStore::new(model);

    for name in ["admins", "ops"] {
        store.insert("Group", object(serde_json::json!({ "name": name }))).await.unwrap();
    }

    for name in ["x", "y"] {
        store.insert("Tag", object(serde_json::json!({ "name": name }))).await.unwrap();
    }

    let users = serde_json::json!([
        {
            "username": "ann",
            "password": "secret",
            "email": "ann@example.com",
            "data": { "theme": "dark", "tabs": { "a": 1 } },
            "group_id": 1,
            "tags": [1, 2],
        },
        { "username": "bob", "password": "secret", "email": "bob@example.com", "group_id": 2, "tags": [1] },
        { "username": "cid", "password": "secret", "email": "cid@example.com", "group_id": null, "tags": [] },
    ]);

    for user in FieldValue::from(users).into_list().unwrap() {
        store.insert("User", user.into_object().unwrap()).await.unwrap();
    }

    TestContext { schema, store }
}
