use crate::*;
use entity_model::{DataModel, DataModelRef, FieldSpec, Operation, ScalarKind};
use expect_test::expect;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn user_model() -> DataModelRef {
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
            "User",
            vec![
                FieldSpec::scalar("id", ScalarKind::Int)
                    .primary()
                    .deny(Operation::Create)
                    .require(Operation::Update),
                FieldSpec::scalar("username", ScalarKind::String)
                    .require(Operation::Create)
                    .unique(),
                FieldSpec::scalar("password", ScalarKind::String)
                    .require(Operation::Create)
                    .deny(Operation::Read),
                FieldSpec::scalar("email", ScalarKind::String).require(Operation::Create),
                FieldSpec::nested("group", "Group"),
                FieldSpec::lazy("friends", "User").list(),
            ],
        )
        .unwrap();

    Arc::new(builder.build().unwrap())
}

fn render(schema: &QuerySchema) -> String {
    schema
        .types()
        .map(|t| {
            let fields: Vec<String> = t
                .fields
                .iter()
                .map(|f| format!("{}: {}", f.name, f.type_signature()))
                .collect();

            format!("{} {{ {} }}\n", t.name(), fields.join(", "))
        })
        .collect()
}

#[test]
fn builds_root_and_nested_types() {
    let schema = build(user_model(), SchemaConfig::default()).unwrap();

    expect![[r#"
        GroupType { id: Int, name: String }
        GroupCreateInputType { id: Int, name: String }
        GroupUpdateInputType { id: Int, name: String }
        UserType { id: Int, username: String, email: String, group: GroupType, friends: [UserType] }
        UserCreateInputType { username: String!, password: String!, email: String!, group: GroupOfUserRelatedCreateInputType, friends: [UserOfUserRelatedCreateInputType] }
        UserUpdateInputType { id: Int!, username: String, password: String, email: String, group: GroupOfUserRelatedUpdateInputType, friends: [UserOfUserRelatedUpdateInputType] }
        GroupOfUserRelatedCreateInputType { id: Int }
        UserOfUserRelatedCreateInputType { id: Int }
        GroupOfUserRelatedUpdateInputType { id: Int }
        UserOfUserRelatedUpdateInputType { id: Int }
        GroupOfUserRelatedReadInputType { id: Int, name: String }
        UserOfUserRelatedReadInputType { id: Int, username: String, email: String, group: GroupOfUserOfUserRelatedReadInputType, friends: [UserOfUserRelatedReadInputType] }
        GroupOfUserOfUserRelatedReadInputType { id: Int, name: String }
    "#]]
    .assert_eq(&render(&schema));
}

#[test]
fn denied_fields_never_appear_in_root_types() {
    let model = user_model();
    let schema = build(model.clone(), SchemaConfig::default()).unwrap();

    for entity in model.entities() {
        for op in [Operation::Read, Operation::Create, Operation::Update] {
            let object = schema.root_type(&entity.name, op).unwrap();

            for field in entity.fields().filter(|f| !entity_model::permission::is_visible(f, op)) {
                assert!(
                    object.find_field(&field.name).is_none(),
                    "{}.{} leaked into {}",
                    entity.name,
                    field.name,
                    object.name()
                );
            }
        }
    }

    let filters = schema.filter_arguments("User").unwrap();
    assert!(filters.keys().all(|name| !name.starts_with("password")));
}

#[test]
fn required_create_fields_are_marked() {
    let schema = build(user_model(), SchemaConfig::default()).unwrap();
    let create = schema.create_type("User").unwrap();

    let required: Vec<&str> = create
        .fields
        .iter()
        .filter(|f| f.is_required)
        .map(|f| f.name.as_str())
        .collect();

    assert_eq!(required, vec!["username", "password", "email"]);
}

#[test]
fn self_references_resolve_to_the_enclosing_type() {
    let schema = build(user_model(), SchemaConfig::default()).unwrap();
    let nested = TypeIdentity::new("User", Operation::Read, AncestryPath::from_iter(["User"]));
    let object = schema.find_type(&nested).unwrap();

    assert_eq!(
        object.find_field("friends").unwrap().field_type,
        TypeRef::list(TypeRef::Object(nested.clone()))
    );
    assert!(object.filters.contains_key("friends_in"));
    assert!(object.filters.contains_key("username_startswith"));
}

#[test]
fn root_filter_arguments_reference_nested_read_types() {
    let schema = build(user_model(), SchemaConfig::default()).unwrap();

    assert_eq!(
        schema.argument_type("User", "group").unwrap().to_string(),
        "GroupOfUserRelatedReadInputType"
    );
    assert_eq!(
        schema.argument_type("User", "friends_in").unwrap().to_string(),
        "[UserOfUserRelatedReadInputType]"
    );
    assert_eq!(schema.argument_type("User", "username_in").unwrap().to_string(), "[String]");
    assert!(schema.argument_type("User", "group_in").is_none());
}

#[test]
fn identical_shapes_from_different_ancestry_are_not_shared() {
    let mut builder = DataModel::builder();
    builder
        .entity("Group", vec![FieldSpec::scalar("id", ScalarKind::Int)])
        .unwrap()
        .entity("User", vec![FieldSpec::nested("group", "Group")])
        .unwrap()
        .entity("Foo", vec![FieldSpec::nested("group", "Group")])
        .unwrap();

    let schema = build(Arc::new(builder.build().unwrap()), SchemaConfig::default()).unwrap();

    let from_user = schema.argument_type("User", "group").unwrap();
    let from_foo = schema.argument_type("Foo", "group").unwrap();

    assert_eq!(from_user.to_string(), "GroupOfUserRelatedReadInputType");
    assert_eq!(from_foo.to_string(), "GroupOfFooRelatedReadInputType");

    let names: Vec<String> = schema.types().map(|t| t.name()).collect();
    let unique: std::collections::HashSet<&String> = names.iter().collect();
    assert_eq!(names.len(), unique.len());
}

#[test]
fn nested_fields_restrict_the_nested_read_projection() {
    let mut builder = DataModel::builder();
    builder
        .entity(
            "Group",
            vec![
                FieldSpec::scalar("id", ScalarKind::Int),
                FieldSpec::scalar("name", ScalarKind::String),
                FieldSpec::scalar("secret", ScalarKind::String),
            ],
        )
        .unwrap()
        .entity(
            "User",
            vec![FieldSpec::nested("group", "Group").nested_fields(["id", "name"])],
        )
        .unwrap();

    let schema = build(Arc::new(builder.build().unwrap()), SchemaConfig::default()).unwrap();
    let nested = schema
        .find_type(&TypeIdentity::new("Group", Operation::Read, AncestryPath::from_iter(["User"])))
        .unwrap();

    assert_eq!(nested.field_names().collect::<Vec<_>>(), vec!["id", "name"]);
    assert!(!nested.filters.contains_key("secret"));
}

#[test]
fn nested_writes_keep_only_the_identity_and_marked_fields() {
    let mut builder = DataModel::builder();
    builder
        .entity(
            "Tag",
            vec![
                FieldSpec::scalar("id", ScalarKind::Int).deny(Operation::Create),
                FieldSpec::scalar("label", ScalarKind::String).nested_write(),
                FieldSpec::scalar("color", ScalarKind::String).require(Operation::Create),
            ],
        )
        .unwrap()
        .entity("Post", vec![FieldSpec::nested("tags", "Tag").list()])
        .unwrap();

    let schema = build(Arc::new(builder.build().unwrap()), SchemaConfig::default()).unwrap();
    let nested = schema
        .find_type(&TypeIdentity::new("Tag", Operation::Create, AncestryPath::from_iter(["Post"])))
        .unwrap();

    assert_eq!(nested.field_names().collect::<Vec<_>>(), vec!["id", "label"]);
    assert!(nested.fields.iter().all(|f| !f.is_required));
}

#[test]
fn schema_cell_builds_exactly_once() {
    let cell = SchemaCell::new();
    let model = user_model();

    let first = cell.get_or_build(&model, &SchemaConfig::default()).unwrap().clone();
    let second = cell.get_or_build(&model, &SchemaConfig::default()).unwrap().clone();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
        cell.init(model, SchemaConfig::default()).unwrap_err(),
        SchemaError::AlreadyInitialized
    );
}
