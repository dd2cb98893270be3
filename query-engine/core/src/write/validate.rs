use super::{ViolationKind, WriteError};
use entity_model::{EntitySpec, FieldObject, FieldValue, Operation};
use schema::{ObjectType, QuerySchema};

/// Checks a write payload against the input type generated for `op`.
///
/// Keys the type does not expose are denied, required fields must be present and non-null.
/// Nested objects are checked against their nested input types. Reads and deletes carry no
/// payload and always pass.
pub fn validate_input(schema: &QuerySchema, entity: &EntitySpec, op: Operation, values: &FieldObject) -> Result<(), WriteError> {
    if !op.is_write() {
        return Ok(());
    }

    match schema.root_type(&entity.name, op) {
        Some(input) => validate_object(schema, input, op, values),
        None => Ok(()),
    }
}

fn validate_object(schema: &QuerySchema, input: &ObjectType, op: Operation, values: &FieldObject) -> Result<(), WriteError> {
    let violation = |field: &str, kind| WriteError::PermissionViolation {
        entity: input.identity.entity.clone(),
        field: field.to_owned(),
        operation: op,
        kind,
    };

    for (key, value) in values {
        let field = input.find_field(key).ok_or_else(|| violation(key, ViolationKind::Denied))?;

        let Some(nested) = field.field_type.as_object().and_then(|id| schema.find_type(id)) else {
            continue;
        };

        match value {
            FieldValue::Object(object) => validate_object(schema, nested, op, object)?,
            FieldValue::List(members) => {
                for object in members.iter().filter_map(FieldValue::as_object) {
                    validate_object(schema, nested, op, object)?;
                }
            }
            _ => (),
        }
    }

    let missing = input
        .fields
        .iter()
        .filter(|f| f.is_required)
        .find(|f| values.get(&f.name).map_or(true, FieldValue::is_null));

    match missing {
        Some(field) => Err(violation(&field.name, ViolationKind::MissingRequired)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_model::{DataModel, FieldSpec, ScalarKind};
    use pretty_assertions::assert_eq;
    use schema::SchemaConfig;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> QuerySchema {
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
                    FieldSpec::scalar("username", ScalarKind::String).require(Operation::Create),
                    FieldSpec::scalar("email", ScalarKind::String).require(Operation::Create),
                    FieldSpec::nested("group", "Group"),
                ],
            )
            .unwrap();

        schema::build(Arc::new(builder.build().unwrap()), SchemaConfig::default()).unwrap()
    }

    fn check(op: Operation, values: serde_json::Value) -> Result<(), WriteError> {
        let schema = schema();
        let user = schema.find_entity("User").unwrap().clone();

        validate_input(&schema, &user, op, &FieldValue::from(values).into_object().unwrap())
    }

    fn violation(field: &str, operation: Operation, kind: ViolationKind) -> WriteError {
        WriteError::PermissionViolation {
            entity: "User".to_owned(),
            field: field.to_owned(),
            operation,
            kind,
        }
    }

    #[test]
    fn complete_payloads_pass() {
        assert_eq!(
            check(Operation::Create, json!({ "username": "ann", "email": "a@x.com", "group": { "id": 1 } })),
            Ok(())
        );
        assert_eq!(check(Operation::Update, json!({ "id": 1, "email": "b@x.com" })), Ok(()));
    }

    #[test]
    fn denied_fields_are_rejected() {
        assert_eq!(
            check(Operation::Create, json!({ "id": 5, "username": "ann", "email": "a@x.com" })),
            Err(violation("id", Operation::Create, ViolationKind::Denied))
        );
    }

    #[test]
    fn missing_and_null_required_fields_are_rejected() {
        assert_eq!(
            check(Operation::Create, json!({ "username": "ann" })),
            Err(violation("email", Operation::Create, ViolationKind::MissingRequired))
        );
        assert_eq!(
            check(Operation::Update, json!({ "id": null, "email": "b@x.com" })),
            Err(violation("id", Operation::Update, ViolationKind::MissingRequired))
        );
    }

    #[test]
    fn nested_payloads_are_checked_against_nested_types() {
        let err = check(
            Operation::Create,
            json!({ "username": "ann", "email": "a@x.com", "group": { "id": 1, "name": "admins" } }),
        )
        .unwrap_err();

        assert_eq!(
            err,
            WriteError::PermissionViolation {
                entity: "Group".to_owned(),
                field: "name".to_owned(),
                operation: Operation::Create,
                kind: ViolationKind::Denied,
            }
        );
    }

    #[test]
    fn reads_and_deletes_always_pass() {
        assert_eq!(check(Operation::Delete, json!({ "anything": 1 })), Ok(()));
        assert_eq!(check(Operation::Read, json!({ "password": "x" })), Ok(()));
    }

    #[test]
    fn messages_name_the_violation() {
        let err = violation("email", Operation::Create, ViolationKind::MissingRequired);

        assert_eq!(err.to_string(), "Field `User.email` is required for the create operation.");
    }
}
