//! Splitting write payloads into the lookup and the values of an update-or-create.

use entity_model::{permission, EntitySpec, FieldObject, FieldSpec, FieldValue, ID_FIELD};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpsertPlan {
    pub id: Option<FieldValue>,
    /// Values identifying the record to update.
    pub unique_match: FieldObject,
    /// Values written to the matched or created record.
    pub defaults: FieldObject,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpsertError {
    #[error("Cannot update or create `{entity}` without an id or a value for a field declared unique.")]
    NoUniqueMatch { entity: String },

    #[error("A `{entity}.{field}` reference was given as an object without an id.")]
    MissingReferenceId { entity: String, field: String },
}

/// Plans the update-or-create of `values`.
///
/// With an identity the record is matched by it alone. Otherwise every non-null value of a
/// field declared unique or primary is part of the match. References are written as foreign
/// keys.
pub fn plan_upsert(entity: &EntitySpec, values: &FieldObject) -> Result<UpsertPlan, UpsertError> {
    let id = values.get(ID_FIELD).filter(|id| !id.is_null()).cloned();
    let mut plan = UpsertPlan {
        id: id.clone(),
        ..Default::default()
    };

    if let Some(id) = id {
        plan.unique_match.insert(ID_FIELD.to_owned(), id);
    }

    for (name, value) in values.iter().filter(|(name, _)| name.as_str() != ID_FIELD) {
        let field = entity.field(name);
        let (key, value) = dereference(entity, name, field, value)?;
        let unique = plan.id.is_none() && !value.is_null() && field.map(permission::is_unique).unwrap_or(false);

        if unique {
            plan.unique_match.insert(key, value);
        } else {
            plan.defaults.insert(key, value);
        }
    }

    if plan.unique_match.is_empty() {
        return Err(UpsertError::NoUniqueMatch {
            entity: entity.name.clone(),
        });
    }

    Ok(plan)
}

/// Key and value a field is stored under. To-one references become `{field}_id`, to-many
/// references the list of member identities.
fn dereference(
    entity: &EntitySpec,
    name: &str,
    field: Option<&FieldSpec>,
    value: &FieldValue,
) -> Result<(String, FieldValue), UpsertError> {
    let Some(field) = field.filter(|f| f.kind.is_entity_ref()) else {
        return Ok((name.to_owned(), value.clone()));
    };

    let identity_of = |value: &FieldValue| match value {
        FieldValue::Object(_) => value.id().cloned().ok_or_else(|| UpsertError::MissingReferenceId {
            entity: entity.name.clone(),
            field: field.name.clone(),
        }),
        other => Ok(other.clone()),
    };

    if field.is_to_many() {
        let ids = match value {
            FieldValue::List(members) => members.iter().map(identity_of).collect::<Result<_, _>>()?,
            other => vec![identity_of(other)?],
        };

        return Ok((name.to_owned(), FieldValue::List(ids)));
    }

    Ok((field.foreign_key(), identity_of(value)?))
}
