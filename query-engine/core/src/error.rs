use crate::{compiler::CompileError, upsert::UpsertError, write::ViolationKind, WriteError};
use query_connector::error::ConnectorError;
use schema::SchemaError;
use thiserror::Error;
use user_facing_errors::{fieldgate, KnownError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Entity `{0}` is not part of the data model.")]
    UnknownEntity(String),

    #[error("Error building the query schema: {0}")]
    SchemaError(#[from] SchemaError),

    #[error(transparent)]
    CompileError(#[from] CompileError),

    #[error(transparent)]
    UpsertError(#[from] UpsertError),

    #[error(transparent)]
    WriteError(#[from] WriteError),

    #[error("Error in connector: {0}")]
    ConnectorError(#[from] ConnectorError),
}

impl From<CoreError> for user_facing_errors::Error {
    fn from(err: CoreError) -> user_facing_errors::Error {
        match err {
            CoreError::ConnectorError(ConnectorError {
                user_facing_error: Some(user_facing_error),
                ..
            }) => user_facing_error.into(),

            CoreError::SchemaError(err) => KnownError::new(fieldgate::InvalidConfiguration {
                details: err.to_string(),
            })
            .into(),

            CoreError::CompileError(CompileError::PredicateUnsupported {
                entity,
                argument,
                reason,
            }) => KnownError::new(fieldgate::UnsupportedPredicate {
                entity,
                argument,
                reason,
            })
            .into(),

            CoreError::UpsertError(UpsertError::NoUniqueMatch { entity }) => {
                KnownError::new(fieldgate::MissingUniqueMatch { entity }).into()
            }

            CoreError::UpsertError(UpsertError::MissingReferenceId { entity, field }) => {
                KnownError::new(fieldgate::MissingReferenceId { entity, field }).into()
            }

            CoreError::WriteError(WriteError::PermissionViolation {
                entity,
                field,
                operation,
                kind: ViolationKind::Denied,
            }) => KnownError::new(fieldgate::PermissionDenied {
                entity,
                field,
                operation: operation.to_string(),
            })
            .into(),

            CoreError::WriteError(WriteError::PermissionViolation {
                entity,
                field,
                operation,
                kind: ViolationKind::MissingRequired,
            }) => KnownError::new(fieldgate::MissingRequiredField {
                entity,
                field,
                operation: operation.to_string(),
            })
            .into(),

            CoreError::WriteError(WriteError::UniquenessExhausted {
                entity,
                field,
                value,
                existing,
            }) => KnownError::new(fieldgate::UniquenessExhausted {
                entity,
                field,
                value,
                existing,
            })
            .into(),

            CoreError::WriteError(WriteError::ScopeIntegrity {
                entity,
                requested_ids,
                found_ids,
            }) => KnownError::new(fieldgate::ScopeIntegrityViolation {
                entity,
                requested_ids: requested_ids.iter().map(ToString::to_string).collect(),
                found_ids: found_ids.iter().map(ToString::to_string).collect(),
            })
            .into(),

            CoreError::WriteError(err @ WriteError::UnknownScope { .. }) => {
                KnownError::new(fieldgate::InvalidConfiguration {
                    details: err.to_string(),
                })
                .into()
            }

            _ => user_facing_errors::Error::new_non_user_facing(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_model::{FieldValue, Operation};
    use pretty_assertions::assert_eq;

    fn code(err: impl Into<CoreError>) -> Option<String> {
        let err: user_facing_errors::Error = err.into().into();
        err.error_code().map(str::to_owned)
    }

    #[test]
    fn write_errors_carry_their_codes() {
        let denied = WriteError::PermissionViolation {
            entity: "User".to_owned(),
            field: "id".to_owned(),
            operation: Operation::Create,
            kind: ViolationKind::Denied,
        };

        let missing = WriteError::PermissionViolation {
            entity: "User".to_owned(),
            field: "email".to_owned(),
            operation: Operation::Create,
            kind: ViolationKind::MissingRequired,
        };

        assert_eq!(code(denied).as_deref(), Some("FG2000"));
        assert_eq!(code(missing).as_deref(), Some("FG2001"));
    }

    #[test]
    fn scope_violations_list_ids_as_text() {
        let err: user_facing_errors::Error = CoreError::from(WriteError::ScopeIntegrity {
            entity: "Group".to_owned(),
            requested_ids: vec![FieldValue::Int(1), FieldValue::Int(9)],
            found_ids: vec![FieldValue::Int(1)],
        })
        .into();

        assert_eq!(err.error_code(), Some("FG2003"));
        assert_eq!(
            err.message(),
            "Some `Group` ids among ids:[1, 9] do not exist. Found the following instances: 1"
        );
    }

    #[test]
    fn missing_unique_match_is_a_configuration_error() {
        let err = UpsertError::NoUniqueMatch {
            entity: "User".to_owned(),
        };

        assert_eq!(code(err).as_deref(), Some("FG1001"));
    }

    #[test]
    fn references_without_ids_are_rejected_input() {
        let err: user_facing_errors::Error = CoreError::from(UpsertError::MissingReferenceId {
            entity: "User".to_owned(),
            field: "group".to_owned(),
        })
        .into();

        assert_eq!(err.error_code(), Some("FG2005"));
        assert_eq!(
            err.message(),
            "The reference `User.group` must be given as an id or an object with an id."
        );
    }

    #[test]
    fn unknown_entities_are_not_user_facing() {
        assert_eq!(code(CoreError::UnknownEntity("Nope".to_owned())), None);
    }
}
