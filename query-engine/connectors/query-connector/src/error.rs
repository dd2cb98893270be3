use entity_model::filter::{FieldPath, FilterOperator};
use thiserror::Error;
use user_facing_errors::{fieldgate::UnsupportedPredicate, KnownError};

#[derive(Debug, Error)]
#[error("{}", kind)]
pub struct ConnectorError {
    /// An optional error already rendered for users in case the core does not handle it.
    pub user_facing_error: Option<KnownError>,
    /// The error information for internal use.
    pub kind: ErrorKind,
}

impl ConnectorError {
    pub fn from_kind(kind: ErrorKind) -> Self {
        let user_facing_error = match &kind {
            ErrorKind::UnsupportedFilter {
                entity,
                path,
                operator,
                reason,
            } => Some(KnownError::new(UnsupportedPredicate {
                entity: entity.clone(),
                argument: format!("{path}_{operator}"),
                reason: reason.clone(),
            })),
            _ => None,
        };

        ConnectorError {
            user_facing_error,
            kind,
        }
    }
}

impl From<ErrorKind> for ConnectorError {
    fn from(kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("Entity `{}` is not known to the store.", entity)]
    UnknownEntity { entity: String },

    #[error("Field `{}` does not exist on `{}`.", field, entity)]
    UnknownField { entity: String, field: String },

    #[error("Cannot apply `{}` to `{}` on `{}`: {}", operator, path, entity, reason)]
    UnsupportedFilter {
        entity: String,
        path: FieldPath,
        operator: FilterOperator,
        reason: String,
    },

    #[error("Unique constraint failed on `{}`: more than one record matches.", entity)]
    AmbiguousUniqueMatch { entity: String },

    #[error("Conversion error: {}", _0)]
    ConversionError(String),
}
