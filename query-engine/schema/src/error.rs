use entity_model::ConfigurationError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Field `{entity}.{field}` references `{target}`, which is not part of the data model.")]
    UnresolvedReference {
        entity: String,
        field: String,
        target: String,
    },

    #[error("The query schema is already initialized.")]
    AlreadyInitialized,
}
