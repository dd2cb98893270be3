use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Field `{entity}.{field}` has neither a scalar type nor a nested entity reference.")]
    MissingType { entity: String, field: String },

    #[error("Field `{entity}.{field}` references the undeclared entity `{target}`.")]
    UnknownEntity {
        entity: String,
        field: String,
        target: String,
    },

    #[error("Entity `{0}` is declared more than once.")]
    DuplicateEntity(String),

    #[error("Entity `{0}` was declared but its fields were never defined.")]
    UndefinedEntity(String),

    #[error("Field `{entity}.{field}` is declared more than once.")]
    DuplicateField { entity: String, field: String },

    #[error("Field `{entity}.{field}` is both denied and required for {operation}.")]
    ConflictingPermissions {
        entity: String,
        field: String,
        operation: String,
    },

    #[error("Field `{entity}.{field}` lists `{nested}` in its nested fields, but `{target}` has no such field.")]
    UnknownNestedField {
        entity: String,
        field: String,
        target: String,
        nested: String,
    },

    #[error("Field `{entity}.{field}` closes a cycle of eager references through `{target}`, use a lazy reference.")]
    EagerCycle {
        entity: String,
        field: String,
        target: String,
    },

    #[error("Unknown scalar type `{0}`.")]
    UnknownScalar(String),
}
