use entity_model::Operation;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Entity `{0}` is not part of the schema.")]
    UnknownEntity(String),

    #[error("`{argument}` is not a filter argument of `{entity}`.")]
    UnknownArgument { entity: String, argument: String },

    #[error("`{field}` cannot be selected on `{type_name}`.")]
    UnknownField { type_name: String, field: String },

    #[error("`{field}` of `{entity}` is excluded from read projections.")]
    NotProjected { entity: String, field: String },

    #[error("`{field}` of `{type_name}` is a scalar and takes no selection.")]
    ScalarSelection { type_name: String, field: String },

    #[error("A {0} is not a write and has no mutation document.")]
    NotAWrite(Operation),

    #[error("`{0}` has no literal form.")]
    UnsupportedLiteral(String),

    #[error("Invalid document: {0}")]
    Parse(String),
}
