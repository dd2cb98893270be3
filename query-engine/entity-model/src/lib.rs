#![deny(unsafe_code, rust_2018_idioms)]

mod data_model;
mod entity;
mod error;
mod field;
mod operation;

pub mod filter;
pub mod permission;

pub use data_model::{DataModel, DataModelBuilder, DataModelRef};
pub use entity::{EntityRef, EntitySpec};
pub use error::ConfigurationError;
pub use field::{Arity, FieldSpec, ScalarKind, UniqueStrategy, ValueKind};
pub use field_value::{FieldObject, FieldValue};
pub use operation::{Operation, OperationHint};
pub use permission::{Permission, PermissionSet, Permissions};

/// Name of the identity field every entity is addressed by.
pub const ID_FIELD: &str = "id";

pub type Result<T> = std::result::Result<T, ConfigurationError>;
