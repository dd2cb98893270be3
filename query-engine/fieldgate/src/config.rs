//! The `fieldgate.toml` entity declarations.
//!
//! ```toml
//! [schema]
//! filter_profile = "standard"
//!
//! [[entities]]
//! name = "User"
//!
//! [[entities.fields]]
//! name = "username"
//! kind = "string"
//! unique_with = "append_index"
//! permissions = { create = ["require", "unique"], update = "unique" }
//! ```

use crate::{FieldgateError, FieldgateResult};
use entity_model::{
    ConfigurationError, DataModel, FieldSpec, Operation, Permission, PermissionSet, ScalarKind, UniqueStrategy, ValueKind,
};
use schema::SchemaConfig;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldgateConfig {
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityConfig {
    pub name: String,
    /// Name of the backing store model. Defaults to the entity name.
    pub store_model: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub name: String,
    /// Scalar kind, e.g. `string` or `datetime`.
    pub kind: Option<String>,
    /// Referenced entity.
    pub target: Option<String>,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub lazy: bool,
    #[serde(default)]
    pub permissions: PermissionsConfig,
    pub unique_with: Option<UniqueStrategy>,
    #[serde(default)]
    pub allow_nested_write: bool,
    pub nested_fields: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionsConfig {
    pub create: Option<PermissionConfig>,
    pub read: Option<PermissionConfig>,
    pub update: Option<PermissionConfig>,
    pub delete: Option<PermissionConfig>,
}

/// A single permission or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PermissionConfig {
    One(Permission),
    Many(Vec<Permission>),
}

impl PermissionConfig {
    fn to_set(&self) -> PermissionSet {
        match self {
            PermissionConfig::One(permission) => PermissionSet::from(*permission),
            PermissionConfig::Many(permissions) => permissions.iter().copied().collect(),
        }
    }
}

impl PermissionsConfig {
    fn iter(&self) -> impl Iterator<Item = (Operation, &PermissionConfig)> + '_ {
        [
            (Operation::Create, &self.create),
            (Operation::Read, &self.read),
            (Operation::Update, &self.update),
            (Operation::Delete, &self.delete),
        ]
        .into_iter()
        .filter_map(|(op, permission)| permission.as_ref().map(|p| (op, p)))
    }
}

impl FieldgateConfig {
    pub fn load(path: &Path) -> FieldgateResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| FieldgateError::IOError {
            path: path.to_owned(),
            source,
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> FieldgateResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Declares every entity before defining any, so fields may reference entities declared
    /// further down the file.
    #[tracing::instrument(skip(self), fields(entities = self.entities.len()))]
    pub fn data_model(&self) -> Result<DataModel, ConfigurationError> {
        let mut builder = DataModel::builder();

        for entity in &self.entities {
            builder.declare(&entity.name, entity.store_model.as_deref().unwrap_or(&entity.name))?;
        }

        for entity in &self.entities {
            let fields = entity
                .fields
                .iter()
                .map(|field| field.to_spec(&entity.name))
                .collect::<Result<Vec<_>, _>>()?;

            builder.define(&entity.name, fields)?;
        }

        builder.build()
    }
}

impl FieldConfig {
    fn to_spec(&self, entity: &str) -> Result<FieldSpec, ConfigurationError> {
        let scalar = self.kind.as_deref().map(str::parse::<ScalarKind>).transpose()?;
        let kind = ValueKind::from_parts(entity, &self.name, scalar, self.target.as_deref(), self.lazy)?;

        let mut spec = FieldSpec::new(&self.name, kind);

        if self.list {
            spec = spec.list();
        }

        for (op, permission) in self.permissions.iter() {
            spec = spec.with(op, permission.to_set());
        }

        if let Some(strategy) = &self.unique_with {
            spec = spec.unique_with(strategy.clone());
        }

        if self.allow_nested_write {
            spec = spec.nested_write();
        }

        if let Some(nested) = &self.nested_fields {
            spec = spec.nested_fields(nested.iter().cloned());
        }

        Ok(spec)
    }
}
