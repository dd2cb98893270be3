use crate::{ConfigurationError, Operation, Permission, PermissionSet, Permissions};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Primitive kinds a scalar field maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Int,
    Float,
    Boolean,
    Date,
    DateTime,
    Time,
    Decimal,
    Uuid,
    /// Opaque structured document, matched by partial structure.
    Document,
    Geometry,
}

impl ScalarKind {
    /// Name of the primitive in generated types.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Int => "Int",
            ScalarKind::Float => "Float",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Date => "Date",
            ScalarKind::DateTime => "DateTime",
            ScalarKind::Time => "Time",
            ScalarKind::Decimal => "Decimal",
            ScalarKind::Uuid => "UUID",
            ScalarKind::Document => "JSONString",
            ScalarKind::Geometry => "Geometry",
        }
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, ScalarKind::Date | ScalarKind::DateTime | ScalarKind::Time)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ScalarKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "string" => ScalarKind::String,
            "int" => ScalarKind::Int,
            "float" => ScalarKind::Float,
            "boolean" | "bool" => ScalarKind::Boolean,
            "date" => ScalarKind::Date,
            "datetime" => ScalarKind::DateTime,
            "time" => ScalarKind::Time,
            "decimal" => ScalarKind::Decimal,
            "uuid" => ScalarKind::Uuid,
            "document" | "json" => ScalarKind::Document,
            "geometry" => ScalarKind::Geometry,
            _ => return Err(ConfigurationError::UnknownScalar(s.to_owned())),
        };

        Ok(kind)
    }
}

/// What a field holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar(ScalarKind),
    /// Reference to a registered entity, resolved while building.
    NestedRef(String),
    /// Reference to a registered entity, resolved after every entity is declared.
    /// Used to break cycles in self-referential graphs.
    LazyRef(String),
}

impl ValueKind {
    /// Derives the kind from the loose parts of a declaration.
    pub fn from_parts(
        entity: &str,
        field: &str,
        scalar: Option<ScalarKind>,
        target: Option<&str>,
        lazy: bool,
    ) -> crate::Result<ValueKind> {
        match (scalar, target) {
            (_, Some(target)) if lazy => Ok(ValueKind::LazyRef(target.to_owned())),
            (_, Some(target)) => Ok(ValueKind::NestedRef(target.to_owned())),
            (Some(kind), None) => Ok(ValueKind::Scalar(kind)),
            (None, None) => Err(ConfigurationError::MissingType {
                entity: entity.to_owned(),
                field: field.to_owned(),
            }),
        }
    }

    pub fn as_scalar(&self) -> Option<ScalarKind> {
        match self {
            ValueKind::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            ValueKind::NestedRef(target) | ValueKind::LazyRef(target) => Some(target),
            ValueKind::Scalar(_) => None,
        }
    }

    pub fn is_entity_ref(&self) -> bool {
        self.target().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Arity {
    #[default]
    Single,
    List,
}

/// Strategy for deriving a free value of a unique field from a taken one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueStrategy {
    /// `value` becomes `value{index + 1}`.
    #[default]
    AppendIndex,
    /// Template with `{value}` and `{index}` placeholders, `{index}` starting at 1.
    Template(String),
}

impl UniqueStrategy {
    pub fn attempt(&self, value: &str, index: usize) -> String {
        match self {
            UniqueStrategy::AppendIndex => format!("{value}{}", index + 1),
            UniqueStrategy::Template(template) => template
                .replace("{value}", value)
                .replace("{index}", &(index + 1).to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: ValueKind,
    pub arity: Arity,
    pub permissions: Permissions,
    pub unique_with: Option<UniqueStrategy>,
    /// Nested field allowed in nested create and update inputs next to the identity.
    pub allow_nested_write: bool,
    /// Restricts the nested read projection of an entity reference.
    pub nested_fields: Option<Vec<String>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        FieldSpec {
            name: name.into(),
            kind,
            arity: Arity::Single,
            permissions: Permissions::default(),
            unique_with: None,
            allow_nested_write: false,
            nested_fields: None,
        }
    }

    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, ValueKind::Scalar(kind))
    }

    pub fn nested(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, ValueKind::NestedRef(target.into()))
    }

    pub fn lazy(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, ValueKind::LazyRef(target.into()))
    }

    pub fn list(mut self) -> Self {
        self.arity = Arity::List;
        self
    }

    pub fn with(mut self, op: Operation, permission: impl Into<PermissionSet>) -> Self {
        self.permissions.insert(op, permission);
        self
    }

    pub fn deny(self, op: Operation) -> Self {
        self.with(op, Permission::Deny)
    }

    pub fn require(self, op: Operation) -> Self {
        self.with(op, Permission::Require)
    }

    pub fn ignore(self, op: Operation) -> Self {
        self.with(op, Permission::Ignore)
    }

    /// Marks the field as the primary identity.
    pub fn primary(self) -> Self {
        self.with(Operation::Read, Permission::Primary)
    }

    /// Marks the field as globally unique.
    pub fn unique(self) -> Self {
        self.with(Operation::Create, Permission::Unique)
            .with(Operation::Update, Permission::Unique)
    }

    pub fn unique_with(mut self, strategy: UniqueStrategy) -> Self {
        self.unique_with = Some(strategy);
        self
    }

    pub fn nested_write(mut self) -> Self {
        self.allow_nested_write = true;
        self
    }

    pub fn nested_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nested_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_list(&self) -> bool {
        self.arity == Arity::List
    }

    pub fn is_to_many(&self) -> bool {
        self.kind.is_entity_ref() && self.is_list()
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        self.kind.as_scalar()
    }

    pub fn is_document(&self) -> bool {
        self.scalar_kind() == Some(ScalarKind::Document)
    }

    /// Name of the foreign key column an entity reference is stored under.
    pub fn foreign_key(&self) -> String {
        format!("{}_id", self.name)
    }
}
