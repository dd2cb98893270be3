use crate::{FilterArgumentMap, TypeIdentity};
use entity_model::ScalarKind;
use std::fmt;

/// Index of an object type inside its [`QuerySchema`](crate::QuerySchema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectTypeId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Scalar(ScalarKind),
    Object(TypeIdentity),
    List(Box<TypeRef>),
    /// Two-element list, as taken by `range`.
    Pair(Box<TypeRef>),
}

impl TypeRef {
    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    pub fn pair(inner: TypeRef) -> Self {
        TypeRef::Pair(Box::new(inner))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, TypeRef::List(_) | TypeRef::Pair(_))
    }

    /// The object type at the bottom of any list modifiers.
    pub fn as_object(&self) -> Option<&TypeIdentity> {
        match self {
            TypeRef::Object(identity) => Some(identity),
            TypeRef::List(inner) | TypeRef::Pair(inner) => inner.as_object(),
            TypeRef::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<ScalarKind> {
        match self {
            TypeRef::Scalar(kind) => Some(*kind),
            TypeRef::List(inner) | TypeRef::Pair(inner) => inner.as_scalar(),
            TypeRef::Object(_) => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(kind) => f.write_str(kind.type_name()),
            TypeRef::Object(identity) => write!(f, "{identity}"),
            TypeRef::List(inner) | TypeRef::Pair(inner) => write!(f, "[{inner}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeField {
    /// Internal field name, as declared on the entity.
    pub name: String,
    pub field_type: TypeRef,
    pub is_required: bool,
}

impl TypeField {
    pub fn new(name: impl Into<String>, field_type: TypeRef) -> Self {
        TypeField {
            name: name.into(),
            field_type,
            is_required: false,
        }
    }

    pub fn required(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }

    /// Type name with the non-null marker when required.
    pub fn type_signature(&self) -> String {
        if self.is_required {
            format!("{}!", self.field_type)
        } else {
            self.field_type.to_string()
        }
    }
}

/// A generated read or input type.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub identity: TypeIdentity,
    pub fields: Vec<TypeField>,
    /// Filter arguments, only populated for nested read input types.
    pub filters: FilterArgumentMap,
}

impl ObjectType {
    pub(crate) fn skeleton(identity: TypeIdentity) -> Self {
        ObjectType {
            identity,
            fields: Vec::new(),
            filters: FilterArgumentMap::new(),
        }
    }

    pub fn name(&self) -> String {
        self.identity.to_string()
    }

    pub fn find_field(&self, name: &str) -> Option<&TypeField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn is_input(&self) -> bool {
        self.identity.is_input()
    }
}
