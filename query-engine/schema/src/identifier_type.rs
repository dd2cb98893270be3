use crate::capitalize;
use entity_model::Operation;
use std::fmt;

/// Chain of enclosing entity names, innermost first.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Default, PartialOrd, Ord)]
pub struct AncestryPath(Vec<String>);

impl AncestryPath {
    pub fn root() -> Self {
        AncestryPath(Vec::new())
    }

    /// The ancestry seen from a type nested directly inside `entity`.
    pub fn enclosed_by(&self, entity: &str) -> Self {
        let mut names = Vec::with_capacity(self.0.len() + 1);
        names.push(entity.to_owned());
        names.extend(self.0.iter().cloned());

        AncestryPath(names)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for AncestryPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        AncestryPath(iter.into_iter().map(Into::into).collect())
    }
}

/// Structural identity of a generated type.
///
/// Two requests for the same entity and operation from different ancestry paths yield
/// distinct identities, and thereby distinct type names.
#[derive(PartialEq, Eq, Hash, Debug, Clone, PartialOrd, Ord)]
pub struct TypeIdentity {
    pub entity: String,
    pub operation: Operation,
    pub ancestry: AncestryPath,
}

impl TypeIdentity {
    pub fn new(entity: impl Into<String>, operation: Operation, ancestry: AncestryPath) -> Self {
        TypeIdentity {
            entity: entity.into(),
            operation,
            ancestry,
        }
    }

    pub fn root(entity: impl Into<String>, operation: Operation) -> Self {
        Self::new(entity, operation, AncestryPath::root())
    }

    pub fn is_root(&self) -> bool {
        self.ancestry.is_root()
    }

    /// Whether values of this type are client input.
    pub fn is_input(&self) -> bool {
        !(self.is_root() && self.operation == Operation::Read)
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entity = capitalize(self.entity.as_str());
        let operation = capitalize(self.operation.as_str());

        if self.is_root() {
            return match self.operation {
                Operation::Read => write!(f, "{entity}Type"),
                _ => write!(f, "{entity}{operation}InputType"),
            };
        }

        f.write_str(&entity)?;

        for ancestor in self.ancestry.names() {
            write!(f, "Of{}", capitalize(ancestor.as_str()))?;
        }

        write!(f, "Related{operation}InputType")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn root_names() {
        assert_eq!(TypeIdentity::root("User", Operation::Read).to_string(), "UserType");
        assert_eq!(TypeIdentity::root("User", Operation::Create).to_string(), "UserCreateInputType");
        assert_eq!(TypeIdentity::root("User", Operation::Update).to_string(), "UserUpdateInputType");
    }

    #[test]
    fn nested_names_carry_the_ancestry() {
        let ancestry = AncestryPath::root().enclosed_by("Foo").enclosed_by("User");
        let identity = TypeIdentity::new("Group", Operation::Read, ancestry);

        assert_eq!(identity.to_string(), "GroupOfUserOfFooRelatedReadInputType");
        assert!(identity.is_input());
    }

    #[test]
    fn same_entity_from_different_ancestry_is_distinct() {
        let a = TypeIdentity::new("Group", Operation::Create, AncestryPath::from_iter(["User"]));
        let b = TypeIdentity::new("Group", Operation::Create, AncestryPath::from_iter(["Foo"]));

        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }
}
