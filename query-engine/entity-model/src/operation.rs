use crate::ID_FIELD;
use field_value::FieldObject;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [Operation::Create, Operation::Read, Operation::Update, Operation::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Operation::Create | Operation::Update)
    }

    /// Guesses whether a write payload is meant to create or update.
    ///
    /// Presence of the identity key means update. This misclassifies creates that supply
    /// their own identity, so callers should tag the operation explicitly when they can.
    pub fn guess(values: &FieldObject) -> Operation {
        match values.get(ID_FIELD) {
            Some(id) if !id.is_null() => Operation::Update,
            _ => Operation::Create,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a write operation is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationHint {
    Explicit(Operation),
    #[default]
    Guess,
}

impl OperationHint {
    pub fn resolve(self, values: &FieldObject) -> Operation {
        match self {
            OperationHint::Explicit(op) => op,
            OperationHint::Guess => Operation::guess(values),
        }
    }
}

impl From<Operation> for OperationHint {
    fn from(op: Operation) -> Self {
        OperationHint::Explicit(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_value::FieldValue;
    use pretty_assertions::assert_eq;

    fn object(pairs: &[(&str, FieldValue)]) -> FieldObject {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn identity_means_update() {
        assert_eq!(Operation::guess(&object(&[("id", 7.into())])), Operation::Update);
        assert_eq!(Operation::guess(&object(&[("id", FieldValue::Null)])), Operation::Create);
        assert_eq!(Operation::guess(&object(&[("email", "a@x.com".into())])), Operation::Create);
    }

    #[test]
    fn explicit_hint_wins_over_guess() {
        let values = object(&[("id", 7.into())]);

        assert_eq!(OperationHint::from(Operation::Create).resolve(&values), Operation::Create);
        assert_eq!(OperationHint::Guess.resolve(&values), Operation::Update);
    }
}
