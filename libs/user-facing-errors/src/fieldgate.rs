use crate::UserFacingError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct InvalidConfiguration {
    pub details: String,
}

impl UserFacingError for InvalidConfiguration {
    const ERROR_CODE: &'static str = "FG1000";

    fn message(&self) -> String {
        format!("The entity configuration is invalid: {}", self.details)
    }
}

#[derive(Debug, Serialize)]
pub struct MissingUniqueMatch {
    pub entity: String,
}

impl UserFacingError for MissingUniqueMatch {
    const ERROR_CODE: &'static str = "FG1001";

    fn message(&self) -> String {
        format!(
            "Cannot update or create `{}` without an id or a value for a field declared unique.",
            self.entity
        )
    }
}

#[derive(Debug, Serialize)]
pub struct PermissionDenied {
    pub entity: String,
    pub field: String,
    pub operation: String,
}

impl UserFacingError for PermissionDenied {
    const ERROR_CODE: &'static str = "FG2000";

    fn message(&self) -> String {
        format!(
            "Field `{}.{}` is not permitted for the {} operation.",
            self.entity, self.field, self.operation
        )
    }
}

#[derive(Debug, Serialize)]
pub struct MissingRequiredField {
    pub entity: String,
    pub field: String,
    pub operation: String,
}

impl UserFacingError for MissingRequiredField {
    const ERROR_CODE: &'static str = "FG2001";

    fn message(&self) -> String {
        format!(
            "Field `{}.{}` is required for the {} operation.",
            self.entity, self.field, self.operation
        )
    }
}

#[derive(Debug, Serialize)]
pub struct UniquenessExhausted {
    pub entity: String,
    pub field: String,
    pub value: String,
    pub existing: Vec<String>,
}

impl UserFacingError for UniquenessExhausted {
    const ERROR_CODE: &'static str = "FG2002";

    fn message(&self) -> String {
        format!(
            "Could not generate a unique value for `{}.{}` from `{}`. The following matching ones exist: {}",
            self.entity,
            self.field,
            self.value,
            self.existing.join(", ")
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ScopeIntegrityViolation {
    pub entity: String,
    pub requested_ids: Vec<String>,
    pub found_ids: Vec<String>,
}

impl UserFacingError for ScopeIntegrityViolation {
    const ERROR_CODE: &'static str = "FG2003";

    fn message(&self) -> String {
        let found = if self.found_ids.is_empty() {
            "None".to_owned()
        } else {
            self.found_ids.join(", ")
        };

        format!(
            "Some `{}` ids among ids:[{}] do not exist. Found the following instances: {}",
            self.entity,
            self.requested_ids.join(", "),
            found
        )
    }
}

#[derive(Debug, Serialize)]
pub struct UnsupportedPredicate {
    pub entity: String,
    pub argument: String,
    pub reason: String,
}

impl UserFacingError for UnsupportedPredicate {
    const ERROR_CODE: &'static str = "FG2004";

    fn message(&self) -> String {
        format!(
            "The filter argument `{}` on `{}` cannot be compiled: {}",
            self.argument, self.entity, self.reason
        )
    }
}

#[derive(Debug, Serialize)]
pub struct MissingReferenceId {
    pub entity: String,
    pub field: String,
}

impl UserFacingError for MissingReferenceId {
    const ERROR_CODE: &'static str = "FG2005";

    fn message(&self) -> String {
        format!(
            "The reference `{}.{}` must be given as an id or an object with an id.",
            self.entity, self.field
        )
    }
}
