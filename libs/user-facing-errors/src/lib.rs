#![deny(unsafe_code, rust_2018_idioms)]

pub mod fieldgate;

use serde::Serialize;
use std::borrow::Cow;

pub trait UserFacingError: Serialize {
    const ERROR_CODE: &'static str;

    fn message(&self) -> String;
}

#[derive(Serialize, PartialEq, Debug, Clone)]
pub struct KnownError {
    pub message: String,
    pub meta: serde_json::Value,
    pub error_code: Cow<'static, str>,
}

impl KnownError {
    pub fn new<T: UserFacingError>(inner: T) -> KnownError {
        let meta = serde_json::to_value(&inner).unwrap_or_else(|err| {
            tracing::warn!("Failed to render user facing error metadata to JSON: {err}");
            serde_json::Value::Null
        });

        KnownError {
            message: inner.message(),
            meta,
            error_code: Cow::from(T::ERROR_CODE),
        }
    }
}

#[derive(Serialize, PartialEq, Debug, Clone)]
pub struct UnknownError {
    pub message: String,
}

#[derive(Serialize, PartialEq, Debug, Clone)]
#[serde(untagged)]
enum ErrorType {
    Known(KnownError),
    Unknown(UnknownError),
}

/// The envelope surfaced to clients for every failure of the engine.
#[derive(Serialize, PartialEq, Debug, Clone)]
pub struct Error {
    #[serde(flatten)]
    inner: ErrorType,
}

impl Error {
    pub fn new_known(err: KnownError) -> Self {
        Error {
            inner: ErrorType::Known(err),
        }
    }

    pub fn new_non_user_facing(message: impl ToString) -> Self {
        Error {
            inner: ErrorType::Unknown(UnknownError {
                message: message.to_string(),
            }),
        }
    }

    pub fn as_known(&self) -> Option<&KnownError> {
        match &self.inner {
            ErrorType::Known(err) => Some(err),
            ErrorType::Unknown(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match &self.inner {
            ErrorType::Known(err) => &err.message,
            ErrorType::Unknown(err) => &err.message,
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        self.as_known().map(|err| err.error_code.as_ref())
    }
}

impl From<KnownError> for Error {
    fn from(known: KnownError) -> Self {
        Error::new_known(known)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldgate::PermissionDenied;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn known_errors_render_code_message_and_meta() {
        let err = Error::from(KnownError::new(PermissionDenied {
            entity: "User".to_owned(),
            field: "password".to_owned(),
            operation: "read".to_owned(),
        }));

        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "message": "Field `User.password` is not permitted for the read operation.",
                "meta": { "entity": "User", "field": "password", "operation": "read" },
                "error_code": "FG2000",
            })
        );
    }

    #[test]
    fn unknown_errors_only_carry_a_message() {
        let err = Error::new_non_user_facing("boom");

        assert_eq!(err.error_code(), None);
        assert_eq!(serde_json::to_value(&err).unwrap(), json!({ "message": "boom" }));
    }
}
