use document_builder::DocumentError;
use entity_model::ConfigurationError;
use query_connector::error::ConnectorError;
use query_core::CoreError;
use schema::SchemaError;
use std::path::PathBuf;
use thiserror::Error;
use user_facing_errors::{fieldgate::InvalidConfiguration, KnownError};

#[derive(Debug, Error)]
pub enum FieldgateError {
    #[error("Could not read `{}`: {source}", path.display())]
    IOError { path: PathBuf, source: std::io::Error },

    #[error("Invalid configuration file: {0}")]
    ConfigSyntaxError(#[from] toml::de::Error),

    #[error("{0}")]
    ConfigurationError(#[from] ConfigurationError),

    #[error("{0}")]
    SchemaError(#[from] SchemaError),

    #[error("{0}")]
    CoreError(#[from] CoreError),

    #[error("{0}")]
    DocumentError(#[from] DocumentError),

    #[error("{0}")]
    ConnectorError(#[from] ConnectorError),

    #[error("Entity `{0}` is not part of the data model.")]
    UnknownEntity(String),

    #[error("{0}")]
    InvocationError(String),
}

impl FieldgateError {
    pub(crate) fn invocation(message: impl Into<String>) -> Self {
        FieldgateError::InvocationError(message.into())
    }

    pub(crate) fn into_user_facing(self) -> user_facing_errors::Error {
        match self {
            FieldgateError::CoreError(err) => err.into(),
            FieldgateError::ConnectorError(ConnectorError {
                user_facing_error: Some(err),
                ..
            }) => err.into(),
            err @ (FieldgateError::ConfigSyntaxError(_)
            | FieldgateError::ConfigurationError(_)
            | FieldgateError::SchemaError(_)) => KnownError::new(InvalidConfiguration {
                details: err.to_string(),
            })
            .into(),
            other => user_facing_errors::Error::new_non_user_facing(other),
        }
    }

    /// Writes the error envelope to stderr as a single line of JSON.
    pub(crate) fn render_as_json(self) -> Result<(), anyhow::Error> {
        use std::io::Write as _;

        let error = self.into_user_facing();

        let stderr = std::io::stderr();
        let locked_stderr = stderr.lock();
        let mut writer = std::io::LineWriter::new(locked_stderr);
        serde_json::to_writer(&mut writer, &error)?;
        writeln!(&mut writer)?;
        writer.flush()?;

        Ok(())
    }
}
