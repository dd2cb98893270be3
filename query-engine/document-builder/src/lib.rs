//! Rendering of textual query and mutation documents against a generated query schema, and
//! parsing of such documents back into plain values.

#![deny(unsafe_code, rust_2018_idioms)]

mod error;
mod literal;
mod mutation;
mod parse;
mod projection;
mod query;
mod render;

pub use error::DocumentError;
pub use literal::render_literal;
pub use mutation::MutationDocument;
pub use parse::{parse_document, parse_value, ArgumentValue, OperationKind, ParsedDocument, ParsedField};
pub use projection::{Projection, Selection};
pub use query::QueryDocument;

use heck::ToLowerCamelCase;

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

/// Name of a field or argument on the wire. Internal names keep their casing everywhere else.
pub fn wire_name(name: &str) -> String {
    name.to_lower_camel_case()
}
