#![deny(rust_2018_idioms, unsafe_code)]

mod build;
mod config;
mod error;
mod filter_arguments;
mod identifier_type;
mod query_schema;
mod types;
mod utils;

pub use build::build;
pub use config::*;
pub use error::*;
pub use filter_arguments::*;
pub use identifier_type::*;
pub use query_schema::*;
pub use types::*;
pub use utils::*;

use std::sync::Arc;

pub type QuerySchemaRef = Arc<QuerySchema>;
