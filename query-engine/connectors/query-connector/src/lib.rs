#![deny(unsafe_code, rust_2018_idioms)]

pub mod error;

mod interface;
mod record;

pub use interface::*;
pub use record::*;

pub type Result<T> = std::result::Result<T, error::ConnectorError>;
