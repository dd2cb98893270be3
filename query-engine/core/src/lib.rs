#![deny(unsafe_code, rust_2018_idioms)]

pub mod compiler;
pub mod executor;
pub mod upsert;
pub mod write;

mod error;

pub use compiler::{CompileError, QueryCompiler};
pub use error::*;
pub use executor::{execute, Outcome, Terminal};
pub use upsert::{plan_upsert, UpsertError, UpsertPlan};
pub use write::{ScopeInstancesConfig, UpsertExecutor, ViolationKind, WriteError};

pub type CoreResult<T> = std::result::Result<T, CoreError>;
