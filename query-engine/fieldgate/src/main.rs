#![deny(unsafe_code, rust_2018_idioms)]

mod cli;
mod config;
mod error;
mod features;
mod logger;
mod opt;

use crate::{cli::CliCommand, error::FieldgateError, logger::Logger, opt::FieldgateOpt};
use std::process;
use structopt::StructOpt;

pub type FieldgateResult<T> = std::result::Result<T, FieldgateError>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = FieldgateOpt::from_args();

    let mut logger = Logger::new("fieldgate");
    logger.log_format(opts.log_format());
    logger.install()?;

    let result = match CliCommand::from_opt(&opts) {
        Ok(command) => command.execute(&opts).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(err) => {
            tracing::error!("Encountered error during execution: {err}");
            err.render_as_json()?;
            process::exit(1);
        }
    }
}
