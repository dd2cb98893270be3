use tracing::dispatcher::SetGlobalDefaultError;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, EnvFilter, Layer};

type LoggerResult<T> = Result<T, SetGlobalDefaultError>;

const DEFAULT_DIRECTIVES: &[&str] = &["fieldgate=info", "query_core=info", "schema=info"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl From<&str> for LogFormat {
    fn from(s: &str) -> Self {
        match s {
            "text" => Self::Text,
            _ => Self::Json,
        }
    }
}

/// An installer for a global logger.
#[derive(Debug, Clone)]
pub struct Logger {
    service_name: &'static str,
    log_format: LogFormat,
}

impl Logger {
    /// Initialize a new global logger installer.
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            log_format: LogFormat::Json,
        }
    }

    /// Sets the STDERR log output format. Default: Json.
    pub fn log_format(&mut self, log_format: LogFormat) {
        self.log_format = log_format;
    }

    /// Install logger as a global. Can be called only once per application instance.
    pub fn install(&self) -> LoggerResult<()> {
        let filter = create_env_filter();

        let fmt_layer = match self.log_format {
            LogFormat::Text => tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter)
                .boxed(),
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(filter)
                .boxed(),
        };

        let subscriber = tracing_subscriber::registry().with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;

        tracing::debug!(service = self.service_name, "logger installed");

        Ok(())
    }
}

/// `RUST_LOG` wins over the defaults when it is set.
fn create_env_filter() -> EnvFilter {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return EnvFilter::from_default_env();
    }

    DEFAULT_DIRECTIVES
        .iter()
        .filter_map(|directive| directive.parse().ok())
        .fold(EnvFilter::default().add_directive(LevelFilter::WARN.into()), |filter, directive| {
            filter.add_directive(directive)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_formats_fall_back_to_json() {
        assert_eq!(LogFormat::from("text"), LogFormat::Text);
        assert_eq!(LogFormat::from("json"), LogFormat::Json);
        assert_eq!(LogFormat::from("yaml"), LogFormat::Json);
    }
}
