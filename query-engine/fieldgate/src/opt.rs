use crate::logger::LogFormat;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt, Clone)]
#[structopt(name = "fieldgate", about = "Permission-aware types, filters and request documents for entity graphs.")]
pub struct FieldgateOpt {
    /// Path to the entity declarations.
    #[structopt(long, short = "c", env = "FIELDGATE_CONFIG", default_value = "fieldgate.toml", parse(from_os_str))]
    pub config: PathBuf,

    /// Set the log format. Either `json` or `text`.
    #[structopt(long = "log-format", env = "FIELDGATE_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Expands every filter operator, whatever the configured profile.
    #[structopt(long = "extended-filters")]
    pub extended_filters: bool,

    /// Fails on selected fields the read type does not expose instead of skipping them.
    #[structopt(long = "strict-projection")]
    pub strict_projection: bool,

    #[structopt(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(Debug, StructOpt, Clone)]
pub enum Subcommand {
    /// Print every generated type with its fields.
    Types,
    /// Print the filter arguments of an entity.
    Filters {
        entity: String,
    },
    /// Render a query document for an entity.
    Query(QueryInput),
    /// Render an update-or-create mutation document.
    Mutation(MutationInput),
    /// Split a write payload into its unique match and defaults.
    Plan {
        entity: String,
        /// The write payload as a JSON object.
        #[structopt(long)]
        data: String,
    },
}

#[derive(Debug, StructOpt, Clone)]
pub struct QueryInput {
    pub entity: String,
    /// Name of the query field. Defaults to the entity name in lower camel case.
    #[structopt(long)]
    pub name: Option<String>,
    /// Selected field, dot separated for nested fields. Repeatable.
    #[structopt(long = "field")]
    pub fields: Vec<String>,
    /// Filter argument as `key=value`. The value is a literal, bare words are strings.
    #[structopt(long = "arg", parse(try_from_str = parse_argument))]
    pub arguments: Vec<(String, String)>,
    /// Print the compiled predicate sets instead of the document.
    #[structopt(long)]
    pub explain: bool,
    /// JSON file of records keyed by entity. The query is executed against them.
    #[structopt(long, parse(from_os_str))]
    pub records: Option<PathBuf>,
}

#[derive(Debug, StructOpt, Clone)]
pub struct MutationInput {
    pub entity: String,
    /// The write payload as a JSON object.
    #[structopt(long)]
    pub data: String,
    /// `create` or `update`. Guessed from the presence of an id when omitted.
    #[structopt(long)]
    pub operation: Option<String>,
    /// Selected field of the returned record. Repeatable.
    #[structopt(long = "field")]
    pub fields: Vec<String>,
}

impl FieldgateOpt {
    pub fn log_format(&self) -> LogFormat {
        self.log_format
            .as_deref()
            .map(LogFormat::from)
            .unwrap_or(LogFormat::Text)
    }
}

fn parse_argument(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_owned(), value.to_owned())),
        _ => Err(format!("Expected `key=value`, got `{s}`.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn arguments_split_on_the_first_equals_sign() {
        assert_eq!(
            parse_argument("username=a=b").unwrap(),
            ("username".to_owned(), "a=b".to_owned())
        );
        assert!(parse_argument("username").is_err());
        assert!(parse_argument("=ann").is_err());
    }

    #[test]
    fn query_options_are_repeatable() {
        let opts = FieldgateOpt::from_iter_safe([
            "fieldgate",
            "--log-format",
            "json",
            "query",
            "User",
            "--field",
            "username",
            "--field",
            "group.name",
            "--arg",
            "username_startswith=a",
        ])
        .unwrap();

        assert_eq!(opts.log_format(), LogFormat::Json);

        let Subcommand::Query(input) = opts.subcommand else {
            panic!("expected a query subcommand");
        };

        assert_eq!(input.entity, "User");
        assert_eq!(input.fields, vec!["username", "group.name"]);
        assert_eq!(input.arguments, vec![("username_startswith".to_owned(), "a".to_owned())]);
        assert!(!input.explain);
    }
}
