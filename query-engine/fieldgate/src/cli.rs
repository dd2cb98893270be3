use crate::{
    config::FieldgateConfig,
    features::{EnabledFeatures, Feature},
    opt::{FieldgateOpt, MutationInput, QueryInput, Subcommand},
    FieldgateError, FieldgateResult,
};
use document_builder::{parse_value, wire_name, MutationDocument, Projection, QueryDocument};
use entity_model::{permission, EntitySpec, FieldObject, FieldValue, Operation, OperationHint};
use memory_connector::MemoryStore;
use query_core::{execute, plan_upsert, write::validate_input, CoreError, QueryCompiler, Terminal};
use schema::{FilterProfile, ObjectType, QuerySchema};
use serde::Serialize;
use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

pub struct QueryRequest {
    entity: String,
    name: Option<String>,
    fields: Vec<String>,
    arguments: FieldObject,
    explain: bool,
    records: Option<PathBuf>,
}

pub struct MutationRequest {
    entity: String,
    hint: OperationHint,
    values: FieldObject,
    fields: Vec<String>,
}

pub enum CliCommand {
    Types,
    Filters(String),
    Query(QueryRequest),
    Mutation(MutationRequest),
    Plan { entity: String, values: FieldObject },
}

impl CliCommand {
    pub fn from_opt(opts: &FieldgateOpt) -> FieldgateResult<CliCommand> {
        let command = match &opts.subcommand {
            Subcommand::Types => CliCommand::Types,
            Subcommand::Filters { entity } => CliCommand::Filters(entity.clone()),
            Subcommand::Query(input) => CliCommand::Query(QueryRequest::try_from(input)?),
            Subcommand::Mutation(input) => CliCommand::Mutation(MutationRequest::try_from(input)?),
            Subcommand::Plan { entity, data } => CliCommand::Plan {
                entity: entity.clone(),
                values: parse_payload(data)?,
            },
        };

        Ok(command)
    }

    pub async fn execute(self, opts: &FieldgateOpt) -> FieldgateResult<String> {
        let config = FieldgateConfig::load(&opts.config)?;
        self.execute_with(&config, EnabledFeatures::from(opts)).await
    }

    #[tracing::instrument(name = "cli_command", skip_all)]
    pub async fn execute_with(self, config: &FieldgateConfig, features: EnabledFeatures) -> FieldgateResult<String> {
        let schema = load_schema(config, features)?;

        match self {
            CliCommand::Types => Ok(render_types(&schema)),
            CliCommand::Filters(entity) => render_filters(&schema, &entity),
            CliCommand::Query(request) => request.run(&schema, features).await,
            CliCommand::Mutation(request) => request.run(&schema, features),
            CliCommand::Plan { entity, values } => {
                let spec = find_entity(&schema, &entity)?;
                let plan = plan_upsert(spec, &values).map_err(CoreError::from)?;

                to_json(&PlanOutput {
                    unique_match: &plan.unique_match,
                    defaults: &plan.defaults,
                })
            }
        }
    }
}

fn load_schema(config: &FieldgateConfig, features: EnabledFeatures) -> FieldgateResult<QuerySchema> {
    let data_model = Arc::new(config.data_model()?);
    let mut schema_config = config.schema.clone();

    if features.contains(Feature::ExtendedFilters) {
        schema_config.filter_profile = FilterProfile::Extended;
    }

    let schema = schema::build(data_model, schema_config)?;
    tracing::info!(types = schema.types().count(), "query schema built");

    Ok(schema)
}

fn find_entity<'a>(schema: &'a QuerySchema, entity: &str) -> FieldgateResult<&'a EntitySpec> {
    schema
        .find_entity(entity)
        .map(AsRef::as_ref)
        .ok_or_else(|| FieldgateError::UnknownEntity(entity.to_owned()))
}

fn render_types(schema: &QuerySchema) -> String {
    let mut out = String::new();

    for object in schema.types() {
        let keyword = if object.is_input() { "input" } else { "type" };
        let _ = writeln!(out, "{keyword} {} {{", object.name());

        for field in &object.fields {
            let _ = writeln!(out, "  {}: {}", wire_name(&field.name), field.type_signature());
        }

        let _ = writeln!(out, "}}");
    }

    out.trim_end().to_owned()
}

fn render_filters(schema: &QuerySchema, entity: &str) -> FieldgateResult<String> {
    let arguments = schema
        .filter_arguments(entity)
        .ok_or_else(|| FieldgateError::UnknownEntity(entity.to_owned()))?;

    let lines: Vec<String> = arguments
        .values()
        .map(|arg| format!("{}: {}", arg.name, arg.arg_type))
        .collect();

    Ok(lines.join("\n"))
}

impl TryFrom<&QueryInput> for QueryRequest {
    type Error = FieldgateError;

    fn try_from(input: &QueryInput) -> FieldgateResult<Self> {
        let arguments = input
            .arguments
            .iter()
            .map(|(key, value)| (key.clone(), parse_argument_value(value)))
            .collect();

        Ok(QueryRequest {
            entity: input.entity.clone(),
            name: input.name.clone(),
            fields: input.fields.clone(),
            arguments,
            explain: input.explain,
            records: input.records.clone(),
        })
    }
}

impl QueryRequest {
    async fn run(self, schema: &QuerySchema, features: EnabledFeatures) -> FieldgateResult<String> {
        let spec = find_entity(schema, &self.entity)?;

        if self.explain || self.records.is_some() {
            let sets = QueryCompiler::new(schema)
                .compile(spec, &self.arguments)
                .map_err(CoreError::from)?;

            let Some(path) = &self.records else {
                let lines: Vec<String> = sets.iter().map(ToString::to_string).collect();
                return Ok(lines.join("\n"));
            };

            let store = load_records(schema, path).await?;
            let records = execute(&store, spec, &sets, Terminal::Collect).await?.into_records();
            let rows: Vec<FieldObject> = records.into_iter().map(|r| r.into_values()).collect();

            return to_json(&rows);
        }

        let name = self.name.clone().unwrap_or_else(|| wire_name(&self.entity));
        let mut document = QueryDocument::new(schema, &self.entity, name).arguments(self.arguments.clone());

        if let Some(projection) = projection(schema, &self.entity, &self.fields, features)? {
            document = document.projection(projection);
        }

        Ok(document.render()?)
    }
}

impl TryFrom<&MutationInput> for MutationRequest {
    type Error = FieldgateError;

    fn try_from(input: &MutationInput) -> FieldgateResult<Self> {
        let hint = match input.operation.as_deref() {
            None => OperationHint::Guess,
            Some("create") => Operation::Create.into(),
            Some("update") => Operation::Update.into(),
            Some(other) => {
                return Err(FieldgateError::invocation(format!(
                    "Unknown operation `{other}`, expected `create` or `update`."
                )))
            }
        };

        Ok(MutationRequest {
            entity: input.entity.clone(),
            hint,
            values: parse_payload(&input.data)?,
            fields: input.fields.clone(),
        })
    }
}

impl MutationRequest {
    fn run(self, schema: &QuerySchema, features: EnabledFeatures) -> FieldgateResult<String> {
        let spec = find_entity(schema, &self.entity)?;
        let op = self.hint.resolve(&self.values);

        validate_input(schema, spec, op, &self.values).map_err(CoreError::from)?;

        let projection = projection(schema, &self.entity, &self.fields, features)?;
        let mut document = MutationDocument::new(schema, &self.entity, self.values).operation(op);

        if let Some(projection) = projection {
            document = document.projection(projection);
        }

        Ok(document.render()?)
    }
}

/// Builds the selection from dot paths. Without strict projection, paths the read type does
/// not expose are skipped.
fn projection(
    schema: &QuerySchema,
    entity: &str,
    paths: &[String],
    features: EnabledFeatures,
) -> FieldgateResult<Option<Projection>> {
    if paths.is_empty() {
        return Ok(None);
    }

    if features.contains(Feature::StrictProjection) {
        return Ok(Some(Projection::from_paths(paths)));
    }

    let read = schema
        .read_type(entity)
        .ok_or_else(|| FieldgateError::UnknownEntity(entity.to_owned()))?;

    let (selectable, skipped): (Vec<&String>, Vec<&String>) =
        paths.iter().partition(|path| is_selectable(schema, read, path));

    for path in skipped {
        tracing::warn!(entity, path = path.as_str(), "skipping field the read type does not expose");
    }

    Ok(Some(Projection::from_paths(selectable)))
}

fn is_selectable(schema: &QuerySchema, read: &ObjectType, path: &str) -> bool {
    let mut object = read;
    let mut segments = path.split('.').filter(|s| !s.is_empty()).peekable();

    while let Some(segment) = segments.next() {
        let Some(field) = object.find_field(segment) else {
            return false;
        };

        let projected = schema
            .find_entity(&object.identity.entity)
            .and_then(|e| e.field(segment))
            .map_or(true, permission::is_projected);

        if !projected {
            return false;
        }

        match field.field_type.as_object().and_then(|id| schema.find_type(id)) {
            Some(nested) => object = nested,
            None => return segments.peek().is_none(),
        }
    }

    true
}

/// Literal syntax where it parses, the raw text as a string otherwise.
fn parse_argument_value(text: &str) -> FieldValue {
    parse_value(text).unwrap_or_else(|_| FieldValue::String(text.to_owned()))
}

fn parse_payload(data: &str) -> FieldgateResult<FieldObject> {
    let json: serde_json::Value =
        serde_json::from_str(data).map_err(|err| FieldgateError::invocation(format!("Invalid JSON payload: {err}")))?;

    FieldValue::from(json)
        .into_object()
        .ok_or_else(|| FieldgateError::invocation("The payload must be a JSON object."))
}

/// Reads a JSON object of record lists keyed by entity into a fresh store.
async fn load_records(schema: &QuerySchema, path: &Path) -> FieldgateResult<MemoryStore> {
    let content = fs::read_to_string(path).map_err(|source| FieldgateError::IOError {
        path: path.to_owned(),
        source,
    })?;

    let tables = parse_payload(&content)?;
    let store = MemoryStore::new(schema.data_model().clone());

    for (entity, rows) in tables {
        let rows = rows
            .into_list()
            .ok_or_else(|| FieldgateError::invocation(format!("Records of `{entity}` must be a list.")))?;

        for row in rows {
            let values = row
                .into_object()
                .ok_or_else(|| FieldgateError::invocation(format!("Records of `{entity}` must be objects.")))?;

            store.insert(&entity, values).await?;
        }
    }

    Ok(store)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanOutput<'a> {
    unique_match: &'a FieldObject,
    defaults: &'a FieldObject,
}

fn to_json<T: Serialize>(value: &T) -> FieldgateResult<String> {
    serde_json::to_string_pretty(value).map_err(|err| FieldgateError::invocation(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use structopt::StructOpt;

    const CONFIG: &str = indoc! {r#"
        [schema]
        filter_profile = "minimal"

        [[entities]]
        name = "User"

        [[entities.fields]]
        name = "id"
        kind = "int"
        permissions = { create = "deny", read = "primary" }

        [[entities.fields]]
        name = "username"
        kind = "string"
        permissions = { create = ["require", "unique"], update = "unique" }

        [[entities.fields]]
        name = "email"
        kind = "string"
        permissions = { create = "require" }

        [[entities.fields]]
        name = "password"
        kind = "string"
        permissions = { read = "deny" }
    "#};

    fn command(args: &[&str]) -> CliCommand {
        let opts = FieldgateOpt::from_iter_safe(std::iter::once("fieldgate").chain(args.iter().copied())).unwrap();
        CliCommand::from_opt(&opts).unwrap()
    }

    async fn run(args: &[&str], features: EnabledFeatures) -> FieldgateResult<String> {
        let config = FieldgateConfig::parse(CONFIG).unwrap();
        command(args).execute_with(&config, features).await
    }

    #[tokio::test]
    async fn types_are_listed_with_their_signatures() {
        let output = run(&["types"], EnabledFeatures::empty()).await.unwrap();

        expect![[r#"
            type UserType {
              id: Int
              username: String
              email: String
            }
            input UserCreateInputType {
              username: String!
              email: String!
              password: String
            }
            input UserUpdateInputType {
              id: Int
              username: String
              email: String
              password: String
            }"#]]
        .assert_eq(&output);
    }

    #[tokio::test]
    async fn extended_filters_override_the_profile() {
        let minimal = run(&["filters", "User"], EnabledFeatures::empty()).await.unwrap();
        let extended = run(&["filters", "User"], Feature::ExtendedFilters.into()).await.unwrap();

        assert!(!minimal.contains("username_startswith:"));
        assert!(extended.contains("username_startswith: String"));
    }

    #[tokio::test]
    async fn plans_split_unique_values_from_defaults() {
        let output = run(
            &["plan", "User", "--data", r#"{"username": "ann", "email": "a@x.com"}"#],
            EnabledFeatures::empty(),
        )
        .await
        .unwrap();

        expect![[r#"
            {
              "uniqueMatch": {
                "username": "ann"
              },
              "defaults": {
                "email": "a@x.com"
              }
            }"#]]
        .assert_eq(&output);
    }

    #[tokio::test]
    async fn plans_without_a_unique_value_fail() {
        let err = run(&["plan", "User", "--data", r#"{"email": "a@x.com"}"#], EnabledFeatures::empty())
            .await
            .unwrap_err();

        assert_eq!(err.into_user_facing().error_code(), Some("FG1001"));
    }

    #[tokio::test]
    async fn mutations_are_validated_before_rendering() {
        let err = run(
            &["mutation", "User", "--operation", "create", "--data", r#"{"email": "a@x.com"}"#],
            EnabledFeatures::empty(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_user_facing().error_code(), Some("FG2001"));
    }

    #[tokio::test]
    async fn hidden_fields_are_skipped_unless_projection_is_strict() {
        let args = ["query", "User", "--field", "username", "--field", "password"];

        let lenient = run(&args, EnabledFeatures::empty()).await.unwrap();
        expect![[r#"
            query userQuery {
              user {
                username
              }
            }"#]]
        .assert_eq(&lenient);

        let strict = run(&args, Feature::StrictProjection.into()).await;
        assert!(matches!(strict, Err(FieldgateError::DocumentError(_))));
    }

    #[tokio::test]
    async fn explained_queries_print_one_line_per_pass() {
        let output = run(&["query", "User", "--explain", "--arg", "username_contains=an"], EnabledFeatures::empty())
            .await
            .unwrap();

        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("username"));
    }

    #[tokio::test]
    async fn queries_run_against_recorded_rows() {
        let path = std::env::temp_dir().join(format!("fieldgate-records-{}.json", std::process::id()));
        let rows = r#"{"User": [{"username": "ann", "email": "a@x.com"}, {"username": "bob", "email": "b@x.com"}]}"#;
        fs::write(&path, rows).unwrap();

        let records = path.to_str().unwrap();
        let output = run(
            &["query", "User", "--arg", "username_contains=an", "--records", records],
            EnabledFeatures::empty(),
        )
        .await;

        fs::remove_file(&path).ok();

        expect![[r#"
            [
              {
                "id": 1,
                "username": "ann",
                "email": "a@x.com"
              }
            ]"#]]
        .assert_eq(&output.unwrap());
    }

    #[tokio::test]
    async fn unknown_operations_are_rejected() {
        let opts =
            FieldgateOpt::from_iter_safe(["fieldgate", "mutation", "User", "--operation", "delete", "--data", "{}"])
                .unwrap();

        assert!(matches!(
            CliCommand::from_opt(&opts),
            Err(FieldgateError::InvocationError(_))
        ));
    }

    #[test]
    fn bare_words_are_strings() {
        assert_eq!(parse_argument_value("ann"), FieldValue::from("ann"));
        assert_eq!(parse_argument_value("7"), FieldValue::Int(7));
        assert_eq!(parse_argument_value("a@x.com"), FieldValue::from("a@x.com"));
    }
}
