use crate::{DocumentError, DocumentResult};
use field_value::{FieldObject, FieldValue};
use graphql_parser::query::{
    parse_query, Definition, OperationDefinition, Selection as GqlSelection, SelectionSet, Value, VariableDefinition,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// The single operation of a parsed document.
///
/// Fragments, subscriptions and directives are not part of rendered documents and are
/// rejected or ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub kind: OperationKind,
    pub name: Option<String>,
    /// Variable names with their declared types, e.g. `("username", "String!")`.
    pub variables: Vec<(String, String)>,
    pub fields: Vec<ParsedField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedField {
    pub name: String,
    pub arguments: Vec<(String, ArgumentValue)>,
    pub fields: Vec<ParsedField>,
}

impl ParsedField {
    pub fn field(&self, name: &str) -> Option<&ParsedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments.iter().find(|(n, _)| n == name).map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    Variable(String),
    Literal(FieldValue),
}

/// Parses a document holding exactly one query or mutation.
pub fn parse_document(text: &str) -> DocumentResult<ParsedDocument> {
    let document = parse_query::<String>(text).map_err(|err| DocumentError::Parse(err.to_string()))?;

    let mut operations = document
        .definitions
        .into_iter()
        .map(convert_definition)
        .collect::<DocumentResult<Vec<_>>>()?;

    match operations.len() {
        1 => Ok(operations.remove(0)),
        n => Err(DocumentError::Parse(format!("expected one operation, found {n}"))),
    }
}

/// Parses a single input literal as rendered by [`render_literal`](crate::render_literal).
///
/// Quoted decimals, dates and uuids come back as [`FieldValue::String`] holding their canonical
/// text.
pub fn parse_value(text: &str) -> DocumentResult<FieldValue> {
    let document = parse_document(&format!("{{ value(literal: {text}) }}"))?;

    let argument = document
        .fields
        .into_iter()
        .next()
        .and_then(|field| field.arguments.into_iter().next());

    match argument {
        Some((_, ArgumentValue::Literal(value))) => Ok(value),
        Some((_, ArgumentValue::Variable(name))) => {
            Err(DocumentError::Parse(format!("`${name}` is a variable, not a literal")))
        }
        None => Err(DocumentError::Parse("no literal given".to_owned())),
    }
}

fn convert_definition(definition: Definition<'_, String>) -> DocumentResult<ParsedDocument> {
    let (kind, name, variables, selection_set) = match definition {
        Definition::Operation(OperationDefinition::Query(q)) => {
            (OperationKind::Query, q.name, q.variable_definitions, q.selection_set)
        }
        Definition::Operation(OperationDefinition::Mutation(m)) => {
            (OperationKind::Mutation, m.name, m.variable_definitions, m.selection_set)
        }
        Definition::Operation(OperationDefinition::SelectionSet(s)) => (OperationKind::Query, None, Vec::new(), s),
        Definition::Operation(OperationDefinition::Subscription(s)) => {
            return Err(DocumentError::Parse(format!("subscriptions are not supported, at {}", s.position)))
        }
        Definition::Fragment(f) => {
            return Err(DocumentError::Parse(format!("fragment `{}` is not supported, at {}", f.name, f.position)))
        }
    };

    Ok(ParsedDocument {
        kind,
        name,
        variables: variables.into_iter().map(convert_variable).collect(),
        fields: convert_selection_set(selection_set)?,
    })
}

fn convert_variable(definition: VariableDefinition<'_, String>) -> (String, String) {
    (definition.name, definition.var_type.to_string())
}

fn convert_selection_set(selection_set: SelectionSet<'_, String>) -> DocumentResult<Vec<ParsedField>> {
    selection_set
        .items
        .into_iter()
        .map(|item| match item {
            GqlSelection::Field(f) => Ok(ParsedField {
                name: f.name,
                arguments: f
                    .arguments
                    .into_iter()
                    .map(|(name, value)| Ok((name, convert_argument(value)?)))
                    .collect::<DocumentResult<Vec<_>>>()?,
                fields: convert_selection_set(f.selection_set)?,
            }),
            GqlSelection::FragmentSpread(fs) => Err(DocumentError::Parse(format!(
                "fragment spread `{}` is not supported, at {}",
                fs.fragment_name, fs.position
            ))),
            GqlSelection::InlineFragment(i) => Err(DocumentError::Parse(format!(
                "inline fragments are not supported, at {}",
                i.position
            ))),
        })
        .collect()
}

fn convert_argument(value: Value<'_, String>) -> DocumentResult<ArgumentValue> {
    match value {
        Value::Variable(name) => Ok(ArgumentValue::Variable(name)),
        other => convert_value(other).map(ArgumentValue::Literal),
    }
}

fn convert_value(value: Value<'_, String>) -> DocumentResult<FieldValue> {
    match value {
        Value::Variable(name) => Err(DocumentError::Parse(format!("variable `${name}` inside a literal"))),
        Value::Int(i) => i
            .as_i64()
            .map(FieldValue::Int)
            .ok_or_else(|| DocumentError::Parse(format!("invalid 64 bit integer: {i:?}"))),
        Value::Float(f) => Ok(FieldValue::Float(f)),
        Value::String(s) => Ok(FieldValue::String(s)),
        Value::Boolean(b) => Ok(FieldValue::Boolean(b)),
        Value::Null => Ok(FieldValue::Null),
        Value::Enum(e) => Ok(FieldValue::String(e)),
        Value::List(values) => values
            .into_iter()
            .map(convert_value)
            .collect::<DocumentResult<Vec<_>>>()
            .map(FieldValue::List),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| convert_value(value).map(|value| (key, value)))
            .collect::<DocumentResult<FieldObject>>()
            .map(FieldValue::Object),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_literal;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn literals_read_back_as_the_rendered_value() {
        let value = FieldValue::from(json!({
            "name": "say \"hi\"\n",
            "age": 42,
            "score": 0.5,
            "active": false,
            "group": { "id": 1, "tags": ["a", null, [2.0]] },
        }));

        let text = render_literal(&value).unwrap();

        assert_eq!(parse_value(&text).unwrap(), value);
    }

    #[test]
    fn typed_scalars_read_back_as_their_text() {
        let datetime = field_value::parse_datetime("2024-05-01T10:30:00+02:00").unwrap();
        let value = FieldValue::List(vec![
            FieldValue::DateTime(datetime),
            FieldValue::Uuid("67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap()),
        ]);

        let text = render_literal(&value).unwrap();

        assert_eq!(
            parse_value(&text).unwrap(),
            FieldValue::List(vec![
                FieldValue::String(field_value::stringify_datetime(&datetime)),
                FieldValue::String("67e55044-10b1-426f-9247-bb680e5fe0c8".to_owned()),
            ])
        );
    }

    #[test]
    fn variables_are_not_literals() {
        assert!(matches!(parse_value("$username"), Err(DocumentError::Parse(_))));
        assert!(matches!(parse_value("{ nested: $username }"), Err(DocumentError::Parse(_))));
    }

    #[test]
    fn operations_keep_names_variables_and_arguments() {
        let document = parse_document(indoc! {r#"
            query usersQuery($username: String!, $tagsIn: [TagOfUserRelatedReadInputType]!) {
              users(username: $username, tagsIn: $tagsIn, first: 10) {
                id
                group {
                  name
                }
              }
            }
        "#})
        .unwrap();

        assert_eq!(document.kind, OperationKind::Query);
        assert_eq!(document.name.as_deref(), Some("usersQuery"));
        assert_eq!(
            document.variables,
            vec![
                ("username".to_owned(), "String!".to_owned()),
                ("tagsIn".to_owned(), "[TagOfUserRelatedReadInputType]!".to_owned()),
            ]
        );

        let users = &document.fields[0];
        assert_eq!(users.argument("username"), Some(&ArgumentValue::Variable("username".to_owned())));
        assert_eq!(users.argument("first"), Some(&ArgumentValue::Literal(FieldValue::Int(10))));
        assert_eq!(users.field("group").map(|g| g.fields.len()), Some(1));
    }

    #[test]
    fn fragments_are_rejected() {
        let err = parse_document("fragment f on User { id } query q { users { ...f } }").unwrap_err();

        assert!(matches!(err, DocumentError::Parse(message) if message.contains("fragment `f`")));
    }
}
