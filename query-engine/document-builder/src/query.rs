use crate::{
    render::{render_projection, RenderContext},
    wire_name, DocumentError, DocumentResult, Projection,
};
use field_value::{FieldObject, FieldValue};
use schema::QuerySchema;

/// A read request for one entity, filtered by variables.
///
/// Every argument becomes a variable typed after the filter argument it is bound to, e.g.
/// `$usernameStartswith: String!`.
pub struct QueryDocument<'a> {
    schema: &'a QuerySchema,
    entity: &'a str,
    name: String,
    arguments: FieldObject,
    projection: Option<Projection>,
}

impl<'a> QueryDocument<'a> {
    pub fn new(schema: &'a QuerySchema, entity: &'a str, name: impl Into<String>) -> Self {
        QueryDocument {
            schema,
            entity,
            name: name.into(),
            arguments: FieldObject::new(),
            projection: None,
        }
    }

    pub fn argument(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    pub fn arguments(mut self, arguments: FieldObject) -> Self {
        self.arguments.extend(arguments);
        self
    }

    /// Restricts the selection. Without one, every projected field is selected.
    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// The variable values to send along, keyed by wire name.
    pub fn variables(&self) -> FieldObject {
        self.arguments
            .iter()
            .map(|(name, value)| (wire_name(name), value.clone()))
            .collect()
    }

    #[tracing::instrument(skip(self), fields(entity = self.entity, name = %self.name))]
    pub fn render(&self) -> DocumentResult<String> {
        let read = self
            .schema
            .read_type(self.entity)
            .ok_or_else(|| DocumentError::UnknownEntity(self.entity.to_owned()))?;

        let mut definitions = Vec::with_capacity(self.arguments.len());
        let mut bindings = Vec::with_capacity(self.arguments.len());

        for name in self.arguments.keys() {
            let arg_type = self
                .schema
                .argument_type(self.entity, name)
                .ok_or_else(|| DocumentError::UnknownArgument {
                    entity: self.entity.to_owned(),
                    argument: name.clone(),
                })?;

            let wire = wire_name(name);
            definitions.push(format!("${wire}: {arg_type}!"));
            bindings.push(format!("{wire}: ${wire}"));
        }

        let (header, field) = if definitions.is_empty() {
            (format!("query {}Query", self.name), self.name.clone())
        } else {
            (
                format!("query {}Query({})", self.name, definitions.join(", ")),
                format!("{}({})", self.name, bindings.join(", ")),
            )
        };

        let default;
        let projection = match &self.projection {
            Some(projection) => projection,
            None => {
                default = Projection::all(self.schema, read);
                &default
            }
        };

        let mut ctx = RenderContext::new();
        ctx.open(header);
        ctx.open(field);
        render_projection(&mut ctx, self.schema, read, projection)?;
        ctx.close();
        ctx.close();

        let document = ctx.format();
        tracing::debug!(variables = definitions.len(), "rendered query document");

        Ok(document)
    }
}
