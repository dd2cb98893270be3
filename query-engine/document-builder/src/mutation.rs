use crate::{
    literal::render_literal,
    render::{render_projection, RenderContext},
    wire_name, DocumentError, DocumentResult, Projection,
};
use entity_model::{EntitySpec, Operation, OperationHint};
use field_value::{FieldObject, FieldValue};
use heck::ToUpperCamelCase;
use schema::QuerySchema;

/// An update-or-create request carrying its payload as an inline literal.
///
/// Renders as `mutation createUserMutation { createUser(userData: {...}) { user { ... } } }`.
/// The returned record always selects its identity.
pub struct MutationDocument<'a> {
    schema: &'a QuerySchema,
    entity: &'a str,
    hint: OperationHint,
    values: FieldObject,
    projection: Option<Projection>,
}

impl<'a> MutationDocument<'a> {
    pub fn new(schema: &'a QuerySchema, entity: &'a str, values: FieldObject) -> Self {
        MutationDocument {
            schema,
            entity,
            hint: OperationHint::Guess,
            values,
            projection: None,
        }
    }

    pub fn operation(mut self, op: Operation) -> Self {
        self.hint = OperationHint::Explicit(op);
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn resolved_operation(&self) -> Operation {
        self.hint.resolve(&self.values)
    }

    #[tracing::instrument(skip(self), fields(entity = self.entity))]
    pub fn render(&self) -> DocumentResult<String> {
        let unknown = || DocumentError::UnknownEntity(self.entity.to_owned());
        let spec = self.schema.find_entity(self.entity).ok_or_else(unknown)?;
        let read = self.schema.read_type(self.entity).ok_or_else(unknown)?;

        let op = self.resolved_operation();
        if !op.is_write() {
            return Err(DocumentError::NotAWrite(op));
        }

        let mutation = format!("{op}{}", spec.name.to_upper_camel_case());
        let entity = wire_name(&spec.name);
        let data = self.input_literal(spec, &self.values)?;

        let projection = match &self.projection {
            Some(projection) => projection.clone().with_id(),
            None => Projection::all(self.schema, read).with_id(),
        };

        let mut ctx = RenderContext::new();
        ctx.open(format!("mutation {mutation}Mutation"));
        ctx.open(format!("{mutation}({entity}Data: {data})"));
        ctx.open(entity);
        render_projection(&mut ctx, self.schema, read, &projection)?;
        ctx.close();
        ctx.close();
        ctx.close();

        tracing::debug!(operation = %op, "rendered mutation document");

        Ok(ctx.format())
    }

    /// Input object literal of `values`. Keys of the entity's fields are written by wire name,
    /// references recurse into the referenced entity.
    fn input_literal(&self, entity: &EntitySpec, values: &FieldObject) -> DocumentResult<String> {
        let pairs = values
            .iter()
            .map(|(key, value)| {
                let target = entity
                    .field(key)
                    .filter(|f| f.kind.is_entity_ref())
                    .and_then(|f| self.schema.data_model().target_of(f));

                let rendered = match target {
                    Some(target) => self.reference_literal(target, value)?,
                    None => render_literal(value)?,
                };

                Ok(format!("{}: {rendered}", wire_name(key)))
            })
            .collect::<DocumentResult<Vec<_>>>()?;

        Ok(format!("{{{}}}", pairs.join(", ")))
    }

    fn reference_literal(&self, target: &EntitySpec, value: &FieldValue) -> DocumentResult<String> {
        match value {
            FieldValue::Object(values) => self.input_literal(target, values),
            FieldValue::List(members) => {
                let members = members
                    .iter()
                    .map(|member| self.reference_literal(target, member))
                    .collect::<DocumentResult<Vec<_>>>()?;

                Ok(format!("[{}]", members.join(", ")))
            }
            other => render_literal(other),
        }
    }
}
