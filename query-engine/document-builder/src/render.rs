use crate::{wire_name, DocumentError, DocumentResult, Projection};
use entity_model::permission;
use schema::{ObjectType, QuerySchema};

/// Line-oriented output with block indentation.
pub(crate) struct RenderContext {
    output: Vec<String>,
    /// Current nesting depth.
    indent: usize,
    indent_str: &'static str,
}

impl RenderContext {
    pub(crate) fn new() -> Self {
        RenderContext {
            output: Vec::new(),
            indent: 0,
            indent_str: "  ",
        }
    }

    pub(crate) fn line(&mut self, line: impl AsRef<str>) {
        self.output
            .push(format!("{}{}", self.indent_str.repeat(self.indent), line.as_ref()));
    }

    pub(crate) fn open(&mut self, header: impl AsRef<str>) {
        self.line(format!("{} {{", header.as_ref()));
        self.indent += 1;
    }

    pub(crate) fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    pub(crate) fn format(self) -> String {
        self.output.join("\n")
    }
}

/// Renders the selection set of `projection` on `object`, one field per line.
pub(crate) fn render_projection(
    ctx: &mut RenderContext,
    schema: &QuerySchema,
    object: &ObjectType,
    projection: &Projection,
) -> DocumentResult<()> {
    let entity = schema.find_entity(&object.identity.entity);

    for selection in projection.selections() {
        let field = object
            .find_field(&selection.name)
            .ok_or_else(|| DocumentError::UnknownField {
                type_name: object.name(),
                field: selection.name.clone(),
            })?;

        if let Some(spec) = entity.and_then(|e| e.field(&field.name)) {
            if !permission::is_projected(spec) {
                return Err(DocumentError::NotProjected {
                    entity: object.identity.entity.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let nested = field.field_type.as_object().and_then(|id| schema.find_type(id));
        let name = wire_name(&field.name);

        match (nested, &selection.nested) {
            (Some(nested), Some(inner)) if !inner.is_empty() => {
                ctx.open(name);
                render_projection(ctx, schema, nested, inner)?;
                ctx.close();
            }
            (Some(nested), _) => {
                ctx.open(name);
                render_projection(ctx, schema, nested, &Projection::new().with_id())?;
                ctx.close();
            }
            (None, Some(inner)) if !inner.is_empty() => {
                return Err(DocumentError::ScalarSelection {
                    type_name: object.name(),
                    field: field.name.clone(),
                });
            }
            (None, _) => ctx.line(name),
        }
    }

    Ok(())
}
