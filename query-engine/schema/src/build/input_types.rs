use super::*;
use entity_model::{permission, ID_FIELD};

impl BuilderContext<'_> {
    /// `{Entity}CreateInputType` or `{Entity}UpdateInputType`: every field visible for the
    /// operation, required ones marked as such.
    pub(super) fn build_input_root(&mut self, entity: &EntityRef, op: Operation) -> BuildResult<ObjectTypeId> {
        let id = self.root_id(&entity.name, op)?;
        let root = AncestryPath::root();
        let mut fields = Vec::new();

        for field in entity.visible_fields(op) {
            let type_field = self.resolve_field(entity, field, op, &root)?;
            fields.push(type_field.required(permission::is_required(field, op)));
        }

        self.type_mut(id).fields = fields;

        Ok(id)
    }

    /// Nested write inputs only reference existing records. They carry the identity, with its
    /// create and update constraints removed, plus fields marked for nested writes.
    pub(super) fn wire_nested_input(&mut self, id: ObjectTypeId, entity: &EntityRef, op: Operation) -> BuildResult<()> {
        let ancestry = self.identity_of(id).ancestry.clone();
        let mut fields = Vec::new();

        let allowed = entity
            .fields()
            .filter(|f| f.name == ID_FIELD || (f.allow_nested_write && permission::is_visible(f, op)));

        for field in allowed {
            fields.push(self.resolve_field(entity, field, op, &ancestry)?);
        }

        self.type_mut(id).fields = fields;

        Ok(())
    }
}
