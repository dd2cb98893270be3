use super::*;

impl BuilderContext<'_> {
    /// `{Entity}Type`, with every field visible for read. Entity references point at the
    /// root read type of their target.
    pub(super) fn build_read_root(&mut self, entity: &EntityRef) -> BuildResult<ObjectTypeId> {
        let id = self.root_id(&entity.name, Operation::Read)?;
        let mut fields = Vec::new();

        for field in entity.visible_fields(Operation::Read) {
            let inner = match &field.kind {
                ValueKind::Scalar(kind) => TypeRef::Scalar(*kind),
                ValueKind::NestedRef(_) | ValueKind::LazyRef(_) => {
                    let target = self.target_of(entity, field)?;
                    TypeRef::Object(TypeIdentity::root(target.name.clone(), Operation::Read))
                }
            };

            let field_type = if field.is_list() { TypeRef::list(inner) } else { inner };
            fields.push(TypeField::new(field.name.clone(), field_type));
        }

        self.type_mut(id).fields = fields;

        Ok(id)
    }

    /// Query arguments of the entity: plain and operator arguments for every read-visible
    /// scalar, nested filter objects for references.
    pub(super) fn build_root_filters(&mut self, entity: &EntityRef) -> BuildResult<FilterArgumentMap> {
        self.filters_for(entity, entity.visible_fields(Operation::Read), &AncestryPath::root())
            .map(|(_, filters)| filters)
    }

    pub(super) fn wire_nested_read(
        &mut self,
        id: ObjectTypeId,
        entity: &EntityRef,
        nested_fields: Option<&[String]>,
    ) -> BuildResult<()> {
        let ancestry = self.identity_of(id).ancestry.clone();
        let visible = entity
            .visible_fields(Operation::Read)
            .filter(|f| nested_fields.map(|names| names.contains(&f.name)).unwrap_or(true));

        let (fields, filters) = self.filters_for(entity, visible, &ancestry)?;

        let object = self.type_mut(id);
        object.fields = fields;
        object.filters = filters;

        Ok(())
    }

    fn filters_for<'f>(
        &mut self,
        entity: &EntityRef,
        fields: impl Iterator<Item = &'f FieldSpec>,
        ancestry: &AncestryPath,
    ) -> BuildResult<(Vec<TypeField>, FilterArgumentMap)> {
        let profile = self.config.filter_profile;
        let mut resolved = Vec::new();
        let mut filters = FilterArgumentMap::new();

        for field in fields {
            let type_field = self.resolve_field(entity, field, Operation::Read, ancestry)?;

            match (&field.kind, type_field.field_type.as_object()) {
                (ValueKind::Scalar(kind), _) => filters.extend(scalar_filters(&field.name, *kind, profile)),
                (_, Some(nested)) => {
                    let nested = TypeRef::Object(nested.clone());
                    filters.extend(relation_filters(&field.name, nested, field.is_to_many()));
                }
                (_, None) => (),
            }

            resolved.push(type_field);
        }

        Ok((resolved, filters))
    }
}
