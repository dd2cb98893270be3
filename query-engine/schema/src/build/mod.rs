//! Query schema builder. Root for query schema building.
//!
//! Building runs in two phases. First every root identity is registered as an empty skeleton
//! in the cache, then fields are wired. Nested types reached through a lazy reference are only
//! registered while wiring and queued, their fields are wired once the roots are done.

mod cache;
mod input_types;
mod read_types;

use self::cache::*;
use crate::*;
use entity_model::{DataModel, DataModelRef, EntityRef, FieldSpec, Operation, ValueKind};
use indexmap::IndexMap;
use std::collections::VecDeque;

pub(crate) use cache::return_cached;

type BuildResult<T> = std::result::Result<T, SchemaError>;

/// Operations that get a root type per entity.
const ROOT_OPERATIONS: [Operation; 3] = [Operation::Read, Operation::Create, Operation::Update];

#[tracing::instrument(name = "build_query_schema", skip(data_model, config))]
pub fn build(data_model: DataModelRef, config: SchemaConfig) -> BuildResult<QuerySchema> {
    let mut ctx = BuilderContext::new(&data_model, &config);

    ctx.initialize_root_cache();

    let mut entities = IndexMap::with_capacity(data_model.len());

    for entity in data_model.entities() {
        let types = ctx.build_entity(entity)?;
        entities.insert(entity.name.clone(), types);
    }

    ctx.wire_deferred()?;

    let (types, identities) = ctx.finalize();

    tracing::debug!(types = types.len(), entities = entities.len(), "query schema built");

    Ok(QuerySchema::new(data_model, config, types, identities, entities))
}

struct DeferredType {
    id: ObjectTypeId,
    entity: EntityRef,
    nested_fields: Option<Vec<String>>,
}

pub(crate) struct BuilderContext<'a> {
    data_model: &'a DataModel,
    config: &'a SchemaConfig,
    cache: TypeRefCache<ObjectTypeId>,
    types: Vec<ObjectType>,
    deferred: VecDeque<DeferredType>,
}

impl<'a> BuilderContext<'a> {
    fn new(data_model: &'a DataModel, config: &'a SchemaConfig) -> Self {
        // Roots plus a rough guess of nested types.
        let capacity = data_model.len() * ROOT_OPERATIONS.len() * 2;

        Self {
            data_model,
            config,
            cache: TypeRefCache::with_capacity(capacity),
            types: Vec::with_capacity(capacity),
            deferred: VecDeque::new(),
        }
    }

    /// Registers the skeleton of every root type, so references between roots resolve
    /// regardless of declaration order.
    fn initialize_root_cache(&mut self) {
        for entity in self.data_model.entities() {
            for op in ROOT_OPERATIONS {
                self.register(TypeIdentity::root(entity.name.clone(), op));
            }
        }
    }

    fn register(&mut self, identity: TypeIdentity) -> ObjectTypeId {
        let id = ObjectTypeId(self.types.len());

        self.cache.insert(identity.clone(), id);
        self.types.push(ObjectType::skeleton(identity));

        id
    }

    fn root_id(&self, entity: &str, op: Operation) -> BuildResult<ObjectTypeId> {
        self.cache
            .get(&TypeIdentity::root(entity, op))
            .ok_or_else(|| SchemaError::UnresolvedReference {
                entity: entity.to_owned(),
                field: String::new(),
                target: entity.to_owned(),
            })
    }

    fn type_mut(&mut self, id: ObjectTypeId) -> &mut ObjectType {
        &mut self.types[id.0]
    }

    fn identity_of(&self, id: ObjectTypeId) -> &TypeIdentity {
        &self.types[id.0].identity
    }

    fn build_entity(&mut self, entity: &EntityRef) -> BuildResult<EntityTypes> {
        let read = self.build_read_root(entity)?;
        let create = self.build_input_root(entity, Operation::Create)?;
        let update = self.build_input_root(entity, Operation::Update)?;
        let filters = self.build_root_filters(entity)?;

        Ok(EntityTypes {
            read,
            create,
            update,
            filters,
        })
    }

    fn target_of(&self, entity: &EntityRef, field: &FieldSpec) -> BuildResult<EntityRef> {
        self.data_model
            .target_of(field)
            .cloned()
            .ok_or_else(|| SchemaError::UnresolvedReference {
                entity: entity.name.clone(),
                field: field.name.clone(),
                target: field.kind.target().unwrap_or_default().to_owned(),
            })
    }

    /// Resolves the type of `field` on `entity` when used in a nested type for `op`, seen
    /// from `ancestry` (the ancestry of the enclosing type).
    ///
    /// A reference to an entity that already encloses the field resolves to the enclosing
    /// type instead of nesting deeper.
    pub(crate) fn resolve_field(
        &mut self,
        entity: &EntityRef,
        field: &FieldSpec,
        op: Operation,
        ancestry: &AncestryPath,
    ) -> BuildResult<TypeField> {
        let field_type = match &field.kind {
            ValueKind::Scalar(kind) => TypeRef::Scalar(*kind),
            ValueKind::NestedRef(_) | ValueKind::LazyRef(_) => {
                let target = self.target_of(entity, field)?;
                let child_ancestry = ancestry.enclosed_by(&entity.name);
                let id = self.resolve_nested(&target, field, op, child_ancestry)?;

                TypeRef::Object(self.identity_of(id).clone())
            }
        };

        let field_type = if field.is_list() {
            TypeRef::list(field_type)
        } else {
            field_type
        };

        Ok(TypeField::new(field.name.clone(), field_type))
    }

    fn resolve_nested(
        &mut self,
        target: &EntityRef,
        via: &FieldSpec,
        op: Operation,
        ancestry: AncestryPath,
    ) -> BuildResult<ObjectTypeId> {
        let identity = enclosing_identity(&target.name, op, &ancestry)
            .unwrap_or_else(|| TypeIdentity::new(target.name.clone(), op, ancestry));

        return_cached!(self, &identity);

        let id = self.register(identity);

        match via.kind {
            ValueKind::LazyRef(_) => self.deferred.push_back(DeferredType {
                id,
                entity: target.clone(),
                nested_fields: via.nested_fields.clone(),
            }),
            _ => self.wire_nested(id, target, via.nested_fields.as_deref())?,
        }

        Ok(id)
    }

    fn wire_nested(&mut self, id: ObjectTypeId, entity: &EntityRef, nested_fields: Option<&[String]>) -> BuildResult<()> {
        let op = self.identity_of(id).operation;

        match op {
            Operation::Read => self.wire_nested_read(id, entity, nested_fields),
            op => self.wire_nested_input(id, entity, op),
        }
    }

    fn wire_deferred(&mut self) -> BuildResult<()> {
        while let Some(deferred) = self.deferred.pop_front() {
            tracing::trace!(identity = %self.identity_of(deferred.id), "wiring deferred type");
            self.wire_nested(deferred.id, &deferred.entity, deferred.nested_fields.as_deref())?;
        }

        Ok(())
    }

    fn finalize(self) -> (Vec<ObjectType>, std::collections::HashMap<TypeIdentity, ObjectTypeId>) {
        (self.types, self.cache.into_inner())
    }
}

/// The identity of an already enclosing nested type for `entity`, if any.
///
/// The last ancestor is the root entity, whose root type is not a nested type and never
/// matches.
fn enclosing_identity(entity: &str, op: Operation, ancestry: &AncestryPath) -> Option<TypeIdentity> {
    let names = ancestry.names();
    let nested_levels = names.len().saturating_sub(1);

    (0..nested_levels)
        .find(|i| names[*i] == entity)
        .map(|i| TypeIdentity::new(entity, op, names[i + 1..].iter().cloned().collect()))
}

#[cfg(test)]
mod tests;
