use crate::*;
use entity_model::{DataModelRef, EntityRef, Operation};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::collections::HashMap;

/// Root types and query arguments of one entity.
#[derive(Debug, Clone)]
pub struct EntityTypes {
    pub read: ObjectTypeId,
    pub create: ObjectTypeId,
    pub update: ObjectTypeId,
    pub filters: FilterArgumentMap,
}

/// The frozen type graph. Immutable once built, shared through [`QuerySchemaRef`].
#[derive(Debug)]
pub struct QuerySchema {
    data_model: DataModelRef,
    config: SchemaConfig,
    types: Vec<ObjectType>,
    identities: HashMap<TypeIdentity, ObjectTypeId>,
    entities: IndexMap<String, EntityTypes>,
}

impl QuerySchema {
    pub(crate) fn new(
        data_model: DataModelRef,
        config: SchemaConfig,
        types: Vec<ObjectType>,
        identities: HashMap<TypeIdentity, ObjectTypeId>,
        entities: IndexMap<String, EntityTypes>,
    ) -> Self {
        QuerySchema {
            data_model,
            config,
            types,
            identities,
            entities,
        }
    }

    pub fn data_model(&self) -> &DataModelRef {
        &self.data_model
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub fn find_entity(&self, name: &str) -> Option<&EntityRef> {
        self.data_model.find_entity(name)
    }

    pub fn entity_types(&self, entity: &str) -> Option<&EntityTypes> {
        self.entities.get(entity)
    }

    pub fn get(&self, id: ObjectTypeId) -> &ObjectType {
        &self.types[id.0]
    }

    pub fn find_type(&self, identity: &TypeIdentity) -> Option<&ObjectType> {
        self.identities.get(identity).map(|id| self.get(*id))
    }

    pub fn types(&self) -> impl Iterator<Item = &ObjectType> {
        self.types.iter()
    }

    pub fn read_type(&self, entity: &str) -> Option<&ObjectType> {
        self.entity_types(entity).map(|t| self.get(t.read))
    }

    pub fn create_type(&self, entity: &str) -> Option<&ObjectType> {
        self.entity_types(entity).map(|t| self.get(t.create))
    }

    pub fn update_type(&self, entity: &str) -> Option<&ObjectType> {
        self.entity_types(entity).map(|t| self.get(t.update))
    }

    /// The root type generated for `op`. Deletes have no type of their own.
    pub fn root_type(&self, entity: &str, op: Operation) -> Option<&ObjectType> {
        match op {
            Operation::Read => self.read_type(entity),
            Operation::Create => self.create_type(entity),
            Operation::Update => self.update_type(entity),
            Operation::Delete => None,
        }
    }

    pub fn filter_arguments(&self, entity: &str) -> Option<&FilterArgumentMap> {
        self.entity_types(entity).map(|t| &t.filters)
    }

    /// Type of a query argument or field of the entity, as a client declares it.
    pub fn argument_type(&self, entity: &str, argument: &str) -> Option<&TypeRef> {
        self.filter_arguments(entity)
            .and_then(|args| args.get(argument))
            .map(|arg| &arg.arg_type)
    }
}

/// Once-only initialization barrier around schema construction.
///
/// Concurrent callers of [`SchemaCell::get_or_build`] block until the single builder finishes
/// and then share the same schema.
#[derive(Debug, Default)]
pub struct SchemaCell {
    cell: OnceCell<QuerySchemaRef>,
}

impl SchemaCell {
    pub const fn new() -> Self {
        SchemaCell { cell: OnceCell::new() }
    }

    pub fn get(&self) -> Option<&QuerySchemaRef> {
        self.cell.get()
    }

    pub fn get_or_build(&self, data_model: &DataModelRef, config: &SchemaConfig) -> Result<&QuerySchemaRef, SchemaError> {
        self.cell
            .get_or_try_init(|| crate::build(data_model.clone(), config.clone()).map(Arc::new))
    }

    /// Builds the schema, failing if it was built before.
    pub fn init(&self, data_model: DataModelRef, config: SchemaConfig) -> Result<&QuerySchemaRef, SchemaError> {
        if self.cell.get().is_some() {
            return Err(SchemaError::AlreadyInitialized);
        }

        let schema = Arc::new(crate::build(data_model, config)?);

        self.cell.set(schema).map_err(|_| SchemaError::AlreadyInitialized)?;
        self.cell.get().ok_or(SchemaError::AlreadyInitialized)
    }
}
