use crate::{ConfigurationError, EntityRef, EntitySpec, FieldSpec, ValueKind};
use indexmap::IndexMap;
use std::{collections::HashSet, sync::Arc};

pub type DataModelRef = Arc<DataModel>;

/// Registry of every entity the schema is built from.
#[derive(Debug, Clone, Default)]
pub struct DataModel {
    entities: IndexMap<String, EntityRef>,
}

impl DataModel {
    pub fn builder() -> DataModelBuilder {
        DataModelBuilder::default()
    }

    pub fn find_entity(&self, name: &str) -> Option<&EntityRef> {
        self.entities.get(name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityRef> {
        self.entities.values()
    }

    /// The entity an entity reference field points at.
    pub fn target_of(&self, field: &FieldSpec) -> Option<&EntityRef> {
        field.kind.target().and_then(|target| self.find_entity(target))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Builds a [`DataModel`] in two phases: every entity name is declared first, fields are
/// defined afterwards and may reference any declared entity, including themselves.
#[derive(Debug, Default)]
pub struct DataModelBuilder {
    declared: IndexMap<String, Declared>,
}

#[derive(Debug)]
struct Declared {
    store_model: String,
    fields: Option<IndexMap<String, FieldSpec>>,
}

impl DataModelBuilder {
    pub fn declare(&mut self, name: impl Into<String>, store_model: impl Into<String>) -> crate::Result<&mut Self> {
        let name = name.into();

        if self.declared.contains_key(&name) {
            return Err(ConfigurationError::DuplicateEntity(name));
        }

        self.declared.insert(
            name,
            Declared {
                store_model: store_model.into(),
                fields: None,
            },
        );

        Ok(self)
    }

    pub fn define(&mut self, entity: &str, fields: Vec<FieldSpec>) -> crate::Result<&mut Self> {
        let declared = self
            .declared
            .get_mut(entity)
            .ok_or_else(|| ConfigurationError::UndefinedEntity(entity.to_owned()))?;

        let mut by_name = IndexMap::with_capacity(fields.len());

        for field in fields {
            if by_name.contains_key(&field.name) {
                return Err(ConfigurationError::DuplicateField {
                    entity: entity.to_owned(),
                    field: field.name,
                });
            }

            by_name.insert(field.name.clone(), field);
        }

        declared.fields = Some(by_name);

        Ok(self)
    }

    /// Declares and defines in one step. The store model is named after the entity.
    pub fn entity(&mut self, name: &str, fields: Vec<FieldSpec>) -> crate::Result<&mut Self> {
        self.declare(name, name)?;
        self.define(name, fields)
    }

    #[tracing::instrument(name = "build_data_model", skip(self))]
    pub fn build(self) -> crate::Result<DataModel> {
        let names: HashSet<String> = self.declared.keys().cloned().collect();
        let mut entities = IndexMap::with_capacity(self.declared.len());

        for (name, declared) in self.declared {
            let fields = declared
                .fields
                .ok_or_else(|| ConfigurationError::UndefinedEntity(name.clone()))?;

            for field in fields.values() {
                validate_field(&name, field, &names)?;
            }

            let spec = EntitySpec {
                name: name.clone(),
                fields,
                store_model: declared.store_model,
            };

            entities.insert(name, Arc::new(spec));
        }

        let model = DataModel { entities };

        validate_nested_fields(&model)?;
        validate_eager_references(&model)?;

        tracing::debug!(entities = model.len(), "data model built");

        Ok(model)
    }
}

fn validate_field(entity: &str, field: &FieldSpec, names: &HashSet<String>) -> crate::Result<()> {
    if let Some(target) = field.kind.target() {
        if !names.contains(target) {
            return Err(ConfigurationError::UnknownEntity {
                entity: entity.to_owned(),
                field: field.name.clone(),
                target: target.to_owned(),
            });
        }
    }

    if let Some(op) = field.permissions.conflicts().next() {
        return Err(ConfigurationError::ConflictingPermissions {
            entity: entity.to_owned(),
            field: field.name.clone(),
            operation: op.to_string(),
        });
    }

    Ok(())
}

fn validate_nested_fields(model: &DataModel) -> crate::Result<()> {
    for entity in model.entities() {
        for field in entity.fields() {
            let (Some(nested), Some(target)) = (&field.nested_fields, model.target_of(field)) else {
                continue;
            };

            if let Some(missing) = nested.iter().find(|n| target.field(n).is_none()) {
                return Err(ConfigurationError::UnknownNestedField {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                    target: target.name.clone(),
                    nested: missing.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Eager references are resolved depth-first while building types, so they must not form a
/// cycle. Cycles have to go through at least one lazy reference.
fn validate_eager_references(model: &DataModel) -> crate::Result<()> {
    fn visit<'a>(
        model: &'a DataModel,
        entity: &'a EntitySpec,
        stack: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> crate::Result<()> {
        if done.contains(entity.name.as_str()) {
            return Ok(());
        }

        stack.push(&entity.name);

        for field in entity.fields() {
            let ValueKind::NestedRef(target) = &field.kind else {
                continue;
            };

            if stack.contains(&target.as_str()) {
                return Err(ConfigurationError::EagerCycle {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                    target: target.clone(),
                });
            }

            if let Some(target) = model.find_entity(target) {
                visit(model, target, stack, done)?;
            }
        }

        stack.pop();
        done.insert(&entity.name);

        Ok(())
    }

    let mut done = HashSet::new();

    for entity in model.entities() {
        visit(model, entity, &mut Vec::new(), &mut done)?;
    }

    Ok(())
}
