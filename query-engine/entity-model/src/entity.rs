use crate::{permission, FieldSpec, Operation, ID_FIELD};
use indexmap::IndexMap;
use std::sync::Arc;

pub type EntityRef = Arc<EntitySpec>;

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpec {
    pub name: String,
    pub fields: IndexMap<String, FieldSpec>,
    /// Name of the model in the backing store.
    pub store_model: String,
}

impl EntitySpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn identity(&self) -> Option<&FieldSpec> {
        self.field(ID_FIELD)
    }

    pub fn visible_fields(&self, op: Operation) -> impl Iterator<Item = &FieldSpec> {
        self.fields().filter(move |f| permission::is_visible(f, op))
    }

    pub fn required_fields(&self, op: Operation) -> impl Iterator<Item = &FieldSpec> {
        self.fields().filter(move |f| permission::is_required(f, op))
    }

    pub fn projected_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields().filter(|f| permission::is_projected(f))
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields().filter(|f| permission::is_unique(f))
    }

    /// Fields with a unique-value strategy attached.
    pub fn strategy_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields().filter(|f| f.unique_with.is_some())
    }

    pub fn document_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields().filter(|f| f.is_document())
    }
}
