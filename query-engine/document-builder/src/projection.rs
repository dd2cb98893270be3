use entity_model::{permission, ID_FIELD};
use schema::{ObjectType, QuerySchema, TypeIdentity};

/// Fields selected from a read type, in selection order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projection {
    selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Internal field name.
    pub name: String,
    pub nested: Option<Projection>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.selections.push(Selection {
            name: name.into(),
            nested: None,
        });
        self
    }

    pub fn nested(mut self, name: impl Into<String>, projection: Projection) -> Self {
        self.selections.push(Selection {
            name: name.into(),
            nested: Some(projection),
        });
        self
    }

    /// Builds a projection from dot-separated paths such as `group.name`. Paths sharing a prefix
    /// share the nested selection.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut projection = Projection::new();

        for path in paths {
            let segments: Vec<&str> = path.as_ref().split('.').filter(|s| !s.is_empty()).collect();
            projection.insert(&segments);
        }

        projection
    }

    fn insert(&mut self, segments: &[&str]) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };

        let idx = match self.selections.iter().position(|s| s.name == *head) {
            Some(idx) => idx,
            None => {
                self.selections.push(Selection {
                    name: (*head).to_owned(),
                    nested: None,
                });
                self.selections.len() - 1
            }
        };

        if !rest.is_empty() {
            self.selections[idx].nested.get_or_insert_with(Projection::new).insert(rest);
        }
    }

    /// The same projection with the identity selected first.
    pub fn with_id(mut self) -> Self {
        if !self.selections.iter().any(|s| s.name == ID_FIELD) {
            self.selections.insert(
                0,
                Selection {
                    name: ID_FIELD.to_owned(),
                    nested: None,
                },
            );
        }

        self
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Every projected field of `object`, nested types included. A nested type that already
    /// encloses the selection is only selected by its identity.
    pub fn all(schema: &QuerySchema, object: &ObjectType) -> Self {
        let mut enclosing = Vec::new();
        Self::all_of(schema, object, &mut enclosing)
    }

    fn all_of(schema: &QuerySchema, object: &ObjectType, enclosing: &mut Vec<TypeIdentity>) -> Self {
        let entity = schema.find_entity(&object.identity.entity);
        let mut projection = Projection::new();

        enclosing.push(object.identity.clone());

        for field in &object.fields {
            let projected = entity
                .and_then(|e| e.field(&field.name))
                .map_or(true, permission::is_projected);

            if !projected {
                continue;
            }

            projection = match field.field_type.as_object().and_then(|id| schema.find_type(id)) {
                Some(nested) if enclosing.contains(&nested.identity) => {
                    projection.nested(&field.name, Projection::new().field(ID_FIELD))
                }
                Some(nested) => {
                    let inner = Self::all_of(schema, nested, enclosing);
                    projection.nested(&field.name, inner)
                }
                None => projection.field(&field.name),
            };
        }

        enclosing.pop();

        projection
    }
}
