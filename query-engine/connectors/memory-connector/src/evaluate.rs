use crate::{operators, store::Tables};
use entity_model::{
    filter::{FieldPath, Filter},
    DataModel, EntitySpec, FieldSpec, FieldValue, ID_FIELD,
};
use field_value::FieldObject;
use query_connector::error::{ConnectorError, ErrorKind};

/// The related member currently bound for each to-many path of a filter.
type Binding<'a> = Vec<(FieldPath, Option<&'a FieldObject>)>;

/// Evaluates filters against the rows of one entity.
pub(crate) struct Evaluator<'a> {
    data_model: &'a DataModel,
    tables: &'a Tables,
    root: &'a EntitySpec,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(data_model: &'a DataModel, tables: &'a Tables, root: &'a EntitySpec) -> Self {
        Evaluator {
            data_model,
            tables,
            root,
        }
    }

    /// Number of related member combinations under which `row` satisfies `filter`.
    ///
    /// A row without any to-many condition matches at most once. A to-many relation without
    /// members binds nothing, like an outer join. Negations over relations left unbound never fan
    /// out, they hold when no member satisfies the negated filter.
    pub(crate) fn matches(&self, row: &'a FieldObject, filter: &Filter) -> crate::Result<usize> {
        let relations = self.to_many_paths(filter)?;
        let mut binding = Binding::with_capacity(relations.len());

        self.count_bindings(row, filter, &relations, &mut binding)
    }

    fn count_bindings(
        &self,
        row: &'a FieldObject,
        filter: &Filter,
        relations: &[FieldPath],
        binding: &mut Binding<'a>,
    ) -> crate::Result<usize> {
        let Some((relation, rest)) = relations.split_first() else {
            return Ok(usize::from(self.eval(row, filter, binding)?));
        };

        let members = self.members(row, relation, binding)?;

        if members.is_empty() {
            binding.push((relation.clone(), None));
            let count = self.count_bindings(row, filter, rest, binding);
            binding.pop();

            return count;
        }

        let mut count = 0;

        for member in members {
            binding.push((relation.clone(), Some(member)));
            let matched = self.count_bindings(row, filter, rest, binding);
            binding.pop();

            count += matched?;
        }

        Ok(count)
    }

    /// Every to-many prefix of the filter's paths outside of negations, parents before children.
    fn to_many_paths(&self, filter: &Filter) -> crate::Result<Vec<FieldPath>> {
        let mut relations: Vec<FieldPath> = Vec::new();

        for path in unnegated_paths(filter) {
            let mut entity = self.root;

            for (i, segment) in path.segments().iter().enumerate() {
                let Some(field) = self.field(entity, segment)? else { break };

                if !field.kind.is_entity_ref() {
                    break;
                }

                if field.is_to_many() {
                    let prefix = FieldPath::new(path.segments()[..=i].iter().cloned());

                    if !relations.contains(&prefix) {
                        relations.push(prefix);
                    }
                }

                entity = self.target(entity, field)?;
            }
        }

        Ok(relations)
    }

    fn eval(&self, row: &'a FieldObject, filter: &Filter, binding: &Binding<'a>) -> crate::Result<bool> {
        match filter {
            Filter::And(children) => {
                for child in children {
                    if !self.eval(row, child, binding)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            Filter::Or(children) => {
                for child in children {
                    if self.eval(row, child, binding)? {
                        return Ok(true);
                    }
                }

                Ok(false)
            }
            Filter::Not(inner) => {
                // Relations the enclosing filter has not bound must have no satisfying member.
                let relations: Vec<FieldPath> = self
                    .to_many_paths(inner)?
                    .into_iter()
                    .filter(|relation| bound(binding, relation.segments()).is_none())
                    .collect();

                if relations.is_empty() {
                    return Ok(!self.eval(row, inner, binding)?);
                }

                let mut scoped = binding.clone();
                let satisfied = self.count_bindings(row, inner, &relations, &mut scoped)?;

                Ok(satisfied == 0)
            }
            Filter::Comparison(comparison) => {
                let actual = self.value_at(row, &comparison.path, binding)?;

                operators::apply(comparison.operator, &actual, &comparison.value).map_err(|reason| {
                    ConnectorError::from_kind(ErrorKind::UnsupportedFilter {
                        entity: self.root.name.clone(),
                        path: comparison.path.clone(),
                        operator: comparison.operator,
                        reason,
                    })
                })
            }
            Filter::Members(members) => {
                let bound = bound(binding, members.path.segments()).flatten();
                let id = bound.and_then(|member| member.get(ID_FIELD));

                Ok(id.map(|id| members.ids.contains(id)).unwrap_or(false))
            }
            Filter::Empty => Ok(true),
        }
    }

    /// The value stored at `path`, `Null` when any reference on the way is unset.
    fn value_at(&self, row: &'a FieldObject, path: &FieldPath, binding: &Binding<'a>) -> crate::Result<FieldValue> {
        let Some((last, parents)) = path.segments().split_last() else {
            return Ok(FieldValue::Null);
        };

        let Some((entity, current)) = self.follow(row, parents, binding)? else {
            return Ok(FieldValue::Null);
        };

        let value = match self.field(entity, last)? {
            Some(field) if field.is_to_many() => bound(binding, path.segments())
                .flatten()
                .and_then(|member| member.get(ID_FIELD)),
            Some(field) if field.kind.is_entity_ref() => current.get(&field.foreign_key()),
            _ => current.get(last.as_str()),
        };

        Ok(value.cloned().unwrap_or(FieldValue::Null))
    }

    /// Follows the reference segments in `path` from the root row. To-many segments use the
    /// member bound for that prefix.
    fn follow(
        &self,
        row: &'a FieldObject,
        path: &[String],
        binding: &Binding<'a>,
    ) -> crate::Result<Option<(&'a EntitySpec, &'a FieldObject)>> {
        let mut entity = self.root;
        let mut current = row;

        for (i, segment) in path.iter().enumerate() {
            let field = self.field(entity, segment)?.ok_or_else(|| unknown_field(entity, segment))?;
            let target = self.target(entity, field)?;

            let next = if field.is_to_many() {
                bound(binding, &path[..=i]).flatten()
            } else {
                current
                    .get(&field.foreign_key())
                    .and_then(|id| self.find(&target.name, id))
            };

            match next {
                Some(row) => {
                    current = row;
                    entity = target;
                }
                None => return Ok(None),
            }
        }

        Ok(Some((entity, current)))
    }

    fn members(&self, row: &'a FieldObject, relation: &FieldPath, binding: &Binding<'a>) -> crate::Result<Vec<&'a FieldObject>> {
        let Some((last, parents)) = relation.segments().split_last() else {
            return Ok(Vec::new());
        };

        let Some((entity, current)) = self.follow(row, parents, binding)? else {
            return Ok(Vec::new());
        };

        let field = self.field(entity, last)?.ok_or_else(|| unknown_field(entity, last))?;
        let target = self.target(entity, field)?;

        let ids = current.get(&field.name).and_then(FieldValue::as_list);
        let members = ids
            .into_iter()
            .flatten()
            .filter_map(|id| self.find(&target.name, id))
            .collect();

        Ok(members)
    }

    fn find(&self, entity: &str, id: &FieldValue) -> Option<&'a FieldObject> {
        self.tables
            .get(entity)?
            .rows
            .iter()
            .find(|row| row.get(ID_FIELD) == Some(id))
    }

    /// The declared field, or `None` for an undeclared identity field.
    fn field(&self, entity: &'a EntitySpec, name: &str) -> crate::Result<Option<&'a FieldSpec>> {
        match entity.field(name) {
            Some(field) => Ok(Some(field)),
            None if name == ID_FIELD => Ok(None),
            None => Err(unknown_field(entity, name)),
        }
    }

    fn target(&self, entity: &EntitySpec, field: &FieldSpec) -> crate::Result<&'a EntitySpec> {
        self.data_model
            .target_of(field)
            .map(|target| target.as_ref())
            .ok_or_else(|| unknown_field(entity, &field.name))
    }
}

/// Paths of `filter` that are not beneath a `Not`.
fn unnegated_paths(filter: &Filter) -> Vec<&FieldPath> {
    fn collect<'f>(filter: &'f Filter, acc: &mut Vec<&'f FieldPath>) {
        match filter {
            Filter::And(children) | Filter::Or(children) => children.iter().for_each(|c| collect(c, acc)),
            Filter::Comparison(c) => acc.push(&c.path),
            Filter::Members(m) => acc.push(&m.path),
            Filter::Not(_) | Filter::Empty => (),
        }
    }

    let mut paths = Vec::new();
    collect(filter, &mut paths);
    paths
}

fn bound<'a>(binding: &Binding<'a>, prefix: &[String]) -> Option<Option<&'a FieldObject>> {
    binding
        .iter()
        .find(|(path, _)| path.segments() == prefix)
        .map(|(_, member)| *member)
}

fn unknown_field(entity: &EntitySpec, field: &str) -> ConnectorError {
    ConnectorError::from_kind(ErrorKind::UnknownField {
        entity: entity.name.clone(),
        field: field.to_owned(),
    })
}
