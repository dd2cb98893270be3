//! Compilation of client filter arguments into ordered predicate sets.
//!
//! Argument keys are field names, optionally followed by an operator suffix and `_not`, e.g.
//! `username_startswith_not`. Values under entity references are either nested argument
//! objects, identities, or for to-many relations lists of members.

mod partition;

use self::partition::{conjunction, Partition};
use entity_model::{
    filter::{FieldPath, Filter, FilterOperator, PathCompare, PredicateSet},
    permission, DataModel, EntitySpec, FieldObject, FieldSpec, FieldValue, Operation, ScalarKind, ValueKind, ID_FIELD,
};
use schema::{is_filterable, operator_spec, FilterProfile, QuerySchema, ResultArity, ValueType};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Entity `{0}` is not part of the data model.")]
    UnknownEntity(String),

    #[error("The filter argument `{argument}` on `{entity}` cannot be compiled: {reason}")]
    PredicateUnsupported {
        entity: String,
        argument: String,
        reason: String,
    },
}

fn unsupported(entity: &EntitySpec, argument: &str, reason: impl Into<String>) -> CompileError {
    CompileError::PredicateUnsupported {
        entity: entity.name.clone(),
        argument: argument.to_owned(),
        reason: reason.into(),
    }
}

type CompileResult<T> = Result<T, CompileError>;

pub struct QueryCompiler<'a> {
    data_model: &'a DataModel,
    profile: FilterProfile,
}

impl<'a> QueryCompiler<'a> {
    /// A compiler accepting exactly the filter arguments the schema declares.
    pub fn new(schema: &'a QuerySchema) -> Self {
        Self::with_profile(schema.data_model(), schema.config().filter_profile)
    }

    pub fn with_profile(data_model: &'a DataModel, profile: FilterProfile) -> Self {
        QueryCompiler { data_model, profile }
    }

    pub fn compile_for(&self, entity: &str, arguments: &FieldObject) -> CompileResult<Vec<PredicateSet>> {
        let entity = self
            .data_model
            .find_entity(entity)
            .ok_or_else(|| CompileError::UnknownEntity(entity.to_owned()))?;

        self.compile(entity, arguments)
    }

    /// Compiles `arguments` into the passes to apply in order.
    ///
    /// The first set carries every comparison on single-valued paths. Each further set
    /// constrains a different member of a to-many relation.
    #[tracing::instrument(skip_all, fields(entity = %entity.name))]
    pub fn compile(&self, entity: &EntitySpec, arguments: &FieldObject) -> CompileResult<Vec<PredicateSet>> {
        let mut partition = Partition::default();

        self.compile_object(entity, &FieldPath::root(), None, arguments, &mut partition)?;

        let sets = partition.into_sets();
        tracing::debug!(passes = sets.len(), "compiled filter arguments");

        Ok(sets)
    }

    fn compile_object(
        &self,
        entity: &EntitySpec,
        prefix: &FieldPath,
        relation: Option<&FieldPath>,
        arguments: &FieldObject,
        out: &mut Partition,
    ) -> CompileResult<()> {
        for (key, value) in arguments {
            self.compile_argument(entity, prefix, relation, key, value, out)?;
        }

        Ok(())
    }

    fn compile_argument(
        &self,
        entity: &EntitySpec,
        prefix: &FieldPath,
        relation: Option<&FieldPath>,
        key: &str,
        value: &FieldValue,
        out: &mut Partition,
    ) -> CompileResult<()> {
        let (name, operator, negated) = match entity.field(key) {
            Some(_) => (key, FilterOperator::Exact, false),
            None => FilterOperator::split_key(key),
        };

        let explicit = key.len() != name.len() + if negated { "_not".len() } else { 0 };

        let field = match entity.field(name) {
            Some(field) => Some(field),
            None if name == ID_FIELD => None,
            None => return Err(unsupported(entity, key, format!("`{name}` is not a field of `{}`", entity.name))),
        };

        if let Some(field) = field {
            if !permission::is_visible(field, Operation::Read) {
                return Err(unsupported(entity, key, format!("`{name}` is not readable")));
            }
        }

        if !is_filterable(name) {
            return Err(unsupported(entity, key, format!("`{name}` does not take filters")));
        }

        let path = prefix.child(name);
        let reference = field.filter(|f| f.kind.is_entity_ref());

        match reference {
            Some(field) if field.is_to_many() => {
                let target = self.target(entity, key, field)?;
                self.compile_to_many(entity, target, key, path, operator, negated, value, out)
            }
            Some(field) => {
                let target = self.target(entity, key, field)?;
                self.compile_to_one(entity, target, key, path, relation, operator, negated, value, out)
            }
            None => {
                let kind = field.and_then(|f| f.kind.as_scalar());
                let filter = self.scalar_comparison(entity, key, &path, kind, operator, explicit, value)?;

                out.push(relation, negate(filter, negated));
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn scalar_comparison(
        &self,
        entity: &EntitySpec,
        key: &str,
        path: &FieldPath,
        kind: Option<ScalarKind>,
        operator: FilterOperator,
        explicit: bool,
        value: &FieldValue,
    ) -> CompileResult<Filter> {
        // Documents match on partial structure unless told otherwise.
        let operator = match kind {
            Some(ScalarKind::Document) if !explicit => FilterOperator::Contains,
            _ => operator,
        };

        if operator == FilterOperator::Exact {
            return Ok(path.equals(value.clone()));
        }

        let spec = operator_spec(operator).ok_or_else(|| unsupported(entity, key, format!("`{operator}` is unknown")))?;

        if let Some(kind) = kind {
            if !spec.allows(kind) {
                let reason = format!("`{operator}` does not apply to {} fields", kind.type_name());
                return Err(unsupported(entity, key, reason));
            }
        }

        if !self.profile.includes(operator) {
            return Err(unsupported(entity, key, format!("`{operator}` is not enabled")));
        }

        let shape_matches = match (spec.arity, value) {
            (ResultArity::List, FieldValue::List(_)) => true,
            (ResultArity::Pair, FieldValue::List(bounds)) => bounds.len() == 2,
            (ResultArity::Scalar, FieldValue::Boolean(_)) => true,
            (ResultArity::Scalar, _) => spec.value != ValueType::Boolean,
            _ => false,
        };

        if !shape_matches {
            let reason = format!("`{operator}` cannot take a {} value", value.type_name());
            return Err(unsupported(entity, key, reason));
        }

        Ok(path.compare(operator, value.clone()))
    }

    #[allow(clippy::too_many_arguments)]
    fn compile_to_one(
        &self,
        entity: &EntitySpec,
        target: &EntitySpec,
        key: &str,
        path: FieldPath,
        relation: Option<&FieldPath>,
        operator: FilterOperator,
        negated: bool,
        value: &FieldValue,
        out: &mut Partition,
    ) -> CompileResult<()> {
        let filter = match (operator, value) {
            (FilterOperator::Exact, FieldValue::Object(nested)) if negated => {
                let mut inner = Partition::default();
                self.compile_object(target, &path, relation, nested, &mut inner)?;

                let filters = inner
                    .into_confined(relation)
                    .ok_or_else(|| unsupported(entity, key, "negated filters cannot span to-many relations"))?;

                Filter::not(conjunction(filters))
            }
            (FilterOperator::Exact, FieldValue::Object(nested)) => {
                return self.compile_object(target, &path, relation, nested, out);
            }
            (FilterOperator::IsNull, FieldValue::Boolean(null)) => negate(path.is_null(*null), negated),
            (FilterOperator::Exact, identity) => negate(path.child(ID_FIELD).equals(identity.clone()), negated),
            (FilterOperator::In, members) => {
                let ids = member_ids(members).map_err(|reason| unsupported(entity, key, reason))?;
                negate(path.child(ID_FIELD).is_in(ids), negated)
            }
            (operator, _) => {
                let reason = format!("`{operator}` does not apply to a reference to `{}`", target.name);
                return Err(unsupported(entity, key, reason));
            }
        };

        out.push(relation, filter);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn compile_to_many(
        &self,
        entity: &EntitySpec,
        target: &EntitySpec,
        key: &str,
        path: FieldPath,
        operator: FilterOperator,
        negated: bool,
        value: &FieldValue,
        out: &mut Partition,
    ) -> CompileResult<()> {
        match (operator, value) {
            (FilterOperator::In, members) => {
                let ids = member_ids(members).map_err(|reason| unsupported(entity, key, reason))?;
                let filter = negate(Filter::members(path.clone(), ids), negated);

                // An exclusion covers every member, so it never shares a member with other conditions.
                if negated {
                    let mut separate = Partition::default();
                    separate.push(Some(&path), filter);
                    out.push_member(separate);
                } else {
                    out.push(Some(&path), filter);
                }
            }
            (FilterOperator::Exact, FieldValue::Object(nested)) if !negated => {
                self.compile_object(target, &path, Some(&path), nested, out)?;
            }
            (FilterOperator::Exact, FieldValue::List(members)) if !negated && members.is_empty() => {
                out.push(Some(&path), Filter::members(path.clone(), Vec::new()));
            }
            (FilterOperator::Exact, FieldValue::List(members)) if !negated => {
                for member in members {
                    let nested = member
                        .as_object()
                        .ok_or_else(|| unsupported(entity, key, "members must be given as argument objects"))?;

                    let mut separate = Partition::default();
                    self.compile_object(target, &path, Some(&path), nested, &mut separate)?;
                    out.push_member(separate);
                }
            }
            (operator, _) => {
                let reason = format!(
                    "`{operator}` cannot compare the to-many relation `{path}`, filter on its fields or use `{path}_in`"
                );
                return Err(unsupported(entity, key, reason));
            }
        }

        Ok(())
    }

    fn target(&self, entity: &EntitySpec, key: &str, field: &FieldSpec) -> CompileResult<&'a EntitySpec> {
        self.data_model
            .target_of(field)
            .map(|target| target.as_ref())
            .ok_or_else(|| match &field.kind {
                ValueKind::NestedRef(target) | ValueKind::LazyRef(target) => {
                    unsupported(entity, key, format!("`{target}` is not part of the data model"))
                }
                ValueKind::Scalar(_) => unsupported(entity, key, "not a reference"),
            })
    }
}

fn negate(filter: Filter, negated: bool) -> Filter {
    if negated {
        Filter::not(filter)
    } else {
        filter
    }
}

/// Identities of the given members: the `id` of argument objects, scalars as they are.
fn member_ids(value: &FieldValue) -> Result<Vec<FieldValue>, String> {
    let members = value.as_list().ok_or("expected a list of members")?;

    members
        .iter()
        .map(|member| match member {
            FieldValue::Object(_) => member.id().cloned().ok_or_else(|| "a member has no id".to_owned()),
            FieldValue::List(_) => Err("members cannot be lists".to_owned()),
            scalar => Ok(scalar.clone()),
        })
        .collect()
}
