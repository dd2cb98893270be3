//! Derivation of `{field}_{suffix}` filter arguments from a field's scalar kind.

use crate::TypeRef;
use entity_model::{filter::FilterOperator, ScalarKind};
use indexmap::IndexMap;
use serde::Deserialize;

/// Shape of the value an operator takes, relative to the field's own type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultArity {
    Scalar,
    List,
    Pair,
}

/// Type of the value an operator compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// The field's own scalar kind.
    Field,
    Boolean,
    Int,
    String,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterOperatorSpec {
    pub operator: FilterOperator,
    /// `None` allows every scalar kind.
    pub allowed: Option<&'static [ScalarKind]>,
    pub value: ValueType,
    pub arity: ResultArity,
    pub negatable: bool,
}

impl FilterOperatorSpec {
    const fn new(operator: FilterOperator) -> Self {
        FilterOperatorSpec {
            operator,
            allowed: None,
            value: ValueType::Field,
            arity: ResultArity::Scalar,
            negatable: true,
        }
    }

    const fn allowed(mut self, kinds: &'static [ScalarKind]) -> Self {
        self.allowed = Some(kinds);
        self
    }

    const fn value(mut self, value: ValueType) -> Self {
        self.value = value;
        self
    }

    const fn arity(mut self, arity: ResultArity) -> Self {
        self.arity = arity;
        self
    }

    pub fn allows(&self, kind: ScalarKind) -> bool {
        self.allowed.map(|kinds| kinds.contains(&kind)).unwrap_or(true)
    }

    /// Argument type for a field of the given kind.
    pub fn argument_type(&self, kind: ScalarKind) -> TypeRef {
        let inner = match self.value {
            ValueType::Field => TypeRef::Scalar(kind),
            ValueType::Boolean => TypeRef::Scalar(ScalarKind::Boolean),
            ValueType::Int => TypeRef::Scalar(ScalarKind::Int),
            ValueType::String => TypeRef::Scalar(ScalarKind::String),
        };

        match self.arity {
            ResultArity::Scalar => inner,
            ResultArity::List => TypeRef::list(inner),
            ResultArity::Pair => TypeRef::pair(inner),
        }
    }
}

const ORDERED: &[ScalarKind] = &[
    ScalarKind::Int,
    ScalarKind::Float,
    ScalarKind::Decimal,
    ScalarKind::DateTime,
    ScalarKind::Date,
    ScalarKind::Time,
];
const TEXT: &[ScalarKind] = &[ScalarKind::String];
const DATES: &[ScalarKind] = &[ScalarKind::Date, ScalarKind::DateTime];
const DATETIMES: &[ScalarKind] = &[ScalarKind::DateTime];
const DOCUMENTS: &[ScalarKind] = &[ScalarKind::Document];

pub static OPERATOR_TABLE: &[FilterOperatorSpec] = &[
    FilterOperatorSpec::new(FilterOperator::Exact),
    FilterOperatorSpec::new(FilterOperator::IExact).allowed(TEXT),
    FilterOperatorSpec::new(FilterOperator::Contains),
    FilterOperatorSpec::new(FilterOperator::IContains).allowed(TEXT),
    FilterOperatorSpec::new(FilterOperator::In).arity(ResultArity::List),
    FilterOperatorSpec::new(FilterOperator::Gt).allowed(ORDERED),
    FilterOperatorSpec::new(FilterOperator::Gte).allowed(ORDERED),
    FilterOperatorSpec::new(FilterOperator::Lt).allowed(ORDERED),
    FilterOperatorSpec::new(FilterOperator::Lte).allowed(ORDERED),
    FilterOperatorSpec::new(FilterOperator::StartsWith).allowed(TEXT),
    FilterOperatorSpec::new(FilterOperator::IStartsWith).allowed(TEXT),
    FilterOperatorSpec::new(FilterOperator::EndsWith).allowed(TEXT),
    FilterOperatorSpec::new(FilterOperator::IEndsWith).allowed(TEXT),
    FilterOperatorSpec::new(FilterOperator::Range).arity(ResultArity::Pair),
    FilterOperatorSpec::new(FilterOperator::IsNull).value(ValueType::Boolean),
    FilterOperatorSpec::new(FilterOperator::Search).allowed(TEXT),
    FilterOperatorSpec::new(FilterOperator::Overlap).allowed(DATES).arity(ResultArity::Pair),
    FilterOperatorSpec::new(FilterOperator::HasKey).allowed(DOCUMENTS).value(ValueType::String),
    FilterOperatorSpec::new(FilterOperator::HasKeys)
        .allowed(DOCUMENTS)
        .value(ValueType::String)
        .arity(ResultArity::List),
    FilterOperatorSpec::new(FilterOperator::HasAnyKeys)
        .allowed(DOCUMENTS)
        .value(ValueType::String)
        .arity(ResultArity::List),
    FilterOperatorSpec::new(FilterOperator::ContainedBy),
    FilterOperatorSpec::new(FilterOperator::Regex).allowed(TEXT),
    FilterOperatorSpec::new(FilterOperator::IRegex).allowed(TEXT),
    FilterOperatorSpec::new(FilterOperator::Year).allowed(DATES).value(ValueType::Int),
    FilterOperatorSpec::new(FilterOperator::Month).allowed(DATES).value(ValueType::Int),
    FilterOperatorSpec::new(FilterOperator::Day).allowed(DATES).value(ValueType::Int),
    FilterOperatorSpec::new(FilterOperator::WeekDay).allowed(DATES).value(ValueType::Int),
    FilterOperatorSpec::new(FilterOperator::Hour).allowed(DATETIMES).value(ValueType::Int),
    FilterOperatorSpec::new(FilterOperator::Minute).allowed(DATETIMES).value(ValueType::Int),
    FilterOperatorSpec::new(FilterOperator::Second).allowed(DATETIMES).value(ValueType::Int),
];

pub fn operator_spec(operator: FilterOperator) -> Option<&'static FilterOperatorSpec> {
    OPERATOR_TABLE.iter().find(|spec| spec.operator == operator)
}

/// Structural and bookkeeping fields that never receive filters.
pub const EXCLUDED_FIELDS: &[&str] = &["page", "page_size", "order_by", "revision", "version_number", "revision_id"];

/// Which operators are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterProfile {
    /// Small set for fast test setups.
    Minimal,
    #[default]
    Standard,
    Extended,
}

const MINIMAL: &[FilterOperator] = &[FilterOperator::Contains, FilterOperator::In];

const STANDARD: &[FilterOperator] = &[
    FilterOperator::Exact,
    FilterOperator::Contains,
    FilterOperator::In,
    FilterOperator::Gt,
    FilterOperator::Gte,
    FilterOperator::Lt,
    FilterOperator::Lte,
    FilterOperator::StartsWith,
    FilterOperator::EndsWith,
    FilterOperator::Range,
    FilterOperator::IsNull,
    FilterOperator::Search,
    FilterOperator::Overlap,
    FilterOperator::HasKey,
];

impl FilterProfile {
    pub fn includes(&self, operator: FilterOperator) -> bool {
        match self {
            FilterProfile::Minimal => MINIMAL.contains(&operator),
            FilterProfile::Standard => STANDARD.contains(&operator),
            FilterProfile::Extended => true,
        }
    }

    pub fn operators(&self) -> impl Iterator<Item = &'static FilterOperatorSpec> + '_ {
        OPERATOR_TABLE.iter().filter(|spec| self.includes(spec.operator))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterArgument {
    pub name: String,
    /// The field the argument filters on.
    pub field: String,
    pub operator: FilterOperator,
    pub negated: bool,
    pub arg_type: TypeRef,
}

pub type FilterArgumentMap = IndexMap<String, FilterArgument>;

pub fn is_filterable(field_name: &str) -> bool {
    !EXCLUDED_FIELDS.contains(&field_name)
}

fn push(args: &mut FilterArgumentMap, name: String, field: &str, operator: FilterOperator, negated: bool, arg_type: TypeRef) {
    args.insert(
        name.clone(),
        FilterArgument {
            name,
            field: field.to_owned(),
            operator,
            negated,
            arg_type,
        },
    );
}

/// The bare field argument, its `_not` sibling and every `{field}_{suffix}` and
/// `{field}_{suffix}_not` argument the profile allows for the kind.
pub fn scalar_filters(field_name: &str, kind: ScalarKind, profile: FilterProfile) -> FilterArgumentMap {
    let mut args = FilterArgumentMap::new();

    if !is_filterable(field_name) {
        return args;
    }

    let exact = FilterOperator::Exact;
    push(&mut args, field_name.to_owned(), field_name, exact, false, TypeRef::Scalar(kind));
    push(&mut args, format!("{field_name}_not"), field_name, exact, true, TypeRef::Scalar(kind));

    for spec in profile.operators().filter(|spec| spec.allows(kind)) {
        let name = format!("{field_name}_{}", spec.operator.suffix());
        let arg_type = spec.argument_type(kind);

        if spec.negatable {
            push(&mut args, format!("{name}_not"), field_name, spec.operator, true, arg_type.clone());
        }

        push(&mut args, name, field_name, spec.operator, false, arg_type);
    }

    args.sort_by(|a, _, b, _| a.cmp(b));
    args
}

/// Arguments for an entity reference: the nested filter object itself, plus `{field}_in` and
/// its negation for to-many relations.
pub fn relation_filters(field_name: &str, nested: TypeRef, to_many: bool) -> FilterArgumentMap {
    let mut args = FilterArgumentMap::new();

    if !is_filterable(field_name) {
        return args;
    }

    let exact = FilterOperator::Exact;
    let field_type = if to_many { TypeRef::list(nested.clone()) } else { nested.clone() };
    push(&mut args, field_name.to_owned(), field_name, exact, false, field_type);

    if to_many {
        let members = TypeRef::list(nested);
        push(&mut args, format!("{field_name}_in"), field_name, FilterOperator::In, false, members.clone());
        push(&mut args, format!("{field_name}_in_not"), field_name, FilterOperator::In, true, members);
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(args: &FilterArgumentMap) -> Vec<&str> {
        args.keys().map(String::as_str).collect()
    }

    #[test]
    fn minimal_string_filters() {
        let args = scalar_filters("username", ScalarKind::String, FilterProfile::Minimal);

        assert_eq!(
            names(&args),
            vec![
                "username",
                "username_contains",
                "username_contains_not",
                "username_in",
                "username_in_not",
                "username_not",
            ]
        );
        assert_eq!(args["username_in"].arg_type.to_string(), "[String]");
        assert!(args["username_not"].negated);
    }

    #[test]
    fn string_operators_are_not_offered_for_ints() {
        let args = scalar_filters("age", ScalarKind::Int, FilterProfile::Standard);

        assert!(args.contains_key("age_gte"));
        assert!(args.contains_key("age_range"));
        assert!(!args.contains_key("age_startswith"));
        assert!(!args.contains_key("age_has_key"));
        assert_eq!(args["age_range"].arg_type, TypeRef::pair(TypeRef::Scalar(ScalarKind::Int)));
        assert_eq!(args["age_isnull"].arg_type, TypeRef::Scalar(ScalarKind::Boolean));
    }

    #[test]
    fn document_fields_get_key_operators() {
        let args = scalar_filters("data", ScalarKind::Document, FilterProfile::Extended);

        assert_eq!(args["data_has_key"].arg_type.to_string(), "String");
        assert_eq!(args["data_has_any_keys"].arg_type.to_string(), "[String]");
        assert!(!args.contains_key("data_year"));
    }

    #[test]
    fn every_operator_has_a_negated_sibling() {
        let args = scalar_filters("date_joined", ScalarKind::DateTime, FilterProfile::Extended);

        for (name, arg) in args.iter().filter(|(_, a)| !a.negated) {
            assert!(args.contains_key(&format!("{name}_not")), "{name} has no negation");
            assert_eq!(arg.field, "date_joined");
        }
    }

    #[test]
    fn structural_fields_are_never_filtered() {
        assert!(scalar_filters("order_by", ScalarKind::String, FilterProfile::Extended).is_empty());
        assert!(scalar_filters("revision", ScalarKind::Int, FilterProfile::Standard).is_empty());
    }
}
