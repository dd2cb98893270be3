//! Store-agnostic predicate trees.

mod compare;
mod operator;
mod path;

pub use compare::PathCompare;
pub use operator::FilterOperator;
pub use path::FieldPath;

use field_value::FieldValue;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Comparison(Comparison),
    /// Some member of the to-many relation at `path` has one of the given identities.
    Members(MembersCondition),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub path: FieldPath,
    pub operator: FilterOperator,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MembersCondition {
    pub path: FieldPath,
    pub ids: Vec<FieldValue>,
}

impl Filter {
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    pub fn empty() -> Self {
        Filter::Empty
    }

    pub fn members(path: FieldPath, ids: Vec<FieldValue>) -> Self {
        Filter::Members(MembersCondition { path, ids })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Filter::Empty) || matches!(self, Filter::And(children) if children.is_empty())
    }

    /// Conjoins two filters, dropping empty sides.
    pub fn conjoin(self, other: Filter) -> Filter {
        match (self, other) {
            (a, b) if b.is_empty() => a,
            (a, b) if a.is_empty() => b,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), b) => {
                left.push(b);
                Filter::And(left)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Every path the filter compares against, leaves first in tree order.
    pub fn paths(&self) -> Vec<&FieldPath> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, acc: &mut Vec<&'a FieldPath>) {
        match self {
            Filter::And(children) | Filter::Or(children) => children.iter().for_each(|c| c.collect_paths(acc)),
            Filter::Not(inner) => inner.collect_paths(acc),
            Filter::Comparison(c) => acc.push(&c.path),
            Filter::Members(m) => acc.push(&m.path),
            Filter::Empty => (),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, children: &[Filter], sep: &str) -> fmt::Result {
            f.write_str("(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")
        }

        match self {
            Filter::And(children) => join(f, children, " AND "),
            Filter::Or(children) => join(f, children, " OR "),
            Filter::Not(inner) => write!(f, "NOT {inner}"),
            Filter::Comparison(c) => write!(f, "{} {} {}", c.path, c.operator, c.value),
            Filter::Members(m) => {
                let ids: Vec<String> = m.ids.iter().map(ToString::to_string).collect();
                write!(f, "{} has member in [{}]", m.path, ids.join(", "))
            }
            Filter::Empty => f.write_str("TRUE"),
        }
    }
}

/// One filtering pass.
///
/// `relation` is the repeated relation the pass constrains, `None` for a pass that only
/// touches single-valued paths.
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateSet {
    pub relation: Option<FieldPath>,
    pub filter: Filter,
}

impl PredicateSet {
    pub fn new(relation: Option<FieldPath>, filter: Filter) -> Self {
        PredicateSet { relation, filter }
    }
}

impl fmt::Display for PredicateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation {
            Some(relation) => write!(f, "[{relation}] {}", self.filter),
            None => write!(f, "{}", self.filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn conjoin_skips_empty_filters() {
        let a = "username".equals("ann");

        assert_eq!(Filter::empty().conjoin(a.clone()), a);
        assert_eq!(a.clone().conjoin(Filter::and(vec![])), a);
        assert_eq!(
            Filter::and(vec![a.clone()]).conjoin("email".equals("a@x.com")),
            Filter::and(vec![a, "email".equals("a@x.com")])
        );
    }

    #[test]
    fn display_reads_like_a_predicate() {
        let filter = Filter::and(vec![
            "group.name".equals("admins"),
            Filter::not(FieldPath::from("username").starts_with("a")),
            Filter::members(FieldPath::from("tags"), vec![1.into(), 2.into()]),
        ]);

        assert_eq!(
            filter.to_string(),
            "(group.name exact admins AND NOT username startswith a AND tags has member in [1, 2])"
        );
    }

    #[test]
    fn paths_are_collected_in_order() {
        let filter = Filter::or(vec!["a.b".equals(1), Filter::not("c".is_null(true))]);
        let paths: Vec<String> = filter.paths().iter().map(ToString::to_string).collect();

        assert_eq!(paths, vec!["a.b", "c"]);
    }
}
