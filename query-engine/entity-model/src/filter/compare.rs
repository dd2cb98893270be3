use super::*;
use field_value::FieldValue;

/// Comparison shorthands building filters on a path.
///
/// On `&str` receivers the inherent `str::contains` and `str::starts_with` shadow the methods of
/// the same name, so those two need a [`FieldPath`] receiver.
pub trait PathCompare {
    fn compare<T>(&self, operator: FilterOperator, val: T) -> Filter
    where
        T: Into<FieldValue>;

    fn equals<T>(&self, val: T) -> Filter
    where
        T: Into<FieldValue>,
    {
        self.compare(FilterOperator::Exact, val)
    }

    fn not_equals<T>(&self, val: T) -> Filter
    where
        T: Into<FieldValue>,
    {
        Filter::not(self.equals(val))
    }

    fn is_in<T>(&self, values: Vec<T>) -> Filter
    where
        T: Into<FieldValue>,
    {
        let list: Vec<FieldValue> = values.into_iter().map(Into::into).collect();
        self.compare(FilterOperator::In, FieldValue::List(list))
    }

    fn contains<T>(&self, val: T) -> Filter
    where
        T: Into<FieldValue>,
    {
        self.compare(FilterOperator::Contains, val)
    }

    fn starts_with<T>(&self, val: T) -> Filter
    where
        T: Into<FieldValue>,
    {
        self.compare(FilterOperator::StartsWith, val)
    }

    fn greater_than<T>(&self, val: T) -> Filter
    where
        T: Into<FieldValue>,
    {
        self.compare(FilterOperator::Gt, val)
    }

    fn less_than<T>(&self, val: T) -> Filter
    where
        T: Into<FieldValue>,
    {
        self.compare(FilterOperator::Lt, val)
    }

    fn is_null(&self, null: bool) -> Filter {
        self.compare(FilterOperator::IsNull, null)
    }
}

impl PathCompare for FieldPath {
    fn compare<T>(&self, operator: FilterOperator, val: T) -> Filter
    where
        T: Into<FieldValue>,
    {
        Filter::Comparison(Comparison {
            path: self.clone(),
            operator,
            value: val.into(),
        })
    }
}

impl PathCompare for &str {
    fn compare<T>(&self, operator: FilterOperator, val: T) -> Filter
    where
        T: Into<FieldValue>,
    {
        FieldPath::from(*self).compare(operator, val)
    }
}
