use std::{fmt, str::FromStr};

/// Comparison operators understood by compiled predicates.
///
/// The string form is the suffix used in filter argument names, e.g. `username_startswith`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterOperator {
    Exact,
    IExact,
    Contains,
    IContains,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Range,
    IsNull,
    Search,
    Overlap,
    HasKey,
    HasKeys,
    HasAnyKeys,
    ContainedBy,
    Regex,
    IRegex,
    Year,
    Month,
    Day,
    WeekDay,
    Hour,
    Minute,
    Second,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 30] = [
        FilterOperator::Exact,
        FilterOperator::IExact,
        FilterOperator::Contains,
        FilterOperator::IContains,
        FilterOperator::In,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::StartsWith,
        FilterOperator::IStartsWith,
        FilterOperator::EndsWith,
        FilterOperator::IEndsWith,
        FilterOperator::Range,
        FilterOperator::IsNull,
        FilterOperator::Search,
        FilterOperator::Overlap,
        FilterOperator::HasKey,
        FilterOperator::HasKeys,
        FilterOperator::HasAnyKeys,
        FilterOperator::ContainedBy,
        FilterOperator::Regex,
        FilterOperator::IRegex,
        FilterOperator::Year,
        FilterOperator::Month,
        FilterOperator::Day,
        FilterOperator::WeekDay,
        FilterOperator::Hour,
        FilterOperator::Minute,
        FilterOperator::Second,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            FilterOperator::Exact => "exact",
            FilterOperator::IExact => "iexact",
            FilterOperator::Contains => "contains",
            FilterOperator::IContains => "icontains",
            FilterOperator::In => "in",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::StartsWith => "startswith",
            FilterOperator::IStartsWith => "istartswith",
            FilterOperator::EndsWith => "endswith",
            FilterOperator::IEndsWith => "iendswith",
            FilterOperator::Range => "range",
            FilterOperator::IsNull => "isnull",
            FilterOperator::Search => "search",
            FilterOperator::Overlap => "overlap",
            FilterOperator::HasKey => "has_key",
            FilterOperator::HasKeys => "has_keys",
            FilterOperator::HasAnyKeys => "has_any_keys",
            FilterOperator::ContainedBy => "contained_by",
            FilterOperator::Regex => "regex",
            FilterOperator::IRegex => "iregex",
            FilterOperator::Year => "year",
            FilterOperator::Month => "month",
            FilterOperator::Day => "day",
            FilterOperator::WeekDay => "week_day",
            FilterOperator::Hour => "hour",
            FilterOperator::Minute => "minute",
            FilterOperator::Second => "second",
        }
    }

    /// Operators that compare against parts of dates and times.
    pub fn is_temporal_part(&self) -> bool {
        matches!(
            self,
            FilterOperator::Year
                | FilterOperator::Month
                | FilterOperator::Day
                | FilterOperator::WeekDay
                | FilterOperator::Hour
                | FilterOperator::Minute
                | FilterOperator::Second
        )
    }

    /// Splits a trailing operator suffix off an argument key.
    ///
    /// Returns the remaining field name, the operator (`Exact` when there is none) and whether
    /// the key was negated with `_not`. Longer suffixes are tried first, so `has_any_keys`
    /// never parses as `has_key` followed by garbage.
    pub fn split_key(key: &str) -> (&str, FilterOperator, bool) {
        let (rest, negated) = match key.strip_suffix("_not") {
            Some(rest) if !rest.is_empty() => (rest, true),
            _ => (key, false),
        };

        let operator = Self::ALL
            .iter()
            .filter_map(|op| {
                let field = rest.strip_suffix(op.suffix())?.strip_suffix('_')?;
                (!field.is_empty()).then_some((field, *op))
            })
            .max_by_key(|(_, op)| op.suffix().len());

        match operator {
            Some((field, op)) => (field, op, negated),
            None => (rest, FilterOperator::Exact, negated),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|op| op.suffix() == s)
            .copied()
            .ok_or_else(|| format!("Unknown filter operator `{s}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn split_plain_and_suffixed_keys() {
        assert_eq!(FilterOperator::split_key("username"), ("username", FilterOperator::Exact, false));
        assert_eq!(
            FilterOperator::split_key("username_contains"),
            ("username", FilterOperator::Contains, false)
        );
        assert_eq!(FilterOperator::split_key("username_not"), ("username", FilterOperator::Exact, true));
        assert_eq!(
            FilterOperator::split_key("username_icontains_not"),
            ("username", FilterOperator::IContains, true)
        );
    }

    #[test]
    fn longest_suffix_wins() {
        assert_eq!(
            FilterOperator::split_key("data_has_any_keys"),
            ("data", FilterOperator::HasAnyKeys, false)
        );
        assert_eq!(FilterOperator::split_key("data_has_key"), ("data", FilterOperator::HasKey, false));
        assert_eq!(
            FilterOperator::split_key("date_joined_week_day"),
            ("date_joined", FilterOperator::WeekDay, false)
        );
    }

    #[test]
    fn field_names_that_look_like_suffixes_are_preserved() {
        assert_eq!(FilterOperator::split_key("in"), ("in", FilterOperator::Exact, false));
        assert_eq!(FilterOperator::split_key("not"), ("not", FilterOperator::Exact, false));
        assert_eq!(FilterOperator::split_key("login"), ("login", FilterOperator::Exact, false));
    }
}
