use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use entity_model::filter::FilterOperator;
use field_value::{contains_structure, parse_datetime, FieldValue};
use regex::RegexBuilder;
use std::cmp::Ordering;

type OperatorResult = Result<bool, String>;

/// Applies `operator` to a stored value.
///
/// Nulls only ever match `exact` against null and `isnull`.
pub(crate) fn apply(operator: FilterOperator, actual: &FieldValue, expected: &FieldValue) -> OperatorResult {
    use FilterOperator::*;

    if actual.is_null() && !matches!(operator, Exact | IsNull | In) {
        return Ok(false);
    }

    let matched = match operator {
        Exact => actual == expected,
        IExact => text(actual, expected, |a, b| a.to_lowercase() == b.to_lowercase())?,
        Contains => match (actual, expected) {
            (FieldValue::String(a), FieldValue::String(b)) => a.contains(b.as_str()),
            (FieldValue::String(_), other) => return Err(format!("cannot search text for a {}", other.type_name())),
            (haystack, needle) => contains_structure(haystack, needle),
        },
        IContains | Search => text(actual, expected, |a, b| a.to_lowercase().contains(&b.to_lowercase()))?,
        In => list(expected)?.iter().any(|candidate| candidate == actual),
        Gt => ordered(actual, expected)? == Ordering::Greater,
        Gte => ordered(actual, expected)? != Ordering::Less,
        Lt => ordered(actual, expected)? == Ordering::Less,
        Lte => ordered(actual, expected)? != Ordering::Greater,
        StartsWith => text(actual, expected, |a, b| a.starts_with(b))?,
        IStartsWith => text(actual, expected, |a, b| a.to_lowercase().starts_with(&b.to_lowercase()))?,
        EndsWith => text(actual, expected, |a, b| a.ends_with(b))?,
        IEndsWith => text(actual, expected, |a, b| a.to_lowercase().ends_with(&b.to_lowercase()))?,
        Range => {
            let (low, high) = pair(expected)?;
            ordered(actual, low)? != Ordering::Less && ordered(actual, high)? != Ordering::Greater
        }
        IsNull => match expected {
            FieldValue::Boolean(null) => actual.is_null() == *null,
            other => return Err(format!("isnull takes a boolean, got a {}", other.type_name())),
        },
        Overlap => {
            let (low, high) = pair(expected)?;

            match actual {
                FieldValue::List(bounds) if bounds.len() == 2 => {
                    ordered(&bounds[0], high)? != Ordering::Greater && ordered(low, &bounds[1])? != Ordering::Greater
                }
                value => ordered(value, low)? != Ordering::Less && ordered(value, high)? != Ordering::Greater,
            }
        }
        HasKey => keys(actual, std::slice::from_ref(expected))?.all(|present| present),
        HasKeys => keys(actual, list(expected)?)?.all(|present| present),
        HasAnyKeys => keys(actual, list(expected)?)?.any(|present| present),
        ContainedBy => contains_structure(expected, actual),
        Regex | IRegex => {
            let pattern = expected.as_str().ok_or("regular expressions must be strings")?;
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(operator == IRegex)
                .build()
                .map_err(|err| err.to_string())?;

            actual.as_str().map(|value| regex.is_match(value)).unwrap_or(false)
        }
        Year | Month | Day | WeekDay | Hour | Minute | Second => {
            let expected = expected
                .as_i64()
                .ok_or_else(|| format!("{operator} takes an integer"))?;

            date_part(operator, actual).map(|part| part == expected).unwrap_or(false)
        }
    };

    Ok(matched)
}

fn text(actual: &FieldValue, expected: &FieldValue, f: impl Fn(&str, &str) -> bool) -> OperatorResult {
    match (actual.as_str(), expected.as_str()) {
        (Some(a), Some(b)) => Ok(f(a, b)),
        (None, _) => Ok(false),
        (_, None) => Err(format!("expected a string, got a {}", expected.type_name())),
    }
}

fn list(expected: &FieldValue) -> Result<&[FieldValue], String> {
    expected
        .as_list()
        .map(Vec::as_slice)
        .ok_or_else(|| format!("expected a list, got a {}", expected.type_name()))
}

fn pair(expected: &FieldValue) -> Result<(&FieldValue, &FieldValue), String> {
    match list(expected)? {
        [low, high] => Ok((low, high)),
        other => Err(format!("expected two bounds, got {}", other.len())),
    }
}

fn ordered(actual: &FieldValue, expected: &FieldValue) -> Result<Ordering, String> {
    actual
        .partial_cmp(expected)
        .ok_or_else(|| format!("cannot order a {} against a {}", actual.type_name(), expected.type_name()))
}

fn keys<'a>(actual: &'a FieldValue, names: &'a [FieldValue]) -> Result<impl Iterator<Item = bool> + 'a, String> {
    let object = actual.as_object();
    let names = names
        .iter()
        .map(|name| name.as_str().ok_or("document keys must be strings"))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(names
        .into_iter()
        .map(move |name| object.map(|o| o.contains_key(name)).unwrap_or(false)))
}

fn as_datetime(value: &FieldValue) -> Option<NaiveDateTime> {
    match value {
        FieldValue::DateTime(dt) => Some(dt.naive_local()),
        FieldValue::String(s) => parse_datetime(s)
            .map(|dt| dt.naive_local())
            .ok()
            .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0)),
        _ => None,
    }
}

/// Week days count from Sunday as 1 to Saturday as 7.
fn date_part(operator: FilterOperator, value: &FieldValue) -> Option<i64> {
    let dt = as_datetime(value)?;

    let part = match operator {
        FilterOperator::Year => dt.year() as i64,
        FilterOperator::Month => dt.month() as i64,
        FilterOperator::Day => dt.day() as i64,
        FilterOperator::WeekDay => dt.weekday().number_from_sunday() as i64,
        FilterOperator::Hour => dt.hour() as i64,
        FilterOperator::Minute => dt.minute() as i64,
        FilterOperator::Second => dt.second() as i64,
        _ => return None,
    };

    Some(part)
}
