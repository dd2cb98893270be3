use crate::{DocumentError, DocumentResult};
use field_value::FieldValue;
use std::fmt::Write;

/// Renders `value` as a GraphQL input literal.
///
/// Strings are quoted, numbers and booleans left bare. Decimals, dates and uuids are quoted in
/// their canonical text form, the receiving scalar coerces them. Literals carry no type tag, so
/// [`parse_value`](crate::parse_value) reads those back as strings. Object keys are written as
/// given and must be valid names.
pub fn render_literal(value: &FieldValue) -> DocumentResult<String> {
    let rendered = match value {
        FieldValue::String(s) => quote(s),
        FieldValue::Boolean(b) => b.to_string(),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) if f.is_finite() => float(*f),
        FieldValue::Float(f) => return Err(DocumentError::UnsupportedLiteral(f.to_string())),
        FieldValue::Decimal(_) | FieldValue::DateTime(_) | FieldValue::Uuid(_) => quote(&value.to_string()),
        FieldValue::Null => "null".to_owned(),
        FieldValue::List(items) => {
            let items = items.iter().map(render_literal).collect::<DocumentResult<Vec<_>>>()?;
            format!("[{}]", items.join(", "))
        }
        FieldValue::Object(pairs) => {
            let pairs = pairs
                .iter()
                .map(|(key, value)| {
                    if !is_name(key) {
                        return Err(DocumentError::UnsupportedLiteral(key.clone()));
                    }

                    Ok(format!("{key}: {}", render_literal(value)?))
                })
                .collect::<DocumentResult<Vec<_>>>()?;

            format!("{{{}}}", pairs.join(", "))
        }
    };

    Ok(rendered)
}

/// Floats always carry a fraction or exponent, or they would read back as integers.
fn float(f: f64) -> String {
    let rendered = f.to_string();

    if rendered.contains(['.', 'e', 'E']) {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');

    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{:04x}", c as u32);
            }
            c => quoted.push(c),
        }
    }

    quoted.push('"');
    quoted
}

fn is_name(key: &str) -> bool {
    let mut chars = key.chars();

    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
