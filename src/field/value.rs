use crate::field::field_model::FieldValue;

const TRUTHY: &[&str] = &["yes", "on", "1", "true", "checked", "y", "selected"];

/// Whether a requested value means "checked".
///
/// Strings are matched case-insensitively against the truthy words; anything
/// else (including "no", "off", "0", "false" and "") is unchecked.
pub fn is_checked(value: Option<&FieldValue>) -> bool {
    match value {
        None => false,
        Some(FieldValue::Bool(b)) => *b,
        Some(FieldValue::Number(n)) => *n != 0.0 && !n.is_nan(),
        Some(FieldValue::List(items)) => !items.is_empty(),
        Some(FieldValue::Text(s)) => {
            let s = s.trim().to_ascii_lowercase();
            TRUTHY.contains(&s.as_str())
        }
    }
}
