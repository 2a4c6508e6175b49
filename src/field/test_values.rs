use crate::field::field_model::{Field, FieldOption, FieldType, FieldValue};

/// One-pixel transparent PNG.
pub const SAMPLE_FILE_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Sample value for test mode, chosen from type, label and options.
pub fn test_value_for(field: &Field) -> FieldValue {
    match field.field_type {
        FieldType::Select => {
            let first = first_real_option(field.options.as_deref().unwrap_or(&[]));
            let multiple = field
                .metadata
                .as_ref()
                .and_then(|m| m.is_multiple)
                .unwrap_or(false);
            match (first, multiple) {
                (Some(v), true) => FieldValue::List(vec![v]),
                (Some(v), false) => FieldValue::Text(v),
                (None, _) => FieldValue::Text(String::new()),
            }
        }
        FieldType::Radio if field.is_group() => FieldValue::Text(
            first_real_option(field.options.as_deref().unwrap_or(&[])).unwrap_or_default(),
        ),
        FieldType::Checkbox if field.is_group() => FieldValue::List(
            first_real_option(field.options.as_deref().unwrap_or(&[]))
                .into_iter()
                .collect(),
        ),
        FieldType::Checkbox | FieldType::Radio | FieldType::Switch => FieldValue::Bool(true),
        FieldType::File => FieldValue::Text(SAMPLE_FILE_URL.to_string()),
        other => FieldValue::Text(guess_value(&field.label, other)),
    }
}

fn first_real_option(options: &[FieldOption]) -> Option<String> {
    options
        .iter()
        .find(|o| !o.value.trim().is_empty() && !is_placeholder_text(&o.text))
        .map(|o| o.value.clone())
}

/// Option texts like "Select…", "-- choose --" or "Please pick one".
pub fn is_placeholder_text(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    t.is_empty()
        || t.starts_with("select")
        || t.starts_with("choose")
        || t.starts_with("please")
        || t.starts_with("--")
        || t == "none"
        || t == "-"
}

/// Derive a sensible fill value from the field's label and type.
pub fn guess_value(label: &str, field_type: FieldType) -> String {
    let l = label.to_lowercase();

    // Typed inputs whose format is fixed take the per-type sample directly
    match field_type {
        FieldType::Date => return "2025-01-15".into(),
        FieldType::Time => return "12:30".into(),
        FieldType::DatetimeLocal => return "2025-01-15T12:30".into(),
        FieldType::Month => return "2025-01".into(),
        FieldType::Week => return "2025-W03".into(),
        FieldType::Color => return "#336699".into(),
        FieldType::Range => return "50".into(),
        _ => {}
    }

    // Label-based heuristics (checked in order)
    if l.contains("email") {
        return "user@example.com".into();
    }
    if l.contains("password") {
        return "TestPass123!".into();
    }
    if l.contains("phone") || l.contains("tel") {
        return "555-0100".into();
    }
    if l.contains("url") || l.contains("website") {
        return "https://example.com".into();
    }
    if l.contains("zip") || l.contains("postal") {
        return "90210".into();
    }
    if l.contains("username") || l.contains("user") {
        return "testuser".into();
    }
    if l.contains("name") {
        return "Jane Doe".into();
    }
    if l.contains("search") || l.contains("query") {
        return "test query".into();
    }
    if l.contains("date") {
        return "2025-01-15".into();
    }
    if l.contains("number") || l.contains("amount") || l.contains("quantity") {
        return "42".into();
    }

    // Fallback to field type
    match field_type {
        FieldType::Email => "user@example.com".into(),
        FieldType::Password => "TestPass123!".into(),
        FieldType::Tel => "555-0100".into(),
        FieldType::Url => "https://example.com".into(),
        FieldType::Number => "42".into(),
        FieldType::Search => "test query".into(),
        FieldType::Textarea | FieldType::ContentEditable => "Sample text".into(),
        _ => "test".into(),
    }
}
