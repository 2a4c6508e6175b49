use once_cell::sync::Lazy;
use tracing::debug;

use crate::dom::selector::{SelectorList, parse_selector};

/// Ordered whitelist of selectors for things that behave like form fields.
pub const FIELD_SELECTORS: &[&str] = &[
    // Native controls
    r#"input:not([type="hidden" i]):not([type="submit" i]):not([type="button" i]):not([type="reset" i]):not([type="image" i])"#,
    "select",
    "textarea",
    // ARIA widgets
    r#"[role="textbox"]"#,
    r#"[role="combobox"]"#,
    r#"[role="spinbutton"]"#,
    r#"[role="checkbox"]"#,
    r#"[role="switch"]"#,
    r#"[role="radio"]"#,
    r#"[role="searchbox"]"#,
    r#"[role="listbox"]"#,
    r#"[role="slider"]"#,
    // Rich text
    r#"[contenteditable]:not([contenteditable="false" i])"#,
    // Data-attribute conventions
    "[data-field]",
    "[data-input]",
    r#"[data-testid*="input" i]"#,
    r#"[data-testid*="select" i]"#,
    // Class-name conventions
    r#"[class*="custom-select"]"#,
    r#"[class*="custom-checkbox"]"#,
    r#"[class*="custom-radio"]"#,
    // Component libraries
    ".ant-select",
    ".ant-picker",
    ".MuiSelect-select",
    ".react-select__control",
    ".select2-selection",
    ".v-select",
    ".el-select",
    // Upload widgets
    "[data-upload]",
    r#"[class*="dropzone"]"#,
    r#"[class*="file-upload"]"#,
    r#"[class*="upload-area"]"#,
];

/// The whitelist, parsed once.
pub static COMPILED_SELECTORS: Lazy<Vec<(&'static str, SelectorList)>> = Lazy::new(|| {
    FIELD_SELECTORS
        .iter()
        .filter_map(|raw| match parse_selector(raw) {
            Ok(list) => Some((*raw, list)),
            Err(e) => {
                debug!(selector = raw, error = %e, "whitelist selector skipped");
                None
            }
        })
        .collect()
});

/// Fallback scan used when the requested root cannot be traversed.
pub const MINIMAL_SELECTOR: &str = "input, select, textarea";
