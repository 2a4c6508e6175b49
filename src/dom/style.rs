// ============================================================================
// Inline style parsing: the only "computed style" source without a renderer
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    pub display: Option<String>,
    pub visibility: Option<String>,
    pub opacity: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub left: Option<f64>,
    pub top: Option<f64>,
}

impl InlineStyle {
    pub fn is_display_none(&self) -> bool {
        self.display.as_deref() == Some("none")
    }

    pub fn is_visibility_hidden(&self) -> bool {
        matches!(self.visibility.as_deref(), Some("hidden") | Some("collapse"))
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity.is_some_and(|o| o <= 0.0)
    }
}

/// Parse a `style` attribute into the handful of properties the engine reads.
pub fn parse_inline_style(style_attr: Option<&str>) -> InlineStyle {
    let mut style = InlineStyle::default();
    let Some(style_attr) = style_attr else {
        return style;
    };

    for (name, value) in split_declarations(style_attr) {
        match name.as_str() {
            "display" => style.display = Some(value),
            "visibility" => style.visibility = Some(value),
            "opacity" => style.opacity = value.parse::<f64>().ok(),
            "width" => style.width = parse_length(&value),
            "height" => style.height = parse_length(&value),
            "left" => style.left = parse_length(&value),
            "top" => style.top = parse_length(&value),
            _ => {}
        }
    }

    style
}

fn split_declarations(style_attr: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut paren_depth = 0usize;
    let mut start = 0usize;

    for (i, ch) in style_attr.char_indices() {
        match ch {
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            ';' if paren_depth == 0 => {
                push_declaration(&style_attr[start..i], &mut out);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_declaration(&style_attr[start..], &mut out);

    out
}

fn push_declaration(raw: &str, out: &mut Vec<(String, String)>) {
    let Some((name, value)) = raw.split_once(':') else {
        return;
    };
    let name = name.trim().to_ascii_lowercase();
    let value = value
        .trim()
        .trim_end_matches("!important")
        .trim()
        .to_ascii_lowercase();
    if !name.is_empty() {
        out.push((name, value));
    }
}

/// `"12px"`, `"12"` and `"0"` are lengths; percentages and keywords are not.
pub fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok()
}
