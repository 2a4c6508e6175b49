use once_cell::sync::Lazy;
use regex::Regex;

/// `(pattern, weight)` pairs matched against class, id and data-* values.
pub static CONTAINER_KEYWORDS: Lazy<Vec<(Regex, i32)>> = Lazy::new(|| {
    let table: &[(&str, i32)] = &[
        // Chrome and overlays
        (r"(?i)\bnav(bar|igation)?\b", -20),
        (r"(?i)\bmenu\b", -15),
        (r"(?i)\bheader\b", -10),
        (r"(?i)\bfooter\b", -10),
        (r"(?i)\bsidebar\b", -8),
        (r"(?i)\bbreadcrumbs?\b", -10),
        (r"(?i)\bmodal\b", -5),
        (r"(?i)\btooltip\b", -15),
        (r"(?i)\bpopover\b", -10),
        (r"(?i)\btoolbar\b", -10),
        (r"(?i)\bsearch[-_]?bar\b", -5),
        (r"(?i)\b(cookie|consent)\b", -10),
        // Forms
        (r"(?i)form", 10),
        (r"(?i)survey|questionnaire", 10),
        (r"(?i)application|apply", 8),
        (r"(?i)checkout|billing|shipping|payment", 8),
        (r"(?i)\bsteps?\b|wizard", 5),
        (r"(?i)profile|account|settings", 5),
        (r"(?i)register|signup|sign[-_]up|login|sign[-_]in", 6),
        (r"(?i)contact|feedback", 5),
        (r"(?i)fieldset|field[-_]?group", 4),
    ];
    table
        .iter()
        .map(|(pattern, weight)| (Regex::new(pattern).expect("container keyword regex"), *weight))
        .collect()
});

/// Submit-like button text.
pub static SUBMIT_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(submit|save|send|continue|next|apply|register|sign ?up|sign ?in|log ?in|pay|checkout|finish|confirm)\b")
        .expect("submit text regex")
});
