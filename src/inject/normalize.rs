use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::dom_model::{Document, NodeId};
use crate::field::field_model::{FieldType, format_number};

// ============================================================================
// Value shaping per text subtype
// ============================================================================

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([0-9a-fA-F]{6}|[0-9a-fA-F]{3})$").expect("hex color regex"));
static WEEK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-?W(\d{1,2})$").expect("week regex"));
static MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})$").expect("month regex"));

const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("red", "#ff0000"),
    ("green", "#008000"),
    ("blue", "#0000ff"),
    ("yellow", "#ffff00"),
    ("orange", "#ffa500"),
    ("purple", "#800080"),
    ("gray", "#808080"),
    ("grey", "#808080"),
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%B %d, %Y", "%b %d, %Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p", "%I %p"];
const TEL_DIGITS: usize = 10;

/// Shape `raw` into something the element of `field_type` accepts.
pub fn normalize_text_value(doc: &Document, node: NodeId, field_type: FieldType, raw: &str) -> String {
    let raw = raw.trim();
    let shaped = match field_type {
        FieldType::Email => normalize_email(raw),
        FieldType::Url => normalize_url(raw),
        FieldType::Tel => normalize_tel(raw),
        FieldType::Number | FieldType::Range => normalize_number(doc, node, field_type, raw),
        FieldType::Date => normalize_date(raw),
        FieldType::Time => normalize_time(raw),
        FieldType::DatetimeLocal => normalize_datetime(raw),
        FieldType::Month => normalize_month(raw),
        FieldType::Week => normalize_week(raw),
        FieldType::Color => normalize_color(raw),
        _ => raw.to_string(),
    };
    truncate_to_maxlength(doc, node, shaped)
}

pub fn normalize_email(raw: &str) -> String {
    if raw.is_empty() || raw.contains('@') {
        return raw.to_string();
    }
    let local: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    format!("{}@example.com", local)
}

pub fn normalize_url(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    if raw.is_empty() || lower.starts_with("https://") || lower.starts_with("http://") {
        return raw.to_string();
    }
    format!("https://{}", raw.trim_start_matches('/'))
}

/// Digits with an optional leading `+`, right-padded with zeros to ten digits.
pub fn normalize_tel(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let plus = raw.starts_with('+');
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    while digits.len() < TEL_DIGITS {
        digits.push('0');
    }
    if plus {
        format!("+{}", digits)
    } else {
        digits
    }
}

fn bound(doc: &Document, node: NodeId, attrs: [&str; 2]) -> Option<f64> {
    attrs
        .iter()
        .find_map(|a| doc.attr(node, a).and_then(|v| v.trim().parse::<f64>().ok()))
}

pub fn normalize_number(doc: &Document, node: NodeId, field_type: FieldType, raw: &str) -> String {
    let (default_min, default_max) = match field_type {
        FieldType::Range => (Some(0.0), Some(100.0)),
        _ => (None, None),
    };
    let min = bound(doc, node, ["min", "aria-valuemin"]).or(default_min);
    let max = bound(doc, node, ["max", "aria-valuemax"]).or(default_max);

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E'))
        .collect();
    let mut n = match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => min.unwrap_or(0.0),
    };
    if let Some(min) = min {
        n = n.max(min);
    }
    if let Some(max) = max {
        n = n.min(max);
    }
    format_number(n)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| parse_datetime(raw).map(|dt| dt.date()))
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
}

pub fn normalize_date(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn normalize_time(raw: &str) -> String {
    let upper = raw.to_ascii_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(&upper, f).ok())
        .or_else(|| parse_datetime(raw).map(|dt| dt.time()))
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn normalize_datetime(raw: &str) -> String {
    parse_datetime(raw)
        .or_else(|| parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)))
        .map(|dt| dt.format("%Y-%m-%dT%H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn normalize_month(raw: &str) -> String {
    if let Some(caps) = MONTH.captures(raw) {
        let month: u32 = caps[2].parse().unwrap_or(0);
        if (1..=12).contains(&month) {
            return format!("{}-{:02}", &caps[1], month);
        }
    }
    parse_date(raw)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn normalize_week(raw: &str) -> String {
    if let Some(caps) = WEEK.captures(&raw.to_ascii_uppercase()) {
        let week: u32 = caps[2].parse().unwrap_or(0);
        if (1..=53).contains(&week) {
            return format!("{}-W{:02}", &caps[1], week);
        }
    }
    parse_date(raw)
        .map(|d| {
            let iso = d.iso_week();
            format!("{}-W{:02}", iso.year(), iso.week())
        })
        .unwrap_or_else(|| raw.to_string())
}

pub fn normalize_color(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    if let Some(caps) = HEX_COLOR.captures(&lower) {
        let hex = &caps[1];
        if hex.len() == 3 {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            return format!("#{}", expanded);
        }
        return format!("#{}", hex);
    }
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, hex)| hex.to_string())
        .unwrap_or_else(|| "#000000".to_string())
}

fn truncate_to_maxlength(doc: &Document, node: NodeId, value: String) -> String {
    let max = doc
        .attr(node, "maxlength")
        .and_then(|m| m.trim().parse::<usize>().ok());
    match max {
        Some(max) if value.chars().count() > max => value.chars().take(max).collect(),
        _ => value,
    }
}
