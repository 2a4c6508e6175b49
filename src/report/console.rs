use crate::field::field_model::Field;
use crate::inject::strategy::{InjectionReport, InjectionStatus};

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

const MAX_LABEL_WIDTH: usize = 32;

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('\u{2026}');
    clipped
}

/// Format detected fields as an aligned table.
///
/// Produces output like:
/// ```text
/// === 3 fields ===
///
/// ff-1a2b3c4d5e6f-1  email     Email address     ""
/// ff-1a2b3c4d5e6f-2  radio     Gender            "" (2 options)
/// ```
pub fn format_field_table(fields: &[Field]) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} fields ===\n\n", fields.len()));

    let id_width = fields.iter().map(|f| f.id.len()).max().unwrap_or(0);
    let type_width = fields
        .iter()
        .map(|f| f.field_type.as_str().len())
        .max()
        .unwrap_or(0);
    let label_width = fields
        .iter()
        .map(|f| f.label.chars().count().min(MAX_LABEL_WIDTH))
        .max()
        .unwrap_or(0);

    for field in fields {
        out.push_str(&format!(
            "{:id_width$}  {:type_width$}  {:label_width$}  \"{}\"",
            field.id,
            field.field_type.as_str(),
            clip(&field.label, MAX_LABEL_WIDTH),
            field.value,
        ));
        if let Some(options) = &field.options {
            out.push_str(&format!(" ({} options)", options.len()));
        }
        if let Some(test_value) = &field.test_value {
            out.push_str(&format!(" test={}", test_value));
        }
        out.push('\n');
    }
    out
}

/// Format injection reports, one line per field plus failure detail.
///
/// ```text
/// ✓ OK    ff-1a2b3c4d5e6f-1 (email) "bob@example.com" via direct-write
/// ✗ FAIL  ff-1a2b3c4d5e6f-3 (file) unsupported
///     note: unsupported source: https://example.com/a.pdf
///
/// === Results: 1 applied, 1 failed (2 total) ===
/// ```
pub fn format_injection_reports(reports: &[InjectionReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let marker = if report.succeeded() {
            "\u{2713} OK  "
        } else {
            "\u{2717} FAIL"
        };
        out.push_str(&format!(
            "{}  {} ({}) \"{}\"",
            marker, report.field_id, report.field_type, report.normalized_value
        ));
        match &report.status {
            InjectionStatus::Success => {
                if let Some(last) = report.attempts.iter().rev().find(|a| a.verified) {
                    out.push_str(&format!(" via {}", last.strategy));
                }
            }
            InjectionStatus::ExhaustedStrategies => {
                out.push_str(&format!(" tried {}", report.attempted_strategies().join(", ")));
            }
            InjectionStatus::Unsupported => out.push_str(" unsupported"),
            InjectionStatus::ElementMissing => out.push_str(" element missing"),
        }
        out.push('\n');
        if !report.succeeded() {
            for note in &report.notes {
                out.push_str(&format!("    note: {}\n", note));
            }
        }
    }

    let applied = reports.iter().filter(|r| r.succeeded()).count();
    out.push_str(&format!(
        "\n=== Results: {} applied, {} failed ({} total) ===\n",
        applied,
        reports.len() - applied,
        reports.len()
    ));
    out
}
