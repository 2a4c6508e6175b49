use chrono::Utc;
use sha1::{Digest, Sha1};

use crate::dom::dom_model::{Document, NodeId};
use crate::field::field_model::Field;
use crate::locate::locator::xpath_of;

// ============================================================================
// Marker attributes written onto scanned elements
// ============================================================================

pub const ATTR_ID: &str = "data-formscope-id";
pub const ATTR_DETECTED: &str = "data-formscope-detected";
pub const ATTR_TYPE: &str = "data-formscope-type";
pub const ATTR_LABEL: &str = "data-formscope-label";
pub const ATTR_TS: &str = "data-formscope-ts";
pub const ATTR_FINGERPRINT: &str = "data-formscope-fingerprint";

/// SHA-1 over type, xpath and name: stable across passes while the element
/// stays where it is.
pub fn fingerprint(field_type: &str, xpath: &str, name: Option<&str>) -> String {
    let mut hasher = Sha1::new();
    hasher.update(field_type.as_bytes());
    hasher.update([0u8]);
    hasher.update(xpath.as_bytes());
    hasher.update([0u8]);
    hasher.update(name.unwrap_or("").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stamp the field's markers onto its representative and every group member.
pub fn write_markers(doc: &mut Document, field: &Field) {
    let ts = Utc::now().timestamp_millis().to_string();
    let mut targets = vec![field.element];
    for member in field.member_elements() {
        if !targets.contains(&member) {
            targets.push(member);
        }
    }

    for node in targets {
        let xpath = xpath_of(doc, node);
        let fp = fingerprint(field.field_type.as_str(), &xpath, doc.attr(node, "name"));
        doc.set_attr(node, ATTR_ID, &field.id);
        doc.set_attr(node, ATTR_DETECTED, "true");
        doc.set_attr(node, ATTR_TYPE, field.field_type.as_str());
        doc.set_attr(node, ATTR_LABEL, &field.label);
        doc.set_attr(node, ATTR_TS, &ts);
        doc.set_attr(node, ATTR_FINGERPRINT, &fp);
    }
}

/// Whether a previous pass already processed this element where it stands.
pub fn is_processed(doc: &Document, node: NodeId) -> bool {
    if doc.attr(node, ATTR_DETECTED) != Some("true") {
        return false;
    }
    let (Some(stored), Some(field_type)) = (doc.attr(node, ATTR_FINGERPRINT), doc.attr(node, ATTR_TYPE))
    else {
        return false;
    };
    let xpath = xpath_of(doc, node);
    fingerprint(field_type, &xpath, doc.attr(node, "name")) == stored
}
