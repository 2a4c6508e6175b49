use std::path::PathBuf;

use formscope::dom::dom_model::{Document, NodeId};
use formscope::dom::html::parse_html;
use formscope::field::field_model::Field;
use formscope::{ApplyOptions, DetectOptions, detect};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture(name: &str) -> Document {
    let source = std::fs::read_to_string(fixture_path(name)).unwrap();
    parse_html(&source)
}

/// Element with `id`, searched across open and closed shadow trees.
pub fn by_id(doc: &Document, id: &str) -> NodeId {
    doc.composed_descendant_elements(doc.root())
        .into_iter()
        .find(|n| doc.attr(*n, "id") == Some(id))
        .unwrap_or_else(|| panic!("no element with id '{}'", id))
}

pub fn detect_all(doc: &mut Document) -> Vec<Field> {
    detect(doc, None, &DetectOptions::default())
}

/// The field whose representative or group member is `node`.
pub fn field_for(fields: &[Field], node: NodeId) -> &Field {
    fields
        .iter()
        .find(|f| f.element == node || f.member_elements().contains(&node))
        .unwrap_or_else(|| panic!("no field for node {:?}", node))
}

pub fn field_labelled<'a>(fields: &'a [Field], label: &str) -> &'a Field {
    fields
        .iter()
        .find(|f| f.label == label)
        .unwrap_or_else(|| panic!("no field labelled '{}'", label))
}

/// Short waits so failing strategies time out quickly.
pub fn fast_options() -> ApplyOptions {
    let mut options = ApplyOptions::default();
    options.config.injection.dropdown_open_delay_ms = 5;
    options.config.injection.verify_timeout_ms = 60;
    options.config.injection.verify_interval_ms = 5;
    options
}
