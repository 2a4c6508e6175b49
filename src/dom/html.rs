use crate::dom::dom_model::{Document, NodeId, NodeKind};

// ============================================================================
// Tag-soup HTML fragment parser
// ============================================================================

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];
const RAW_TEXT_TAGS: &[&str] = &["script", "style", "textarea", "title"];

/// Parse `source` into a fresh document. Never fails: malformed markup is
/// recovered the way browsers recover it, approximately.
pub fn parse_html(source: &str) -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    parse_fragment(&mut doc, root, source);
    doc
}

/// Parse `source` and append the resulting nodes to `parent`.
pub fn parse_fragment(doc: &mut Document, parent: NodeId, source: &str) {
    let mut parser = Parser {
        src: source,
        pos: 0,
        stack: vec![(parent, String::new())],
    };
    parser.run(doc);
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    /// Open nodes and the tag that opened them.
    stack: Vec<(NodeId, String)>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn current(&self) -> NodeId {
        self.stack.last().map(|(n, _)| *n).unwrap_or(NodeId(0))
    }

    fn run(&mut self, doc: &mut Document) {
        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.pos += rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.pos += rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            } else if rest.starts_with("</") {
                self.close_tag();
            } else if rest.starts_with('<')
                && rest[1..].chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            {
                self.open_tag(doc);
            } else {
                self.text(doc);
            }
        }
    }

    fn text(&mut self, doc: &mut Document) {
        let rest = self.rest();
        // A lone '<' that does not start a tag is text.
        let skip = if rest.starts_with('<') { 1 } else { 0 };
        let end = rest[skip..].find('<').map(|i| i + skip).unwrap_or(rest.len());
        let raw = &rest[..end];
        self.pos += end;
        if raw.trim().is_empty() {
            return;
        }
        let parent = self.current();
        doc.append_text(parent, &decode_entities(raw));
    }

    fn close_tag(&mut self) {
        let rest = self.rest();
        let (inner, consumed) = match rest.find('>') {
            Some(i) => (&rest[2..i], i + 1),
            None => (&rest[2..], rest.len()),
        };
        let name = inner.trim().to_ascii_lowercase();
        self.pos += consumed;

        // Unmatched end tags are ignored; matched ones close everything above them.
        if let Some(index) = self.stack.iter().rposition(|(_, tag)| *tag == name) {
            if index > 0 {
                self.stack.truncate(index);
            }
        }
    }

    fn open_tag(&mut self, doc: &mut Document) {
        let bytes = self.src.as_bytes();
        let mut i = self.pos + 1;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/' {
            i += 1;
        }
        let name = self.src[self.pos + 1..i].to_ascii_lowercase();
        let mut attrs: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }
            if bytes[i] == b'>' {
                i += 1;
                break;
            }
            if bytes[i] == b'/' {
                self_closing = true;
                i += 1;
                continue;
            }
            let name_start = i;
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && !matches!(bytes[i], b'=' | b'>' | b'/')
            {
                i += 1;
            }
            let attr_name = self.src[name_start..i].to_ascii_lowercase();
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let mut value = String::new();
            if i < bytes.len() && bytes[i] == b'=' {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                    let quote = bytes[i];
                    let start = i + 1;
                    let end = self.src[start..]
                        .bytes()
                        .position(|b| b == quote)
                        .map(|p| start + p)
                        .unwrap_or(bytes.len());
                    value = decode_entities(&self.src[start..end]);
                    i = (end + 1).min(bytes.len());
                } else {
                    let start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = decode_entities(&self.src[start..i]);
                }
                self_closing = false;
            }
            if !attr_name.is_empty() && !attrs.iter().any(|(k, _)| *k == attr_name) {
                attrs.push((attr_name, value));
            }
        }
        self.pos = i;

        // Declarative shadow root: the template's content becomes the parent's shadow tree.
        if name == "template" {
            if let Some(mode) = attrs
                .iter()
                .find(|(k, _)| k == "shadowrootmode")
                .map(|(_, v)| v.to_ascii_lowercase())
            {
                let host = self.current();
                if doc.is_element(host) {
                    let shadow = doc.attach_shadow(host, mode != "closed");
                    self.stack.push((shadow, name));
                    return;
                }
            }
        }

        if matches!(name.as_str(), "option" | "optgroup") {
            if let Some((_, top)) = self.stack.last() {
                if top == "option" || (name == "optgroup" && top == "optgroup") {
                    self.stack.pop();
                }
            }
        }

        let element = doc.create_element(&name, attrs);
        let parent = self.current();
        doc.append_child(parent, element);

        if VOID_TAGS.contains(&name.as_str()) || self_closing {
            return;
        }

        if RAW_TEXT_TAGS.contains(&name.as_str()) {
            let rest = self.rest();
            let close = format!("</{}", name);
            let end = find_ascii_case_insensitive(rest, &close).unwrap_or(rest.len());
            let content = &rest[..end];
            if name == "textarea" {
                let text = decode_entities(content.strip_prefix('\n').unwrap_or(content));
                doc.set_value(element, &text);
            } else if name == "title" && !content.trim().is_empty() {
                doc.append_text(element, &decode_entities(content));
            }
            self.pos += end;
            let after = self.rest();
            self.pos += after.find('>').map(|i| i + 1).unwrap_or(after.len());
            return;
        }

        self.stack.push((element, name));
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

const MAX_ENTITY_LEN: usize = 12;

pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';').filter(|semi| *semi < MAX_ENTITY_LEN) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" | "#39" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
            }
            _ if entity.starts_with('#') => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            _ => None,
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Serializer: writes live form state back out
// ============================================================================

pub fn serialize_children(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(node) {
        write_node(doc, *child, &mut out);
    }
    out
}

pub fn serialize_node(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    let Some(n) = doc.node(node) else {
        return;
    };
    match &n.kind {
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Document | NodeKind::ShadowRoot { .. } => {
            for child in &n.children {
                write_node(doc, *child, out);
            }
        }
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in live_attributes(doc, node) {
                out.push(' ');
                out.push_str(&name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&escape_attr(&value));
                    out.push('"');
                }
            }
            out.push('>');
            if VOID_TAGS.contains(&el.tag.as_str()) {
                return;
            }
            if let Some(shadow) = el.shadow_root {
                let open = matches!(
                    doc.node(shadow).map(|s| &s.kind),
                    Some(NodeKind::ShadowRoot { open: true, .. })
                );
                out.push_str(&format!(
                    "<template shadowrootmode=\"{}\">",
                    if open { "open" } else { "closed" }
                ));
                write_node(doc, shadow, out);
                out.push_str("</template>");
            }
            if el.tag == "textarea" {
                out.push_str(&escape_text(&el.value));
            } else {
                for child in &n.children {
                    write_node(doc, *child, out);
                }
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

/// Attributes with `value`, `checked` and `selected` reflecting current state.
fn live_attributes(doc: &Document, node: NodeId) -> Vec<(String, String)> {
    let Some(el) = doc.element(node) else {
        return vec![];
    };
    let mut attrs: Vec<(String, String)> = el
        .attrs
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "checked" | "selected") && !(el.tag == "input" && k == "value"))
        .cloned()
        .collect();
    match el.tag.as_str() {
        "input" => {
            let input_type = el.input_type().unwrap_or_default();
            if input_type == "checkbox" || input_type == "radio" {
                if let Some(v) = el.attr("value") {
                    attrs.push(("value".to_string(), v.to_string()));
                }
                if el.checked {
                    attrs.push(("checked".to_string(), String::new()));
                }
            } else if !el.value.is_empty() {
                attrs.push(("value".to_string(), el.value.clone()));
            }
        }
        "option" if el.selected => attrs.push(("selected".to_string(), String::new())),
        _ => {}
    }
    attrs
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
