use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use crate::dom::dom_model::Document;
use crate::field::markers::ATTR_ID;

/// Id registry for one detection pass.
///
/// Ids are `ff-<nonce>-<n>`: the nonce is random per session so two passes
/// over the same page never hand out the same id, and every issued id is
/// checked against ids already written into the page.
#[derive(Debug)]
pub struct DetectionSession {
    nonce: String,
    counter: u64,
    issued: HashSet<String>,
}

impl Default for DetectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionSession {
    pub fn new() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self {
            nonce: simple[..12].to_string(),
            counter: 0,
            issued: HashSet::new(),
        }
    }

    /// Mark every id already present in the page's markers as taken.
    pub fn reserve_existing(&mut self, doc: &Document) {
        let root = doc.root();
        let before = self.issued.len();
        for node in doc.composed_descendant_elements(root) {
            if let Some(id) = doc.attr(node, ATTR_ID) {
                self.issued.insert(id.to_string());
            }
        }
        debug!(reserved = self.issued.len() - before, "reserved existing field ids");
    }

    pub fn issue_id(&mut self) -> String {
        loop {
            self.counter += 1;
            let candidate = format!("ff-{}-{}", self.nonce, self.counter);
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }
}
