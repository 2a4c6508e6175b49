use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use crate::classify::file::native_file_input;
use crate::dom::dom_model::{Document, FileEntry, NodeId};
use crate::dom::events::DomEvent;
use crate::error::{EngineError, Result};
use crate::inject::strategy::{
    ApplyOptions, AttemptOutcome, InjectionStrategy, InjectionTarget, Recorder, run_cascade,
};

// ============================================================================
// Sources
// ============================================================================

const DEFAULT_MIME: &str = "application/octet-stream";

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "application/pdf" => "pdf",
        "text/plain" => "txt",
        "text/csv" => "csv",
        "application/json" => "json",
        _ => "bin",
    }
}

fn percent_decode(input: &str) -> Result<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .ok_or_else(|| EngineError::Decode(format!("truncated escape at {}", i)))?;
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return Err(EngineError::Decode(format!(
                        "bad escape %{}",
                        String::from_utf8_lossy(hex)
                    )));
                }
                let byte = hex
                    .iter()
                    .fold(0u8, |acc, d| acc * 16 + (*d as char).to_digit(16).unwrap_or(0) as u8);
                out.push(byte);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Ok(out)
}

/// `data:[<mime>][;name=<file>][;base64],<payload>`
pub fn decode_data_url(url: &str, index: usize) -> Result<FileEntry> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| EngineError::Decode("not a data: URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| EngineError::Decode("data: URL without payload".to_string()))?;

    let mut params = header.split(';');
    let mime = params
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MIME)
        .to_ascii_lowercase();
    let mut base64 = false;
    let mut name = None;
    for param in params {
        match param.split_once('=') {
            Some(("name" | "filename", v)) => name = Some(String::from_utf8_lossy(&percent_decode(v)?).into_owned()),
            _ if param.eq_ignore_ascii_case("base64") => base64 = true,
            _ => {}
        }
    }

    let bytes = if base64 {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| EngineError::Decode(e.to_string()))?
    } else {
        percent_decode(payload)?
    };

    let name = name.unwrap_or_else(|| format!("upload-{}.{}", index + 1, extension_for(&mime)));
    Ok(FileEntry { name, mime, bytes })
}

/// Turn one requested source into a file entry.
pub fn resolve_source(doc: &Document, source: &str, index: usize) -> Result<FileEntry> {
    let source = source.trim();
    let lower = source.to_ascii_lowercase();
    if lower.starts_with("data:") {
        return decode_data_url(source, index);
    }
    if lower.starts_with("blob:") {
        return doc
            .blob(source)
            .cloned()
            .ok_or_else(|| EngineError::Decode(format!("unregistered object URL {}", source)));
    }
    Err(EngineError::UnsupportedSource(source.to_string()))
}

/// Every source that resolves, plus a note for each that does not.
pub fn resolve_sources(doc: &Document, sources: &[String]) -> (Vec<FileEntry>, Vec<String>) {
    let mut files = Vec::new();
    let mut notes = Vec::new();
    for (index, source) in sources.iter().enumerate().filter(|(_, s)| !s.trim().is_empty()) {
        match resolve_source(doc, source, index) {
            Ok(file) => files.push(file),
            Err(EngineError::UnsupportedSource(s)) => {
                warn!(source = %s, "file source not supported, skipped");
                notes.push(format!("unsupported source: {}", s));
            }
            Err(e) => {
                warn!(error = %e, "file source skipped");
                notes.push(e.to_string());
            }
        }
    }
    (files, notes)
}

// ============================================================================
// File strategies
// ============================================================================

pub fn file_strategies(files: &[FileEntry]) -> Vec<Box<dyn InjectionStrategy>> {
    vec![
        Box::new(NativeFileAssign { files: files.to_vec() }),
        Box::new(DropSimulation { files: files.to_vec() }),
        Box::new(ClickSimulation { files: files.to_vec() }),
    ]
}

pub async fn apply_file(
    doc: &mut Document,
    target: &InjectionTarget,
    files: &[FileEntry],
    options: &ApplyOptions,
    recorder: &mut Recorder<'_>,
) -> bool {
    run_cascade(doc, target, &file_strategies(files), options, recorder).await
}

fn files_for_input(doc: &Document, input: NodeId, files: &[FileEntry]) -> Vec<FileEntry> {
    if doc.has_attr(input, "multiple") {
        files.to_vec()
    } else {
        files.iter().take(1).cloned().collect()
    }
}

fn assign(doc: &mut Document, input: NodeId, files: &[FileEntry]) {
    let chosen = files_for_input(doc, input, files);
    doc.set_files(input, chosen);
    doc.dispatch_event(DomEvent::new("input", input));
    doc.dispatch_event(DomEvent::change(input));
}

fn input_holds(doc: &Document, input: NodeId, files: &[FileEntry]) -> bool {
    let expected = files_for_input(doc, input, files);
    !expected.is_empty() && doc.files(input) == expected.as_slice()
}

fn file_names(files: &[FileEntry]) -> Vec<String> {
    files.iter().map(|f| f.name.clone()).collect()
}

/// Files land on the native input, or the widget shows their names.
fn widget_shows(doc: &Document, element: NodeId, files: &[FileEntry]) -> bool {
    if let Some(input) = native_file_input(doc, element) {
        if input_holds(doc, input, files) {
            return true;
        }
    }
    let text = doc.normalized_text(element);
    files.first().is_some_and(|f| text.contains(&f.name))
}

pub struct NativeFileAssign {
    files: Vec<FileEntry>,
}

#[async_trait(?Send)]
impl InjectionStrategy for NativeFileAssign {
    fn name(&self) -> &'static str {
        "native-file-assign"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        native_file_input(doc, target.element).is_some_and(|i| !doc.is_disabled(i))
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let Some(input) = native_file_input(doc, target.element) else {
            return AttemptOutcome::NoEffect;
        };
        assign(doc, input, &self.files);
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        native_file_input(doc, target.element).is_some_and(|i| input_holds(doc, i, &self.files))
    }
}

/// dragenter, dragover, drop on a custom upload widget.
pub struct DropSimulation {
    files: Vec<FileEntry>,
}

#[async_trait(?Send)]
impl InjectionStrategy for DropSimulation {
    fn name(&self) -> &'static str {
        "drop-simulation"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        doc.input_type(target.element).as_deref() != Some("file")
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let el = target.element;
        let names = file_names(&self.files);
        let mut handled = 0;
        for event_type in ["dragenter", "dragover", "drop"] {
            let result = doc.dispatch_event(DomEvent::new(event_type, el).with_files(names.clone()));
            handled += result.handled;
        }
        if handled == 0 {
            return AttemptOutcome::Failed("no drop handler".to_string());
        }
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        widget_shows(doc, target.element, &self.files)
    }
}

/// Click the widget and fill whichever file input it opened.
pub struct ClickSimulation {
    files: Vec<FileEntry>,
}

impl ClickSimulation {
    fn opened_input(doc: &Document, clicks_before: &[(NodeId, usize)]) -> Option<NodeId> {
        clicks_before
            .iter()
            .find(|(input, before)| doc.events_for(*input, "click") > *before)
            .map(|(input, _)| *input)
    }
}

#[async_trait(?Send)]
impl InjectionStrategy for ClickSimulation {
    fn name(&self) -> &'static str {
        "click-simulation"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        !doc.is_disabled(target.element)
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let inputs: Vec<(NodeId, usize)> = doc
            .composed_descendant_elements(doc.root())
            .into_iter()
            .filter(|n| doc.input_type(*n).as_deref() == Some("file"))
            .map(|n| (n, doc.events_for(n, "click")))
            .collect();

        doc.click(target.element);
        let Some(input) = Self::opened_input(doc, &inputs) else {
            return AttemptOutcome::Failed("click opened no file chooser".to_string());
        };
        debug!(input = input.0, "file chooser opened by click");
        assign(doc, input, &self.files);
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        if widget_shows(doc, target.element, &self.files) {
            return true;
        }
        doc.composed_descendant_elements(doc.root())
            .into_iter()
            .filter(|n| doc.input_type(*n).as_deref() == Some("file"))
            .any(|n| input_holds(doc, n, &self.files))
    }
}
