use formscope::dom::dom_model::FileEntry;
use formscope::dom::html::parse_html;
use formscope::error::EngineError;
use formscope::inject::InjectionState;
use formscope::inject::file::{decode_data_url, resolve_source};
use formscope::{InjectionStatus, apply_with};

use crate::common::page::{by_id, detect_all, fast_options, field_for, fixture};
use crate::common::widgets::wire_dropzone;

mod common;

const HELLO_TXT: &str = "data:text/plain;name=hello.txt;base64,aGVsbG8=";

// ============================================================================
// Sources
// ============================================================================

#[test]
fn base64_data_url_decodes_with_name_and_mime() {
    let file = decode_data_url(HELLO_TXT, 0).unwrap();
    assert_eq!(file.name, "hello.txt");
    assert_eq!(file.mime, "text/plain");
    assert_eq!(file.bytes, b"hello");
}

#[test]
fn percent_encoded_data_url_gets_a_generated_name() {
    let file = decode_data_url("data:,Hello%20World", 2).unwrap();
    assert_eq!(file.name, "upload-3.bin");
    assert_eq!(file.mime, "application/octet-stream");
    assert_eq!(file.bytes, b"Hello World");
}

#[test]
fn malformed_data_urls_are_decode_errors() {
    assert!(matches!(decode_data_url("data:text/plain", 0), Err(EngineError::Decode(_))));
    assert!(matches!(
        decode_data_url("data:text/plain;base64,@@@", 0),
        Err(EngineError::Decode(_))
    ));
}

#[test]
fn percent_escapes_must_be_two_hex_digits() {
    assert_eq!(decode_data_url("data:,%41%6a", 0).unwrap().bytes, b"Aj");
    for bad in ["data:,%+1", "data:,%-f", "data:,%4", "data:,%zz"] {
        assert!(matches!(decode_data_url(bad, 0), Err(EngineError::Decode(_))), "{bad}");
    }
}

#[test]
fn remote_urls_are_unsupported() {
    let doc = parse_html("<form></form>");
    assert!(matches!(
        resolve_source(&doc, "https://example.com/cv.pdf", 0),
        Err(EngineError::UnsupportedSource(_))
    ));
    assert!(matches!(
        resolve_source(&doc, "blob:https://app.test/unknown", 0),
        Err(EngineError::Decode(_))
    ));
}

// ============================================================================
// Native file inputs
// ============================================================================

#[tokio::test]
async fn data_url_lands_on_native_input() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let resume = by_id(&doc, "resume");

    let report = apply_with(&mut doc, resume, field_for(&fields, resume), &HELLO_TXT.into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(report.attempted_strategies(), vec!["native-file-assign"]);
    assert_eq!(report.normalized_value, "hello.txt");
    let files = doc.files(resume);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].bytes, b"hello");
    assert_eq!(doc.events_for(resume, "change"), 1);
}

#[tokio::test]
async fn registered_blob_url_is_resolved() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let resume = by_id(&doc, "resume");
    let photo = FileEntry {
        name: "photo.png".to_string(),
        mime: "image/png".to_string(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
    };
    doc.register_blob("blob:https://app.test/5f1c", photo.clone());

    let report = apply_with(
        &mut doc,
        resume,
        field_for(&fields, resume),
        &"blob:https://app.test/5f1c".into(),
        &fast_options(),
    )
    .await;

    assert!(report.succeeded());
    assert_eq!(doc.files(resume), &[photo][..]);
}

#[tokio::test]
async fn http_source_is_reported_unsupported() {
    let mut doc = fixture("signup.html");
    let fields = detect_all(&mut doc);
    let resume = by_id(&doc, "resume");

    let report = apply_with(
        &mut doc,
        resume,
        field_for(&fields, resume),
        &"https://example.com/cv.pdf".into(),
        &fast_options(),
    )
    .await;

    assert_eq!(report.status, InjectionStatus::Unsupported);
    assert!(report.attempts.is_empty());
    assert!(
        report
            .notes
            .iter()
            .any(|n| n == "unsupported source: https://example.com/cv.pdf")
    );
    assert_eq!(report.state(), InjectionState::ExhaustedStrategies);
    assert!(doc.files(resume).is_empty());
}

#[tokio::test]
async fn single_file_input_keeps_only_the_first_file() {
    let mut doc = parse_html(r#"<form><input id="f" type="file" name="doc"></form>"#);
    let fields = detect_all(&mut doc);
    let input = by_id(&doc, "f");
    let value = formscope::field::FieldValue::List(vec![
        HELLO_TXT.to_string(),
        "data:text/csv;name=rows.csv,a%2Cb".to_string(),
    ]);

    let report = apply_with(&mut doc, input, field_for(&fields, input), &value, &fast_options()).await;

    assert!(report.succeeded());
    let names: Vec<&str> = doc.files(input).iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["hello.txt"]);
}

// ============================================================================
// Custom upload widgets
// ============================================================================

#[tokio::test]
async fn drop_zone_receives_a_simulated_drop() {
    let mut doc = parse_html(r#"<form><div id="drop" class="dropzone">Drop files here</div></form>"#);
    let zone = by_id(&doc, "drop");
    wire_dropzone(&mut doc, zone);
    let fields = detect_all(&mut doc);

    let report = apply_with(&mut doc, zone, field_for(&fields, zone), &HELLO_TXT.into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(report.attempted_strategies(), vec!["drop-simulation"]);
    assert_eq!(doc.normalized_text(zone), "Uploaded: hello.txt");
    assert_eq!(doc.events_for(zone, "drop"), 1);
}

#[tokio::test]
async fn upload_button_opening_a_hidden_input_is_clicked() {
    let mut doc = parse_html(
        r#"<form>
             <div id="upload" class="file-upload" data-upload="true">Choose file</div>
             <input id="hidden-file" type="file" name="attachment" style="display:none">
           </form>"#,
    );
    let widget = by_id(&doc, "upload");
    let input = by_id(&doc, "hidden-file");
    doc.listen(widget, "click", move |doc, _| {
        doc.click(input);
    });
    let fields = detect_all(&mut doc);

    let report = apply_with(&mut doc, widget, field_for(&fields, widget), &HELLO_TXT.into(), &fast_options()).await;

    assert!(report.succeeded());
    assert_eq!(report.attempted_strategies(), vec!["drop-simulation", "click-simulation"]);
    assert_eq!(doc.files(input).len(), 1);
}
