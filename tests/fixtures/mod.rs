//! Test fixtures: artifact bundles, images and SSE bodies

#![allow(dead_code)]

use base64::Engine;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

/// Asset id handed out by the mock registration endpoint.
pub const ASSET_ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

/// Poll token handed out by the mock submission endpoint.
pub const REQUEST_ID: &str = "6a1c9f20-req";

/// 1x1 red pixel PNG.
const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

pub fn tiny_png() -> Vec<u8> {
    base64::engine::general_purpose::STANDARD
        .decode(TINY_PNG_BASE64)
        .expect("fixture PNG is valid base64")
}

/// Build an in-memory zip archive.
pub fn bundle(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(data).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// What Grounding DINO returns: box metadata plus the annotated image.
pub fn detection_bundle() -> Vec<u8> {
    let png = tiny_png();
    bundle(&[
        ("a.txt", &b"person 0.91 [12, 40, 88, 190]"[..]),
        ("b.png", &png[..]),
    ])
}

pub fn bundle_without_image() -> Vec<u8> {
    bundle(&[("a.txt", &b"no detections"[..]), ("result.json", &b"{}"[..])])
}

/// One SSE `data:` line carrying a content delta.
pub fn sse_delta(content: &str) -> String {
    let chunk = serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion.chunk",
        "choices": [{ "index": 0, "delta": { "role": "assistant", "content": content } }]
    });
    format!("data: {}\n\n", chunk)
}

/// A complete SSE body for the given deltas, terminated by `[DONE]`.
pub fn sse_body(deltas: &[&str]) -> String {
    let mut body: String = deltas.iter().map(|d| sse_delta(d)).collect();
    body.push_str("data: [DONE]\n\n");
    body
}
