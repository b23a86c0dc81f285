//! Shared helpers for the API integration tests.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use filekit::PdfFile;
use filekit_api::{app, AppState, ServerConfig};
use http_body_util::BodyExt;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use serde_json::Value;
use std::io::Write;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

/// Router over a fresh data directory. Keep the `TempDir` alive for the
/// duration of the test.
pub async fn test_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig::for_data_dir(dir.path());
    (app_with(&config).await, dir)
}

pub async fn app_with(config: &ServerConfig) -> Router {
    let state = AppState::from_config(config).await.unwrap();
    app(state)
}

/// Multipart body builder.
#[derive(Default)]
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        write!(self.body, "--{BOUNDARY}\r\n").unwrap();
        write!(
            self.body,
            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
        )
        .unwrap();
        write!(self.body, "Content-Type: {content_type}\r\n\r\n").unwrap();
        self.body.extend_from_slice(bytes);
        write!(self.body, "\r\n").unwrap();
        self
    }

    pub fn pdf(self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.file(name, file_name, "application/pdf", bytes)
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        write!(self.body, "--{BOUNDARY}\r\n").unwrap();
        write!(
            self.body,
            "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
        )
        .unwrap();
        write!(self.body, "{value}\r\n").unwrap();
        self
    }

    pub fn request(mut self, uri: &str) -> Request<Body> {
        write!(self.body, "--{BOUNDARY}--\r\n").unwrap();
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Post `form` and expect `{url}`; returns the URL.
pub async fn post_ok(app: &Router, uri: &str, form: Form) -> String {
    let response = send(app, form.request(uri)).await;
    let status = response.status();
    let json = body_json(response).await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {json}");
    json["url"].as_str().unwrap().to_string()
}

/// Post `form` and expect an error; returns the status and message.
pub async fn post_err(app: &Router, uri: &str, form: Form) -> (StatusCode, String) {
    let response = send(app, form.request(uri)).await;
    let status = response.status();
    let json = body_json(response).await;
    (status, json["error"].as_str().unwrap_or_default().to_string())
}

/// GET a download URL; returns the status, headers of interest and body.
pub async fn download(app: &Router, url: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder().uri(url).body(Body::empty()).unwrap();
    let response = send(app, request).await;
    let status = response.status();
    let disposition = response
        .headers()
        .get("content-disposition")
        .map(|v| v.to_str().unwrap().to_string());
    (status, disposition, body_bytes(response).await)
}

/// A PDF of `pages` A4 pages, each showing `Page <n>`.
pub fn numbered_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {n}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// A one-page [`numbered_pdf`] whose trailer declares standard encryption.
pub fn encrypted_pdf() -> Vec<u8> {
    let mut doc = Document::load_mem(&numbered_pdf(1)).unwrap();
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "P" => -4,
        "O" => Object::String(vec![0x5a; 32], StringFormat::Hexadecimal),
        "U" => Object::String(vec![0xa5; 32], StringFormat::Hexadecimal),
    });
    doc.trailer.set("Encrypt", encrypt_id);
    let file_id = Object::String(vec![0x11; 16], StringFormat::Hexadecimal);
    doc.trailer.set("ID", vec![file_id.clone(), file_id]);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// The `Page <n>` labels of a PDF produced from [`numbered_pdf`], in order.
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let content = doc.get_page_content(*id).unwrap();
            let text = String::from_utf8_lossy(&content);
            let start = text.find("(Page ").unwrap() + 1;
            let end = start + text[start..].find(')').unwrap();
            text[start..end].to_string()
        })
        .collect()
}

pub fn rotations(bytes: &[u8]) -> Vec<i64> {
    let pdf = PdfFile::load(bytes).unwrap();
    (0..pdf.page_count())
        .map(|i| pdf.page_rotation(i).unwrap())
        .collect()
}
