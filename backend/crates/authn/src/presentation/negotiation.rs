//! Response Negotiation
//!
//! Renders pipeline failures in the representation the caller asked for.
//! Writers are tried in registration order with the JSON writer appended
//! as the default; see [`platform::accept`] for the scoring rules.

use std::sync::Arc;

use axum::body::Body;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use kernel::error::app_error::{AppError, ErrorEnvelope};
use platform::accept::{self, MediaType};
use serde_json::Value;

// ============================================================================
// ResponseWriter
// ============================================================================

/// Renders an [`AppError`] into a response
pub trait ResponseWriter: Send + Sync {
    /// Media types this writer can produce, preferred first
    fn media_types(&self) -> Vec<MediaType>;

    /// Set status, `Content-Type` and body. Other headers are kept.
    ///
    /// `media_type` is the one the `Accept` header selected, `None` when
    /// the writer was picked as the default.
    fn write(
        &self,
        response: &mut Response<Body>,
        error: &AppError,
        media_type: Option<&MediaType>,
        include_detail: bool,
    );
}

fn set_body(response: &mut Response<Body>, error: &AppError, content_type: &'static str, body: Vec<u8>) {
    *response.status_mut() =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.remove(CONTENT_LENGTH);
    *response.body_mut() = Body::from(body);
}

/// `application/json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseWriter;

impl ResponseWriter for JsonResponseWriter {
    fn media_types(&self) -> Vec<MediaType> {
        vec![MediaType::from_static("application", "json")]
    }

    fn write(
        &self,
        response: &mut Response<Body>,
        error: &AppError,
        _media_type: Option<&MediaType>,
        include_detail: bool,
    ) {
        let body = match serde_json::to_vec(&error.envelope(include_detail)) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize error envelope");
                Vec::new()
            }
        };
        set_body(response, error, "application/json", body);
    }
}

/// `application/xml` and `text/xml`
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <error><code>401</code><reason>Unauthorized</reason><message>Access Denied</message></error>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlResponseWriter;

impl XmlResponseWriter {
    fn render(envelope: &ErrorEnvelope) -> String {
        let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        out.push_str("<error>");
        push_element(&mut out, "code", &envelope.code.to_string());
        push_element(&mut out, "reason", envelope.reason);
        push_element(&mut out, "message", &envelope.message);
        if let Some(detail) = &envelope.detail {
            push_value(&mut out, "detail", detail);
        }
        out.push_str("</error>");
        out
    }
}

impl ResponseWriter for XmlResponseWriter {
    fn media_types(&self) -> Vec<MediaType> {
        vec![
            MediaType::from_static("application", "xml"),
            MediaType::from_static("text", "xml"),
        ]
    }

    fn write(
        &self,
        response: &mut Response<Body>,
        error: &AppError,
        media_type: Option<&MediaType>,
        include_detail: bool,
    ) {
        let content_type = match media_type {
            Some(media_type) if media_type.kind() == "text" => "text/xml",
            _ => "application/xml",
        };
        let body = Self::render(&error.envelope(include_detail));
        set_body(response, error, content_type, body.into_bytes());
    }
}

fn push_element(out: &mut String, name: &str, text: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    escape_into(out, text);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn push_value(out: &mut String, name: &str, value: &Value) {
    let name = element_name(name);
    match value {
        Value::Null => {
            out.push('<');
            out.push_str(&name);
            out.push_str("/>");
        }
        Value::Object(map) => {
            out.push_str(&format!("<{name}>"));
            for (key, value) in map {
                push_value(out, key, value);
            }
            out.push_str(&format!("</{name}>"));
        }
        Value::Array(items) => {
            out.push_str(&format!("<{name}>"));
            for item in items {
                push_value(out, "item", item);
            }
            out.push_str(&format!("</{name}>"));
        }
        Value::String(text) => push_element(out, &name, text),
        other => push_element(out, &name, &other.to_string()),
    }
}

/// Make `name` a valid XML element name
fn element_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    out
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
}

// ============================================================================
// ResponseHandler
// ============================================================================

/// Picks a writer for the caller's `Accept` header
#[derive(Clone)]
pub struct ResponseHandler {
    writers: Vec<Arc<dyn ResponseWriter>>,
    default_writer: Arc<dyn ResponseWriter>,
    include_detail: bool,
}

impl Default for ResponseHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseHandler {
    /// Handler with only the default JSON writer
    pub fn new() -> Self {
        Self {
            writers: Vec::new(),
            default_writer: Arc::new(JsonResponseWriter),
            include_detail: false,
        }
    }

    /// Handler with the XML writer registered
    pub fn standard() -> Self {
        Self::new().with_writer(XmlResponseWriter)
    }

    pub fn with_writer(mut self, writer: impl ResponseWriter + 'static) -> Self {
        self.writers.push(Arc::new(writer));
        self
    }

    pub fn with_shared_writer(mut self, writer: Arc<dyn ResponseWriter>) -> Self {
        self.writers.push(writer);
        self
    }

    pub fn include_detail(mut self, include_detail: bool) -> Self {
        self.include_detail = include_detail;
        self
    }

    /// Writer for the request's `Accept` header, with the media type it
    /// matched
    ///
    /// Missing, unparseable or unmatched headers get the JSON writer.
    pub fn select(&self, request_headers: &HeaderMap) -> (&dyn ResponseWriter, Option<MediaType>) {
        let default = (self.default_writer.as_ref(), None);
        let Some(header) = platform::headers::accept(request_headers) else {
            return default;
        };
        let ranges = match accept::parse_accept(&header) {
            Ok(ranges) => ranges,
            Err(e) => {
                tracing::debug!(error = %e, accept = %header, "Unparseable Accept header");
                return default;
            }
        };

        let offers: Vec<Vec<MediaType>> = self
            .writers
            .iter()
            .chain(std::iter::once(&self.default_writer))
            .map(|writer| writer.media_types())
            .collect();

        let Some(index) = accept::negotiate(&ranges, &offers) else {
            return default;
        };
        let writer = self
            .writers
            .get(index)
            .unwrap_or(&self.default_writer)
            .as_ref();
        let media_type = accept::preferred_media_type(&ranges, &offers[index]).cloned();
        (writer, media_type)
    }

    /// Render `error` into `response` using the negotiated writer
    pub fn write(&self, request_headers: &HeaderMap, response: &mut Response<Body>, error: &AppError) {
        let (writer, media_type) = self.select(request_headers);
        writer.write(response, error, media_type.as_ref(), self.include_detail);
    }

    /// Render `error` into a fresh response
    pub fn render(&self, request_headers: &HeaderMap, error: &AppError) -> Response<Body> {
        let mut response = Response::new(Body::empty());
        self.write(request_headers, &mut response, error);
        response
    }
}
