//! # Document Service Contracts
//!
//! Request and response shapes for the backend that stores drafts and turns
//! captured pages into PDFs. Transport is the host's business: it implements
//! [`DocumentService`] by POSTing a JSON body to an endpoint with the given
//! headers. [`DocumentClient`] layers the typed calls and CSRF handling on
//! top.

use serde::{Deserialize, Serialize};

use crate::chrome::print_stylesheet;
use crate::config::EditorConfig;
use crate::error::PagewrightError;
use crate::html::{self, HtmlElement, HtmlNode};
use crate::model::{Roster, Signatories};
use crate::signature::Signature;

/// Classes of elements that only make sense in the live editor.
pub const INTERACTIVE_CLASSES: [&str; 4] = ["toolbar", "add-form", "delete-btn", "no-print"];

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("no CSRF token available")]
    MissingCsrfToken,
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("{endpoint} rejected the request: {message}")]
    Rejected { endpoint: String, message: String },
    #[error("malformed JSON for {endpoint}: {source}")]
    Json {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    SaveDocument,
    Preview,
    GeneratePdf,
    CleanupPreview,
    SubmitForApproval,
}

impl Endpoint {
    /// Last path segment; the host supplies the prefix.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::SaveDocument => "save-document",
            Endpoint::Preview => "preview",
            Endpoint::GeneratePdf => "generate-pdf",
            Endpoint::CleanupPreview => "cleanup-preview",
            Endpoint::SubmitForApproval => "submit-for-approval",
        }
    }
}

/// The host's HTTP layer.
pub trait DocumentService {
    fn post(
        &self,
        endpoint: Endpoint,
        headers: &[(&str, String)],
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ServiceError>;
}

/// A CSRF token and the header it travels in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub header: &'static str,
    pub value: String,
}

impl CsrfToken {
    /// Prefer the `csrf-token` meta tag; fall back to the `XSRF-TOKEN`
    /// cookie, whose value is percent-encoded.
    pub fn resolve(meta_content: Option<&str>, cookie_header: Option<&str>) -> Option<Self> {
        if let Some(meta) = meta_content.map(str::trim).filter(|m| !m.is_empty()) {
            return Some(CsrfToken {
                header: "X-CSRF-TOKEN",
                value: meta.to_string(),
            });
        }
        let raw = cookie_header?.split(';').find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name.trim() == "XSRF-TOKEN").then(|| value.trim())
        })?;
        let value = match urlencoding::decode(raw) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => {
                log::warn!("XSRF-TOKEN cookie is not valid UTF-8 once decoded; sending it raw");
                raw.to_string()
            }
        };
        Some(CsrfToken {
            header: "X-XSRF-TOKEN",
            value,
        })
    }
}

/// Snapshot saved with a draft, JSON-stringified into `document_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentData {
    pub html: String,
    pub pages: Vec<String>,
    pub members: Roster,
    pub signatories: Signatories,
    pub signatures: Vec<Signature>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDocumentRequest {
    pub document_html: String,
    pub document_data: String,
}

impl SaveDocumentRequest {
    pub fn new(document_html: String, data: &DocumentData) -> Result<Self, PagewrightError> {
        Ok(Self {
            document_html,
            document_data: serde_json::to_string(data)?,
        })
    }
}

/// Body shared by preview, final generation and submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub html: String,
    pub members: Roster,
    pub signatories: Signatories,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupRequest {
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveDocumentResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub success: bool,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratePdfResponse {
    pub success: bool,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Responses that report success in-band.
trait Acknowledged {
    fn success(&self) -> bool;
    fn message(&self) -> Option<&str>;
}

macro_rules! acknowledged {
    ($($ty:ty),*) => {
        $(impl Acknowledged for $ty {
            fn success(&self) -> bool {
                self.success
            }
            fn message(&self) -> Option<&str> {
                self.message.as_deref()
            }
        })*
    };
}

acknowledged!(SaveDocumentResponse, PreviewResponse, GeneratePdfResponse, SubmitResponse);

pub struct DocumentClient<'a> {
    service: &'a dyn DocumentService,
    csrf: Option<CsrfToken>,
}

impl<'a> DocumentClient<'a> {
    pub fn new(service: &'a dyn DocumentService, csrf: Option<CsrfToken>) -> Self {
        Self { service, csrf }
    }

    fn call<B, R>(&self, endpoint: Endpoint, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize,
        R: for<'de> Deserialize<'de> + Acknowledged,
    {
        let csrf = self.csrf.as_ref().ok_or(ServiceError::MissingCsrfToken)?;
        let body = serde_json::to_value(body).map_err(|source| ServiceError::Json {
            endpoint: endpoint.path().to_string(),
            source,
        })?;
        let headers = [
            (csrf.header, csrf.value.clone()),
            ("Content-Type", "application/json".to_string()),
            ("Accept", "application/json".to_string()),
        ];
        log::info!("POST {}", endpoint.path());
        let raw = self.service.post(endpoint, &headers, &body)?;
        let response: R =
            serde_json::from_value(raw).map_err(|source| ServiceError::Json {
                endpoint: endpoint.path().to_string(),
                source,
            })?;
        if !response.success() {
            return Err(ServiceError::Rejected {
                endpoint: endpoint.path().to_string(),
                message: response.message().unwrap_or("no message").to_string(),
            });
        }
        Ok(response)
    }

    pub fn save_document(&self, request: &SaveDocumentRequest) -> Result<SaveDocumentResponse, ServiceError> {
        self.call(Endpoint::SaveDocument, request)
    }

    pub fn preview(&self, request: &RenderRequest) -> Result<PreviewResponse, ServiceError> {
        self.call(Endpoint::Preview, request)
    }

    pub fn generate_pdf(&self, request: &RenderRequest) -> Result<GeneratePdfResponse, ServiceError> {
        self.call(Endpoint::GeneratePdf, request)
    }

    /// Best effort: the preview file is temporary either way.
    pub fn cleanup_preview(&self, filename: &str) -> Result<(), ServiceError> {
        let csrf = self.csrf.as_ref().ok_or(ServiceError::MissingCsrfToken)?;
        let body = serde_json::to_value(CleanupRequest {
            filename: filename.to_string(),
        })
        .map_err(|source| ServiceError::Json {
            endpoint: Endpoint::CleanupPreview.path().to_string(),
            source,
        })?;
        self.service
            .post(Endpoint::CleanupPreview, &[(csrf.header, csrf.value.clone())], &body)
            .map(|_| ())
    }

    pub fn submit_for_approval(&self, request: &RenderRequest) -> Result<SubmitResponse, ServiceError> {
        self.call(Endpoint::SubmitForApproval, request)
    }
}

fn is_interactive(el: &HtmlElement) -> bool {
    INTERACTIVE_CLASSES.iter().any(|c| el.has_class(c))
}

fn make_static(nodes: &mut [HtmlNode]) {
    for node in nodes {
        if let HtmlNode::Element(el) = node {
            el.attrs.retain(|(k, _)| k != "contenteditable");
            if el.has_class("pages") {
                let style = el.attr("style").unwrap_or("");
                let style = html::set_style_property(style, "transform", "none");
                el.attrs.retain(|(k, _)| k != "style");
                el.attrs.push(("style".to_string(), style));
            }
            make_static(&mut el.children);
        }
    }
}

/// Turn editor markup into the standalone HTML the PDF service renders:
/// interactive elements removed, nothing editable, no zoom, and the print
/// stylesheet embedded.
pub fn capture_document(editor_markup: &str, config: &EditorConfig) -> Result<String, PagewrightError> {
    let mut nodes = html::parse_fragment(editor_markup)?;
    html::retain_elements(&mut nodes, &is_interactive);
    make_static(&mut nodes);
    let mut out = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>\n");
    out.push_str(&print_stylesheet(config));
    out.push_str("</style></head><body>");
    html::write_nodes(&nodes, &mut out);
    out.push_str("</body></html>");
    Ok(out)
}
