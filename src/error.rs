//! Structured error types for the pagewright engine.
//!
//! The real error sources are JSON input, HTML markup, fonts, signature
//! images, out-of-range page references and the external document service.
//! Outcomes that are part of normal editing (a duplicate signature, budgets
//! that are not measured yet) are modelled as values, not errors.

use std::fmt;

/// The unified error type returned by all public pagewright API functions.
#[derive(Debug)]
pub enum PagewrightError {
    /// JSON input failed to parse as a valid pagewright document or config.
    ParseError {
        source: serde_json::Error,
        hint: String,
    },
    /// HTML content could not be read into the block model.
    MarkupError(String),
    /// A font could not be loaded or parsed.
    FontError(String),
    /// A signature image could not be decoded.
    ImageError(String),
    /// A page index pointed past the end of the document.
    PageOutOfRange { index: usize, count: usize },
    /// The signatory category does not accept another entry.
    CategoryFull(String),
    /// The external document service failed. Editor state is left untouched.
    ServiceError(crate::export::ServiceError),
}

impl fmt::Display for PagewrightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagewrightError::ParseError { source, hint } => {
                write!(f, "Failed to parse input: {}", source)?;
                if !hint.is_empty() {
                    write!(f, "\n  Hint: {}", hint)?;
                }
                Ok(())
            }
            PagewrightError::MarkupError(msg) => write!(f, "Markup error: {}", msg),
            PagewrightError::FontError(msg) => write!(f, "Font error: {}", msg),
            PagewrightError::ImageError(msg) => write!(f, "Image error: {}", msg),
            PagewrightError::PageOutOfRange { index, count } => {
                write!(f, "Page {} does not exist (document has {} pages)", index, count)
            }
            PagewrightError::CategoryFull(label) => {
                write!(f, "\"{}\" already has a signatory", label)
            }
            PagewrightError::ServiceError(e) => write!(f, "Document service error: {}", e),
        }
    }
}

impl std::error::Error for PagewrightError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PagewrightError::ParseError { source, .. } => Some(source),
            PagewrightError::ServiceError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PagewrightError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PagewrightError::ParseError { source: e, hint }
    }
}

impl From<crate::export::ServiceError> for PagewrightError {
    fn from(e: crate::export::ServiceError) -> Self {
        PagewrightError::ServiceError(e)
    }
}
