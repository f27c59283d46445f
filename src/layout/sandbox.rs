//! # Measurement Sandbox
//!
//! Lays out the two chrome variants with empty content and reports the
//! height left for content in each. The chrome is static for a session, so
//! this runs once; pagination refuses to run until both heights are known.

use serde::Serialize;

use crate::chrome::{FooterVariant, HeaderVariant};
use crate::config::{ChromeMetrics, EditorConfig, Edges, PageSize};

/// Content-area heights of the first page and of every later page, in CSS px.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentHeightBudget {
    pub first_page_content_h: f64,
    pub subsequent_page_content_h: f64,
}

impl ContentHeightBudget {
    pub fn new(first_page_content_h: f64, subsequent_page_content_h: f64) -> Self {
        Self {
            first_page_content_h,
            subsequent_page_content_h,
        }
    }

    /// Not measured yet (or the chrome leaves no room).
    pub fn is_ready(&self) -> bool {
        self.first_page_content_h > 0.0 && self.subsequent_page_content_h > 0.0
    }

    pub fn for_page(&self, page_index: usize) -> f64 {
        if crate::model::is_first_page(page_index) {
            self.first_page_content_h
        } else {
            self.subsequent_page_content_h
        }
    }
}

pub struct MeasurementSandbox {
    page_size: PageSize,
    margin: Edges,
    chrome: ChromeMetrics,
}

impl MeasurementSandbox {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            page_size: config.page_size,
            margin: config.margin,
            chrome: config.chrome.clone(),
        }
    }

    /// Height left for content between `header` and `footer`.
    pub fn content_height(&self, header: HeaderVariant, footer: FooterVariant) -> f64 {
        let (_, page_h) = self.page_size.dimensions();
        let h = page_h
            - self.margin.vertical()
            - header.height(&self.chrome)
            - footer.height(&self.chrome);
        h.max(0.0)
    }

    pub fn measure(&self) -> ContentHeightBudget {
        let budget = ContentHeightBudget {
            first_page_content_h: self
                .content_height(HeaderVariant::FullLetterhead, FooterVariant::FirstPage),
            subsequent_page_content_h: self
                .content_height(HeaderVariant::MinimalSpacer, FooterVariant::Middle),
        };
        if budget.is_ready() {
            log::debug!(
                "content budget: first page {:.1}px, later pages {:.1}px",
                budget.first_page_content_h,
                budget.subsequent_page_content_h
            );
        } else {
            log::warn!("page chrome leaves no room for content: {:?}", budget);
        }
        budget
    }
}
