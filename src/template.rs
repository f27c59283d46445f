//! Starting content for a new document.
//!
//! Each document kind has an HTML skeleton with `{{ path }}` placeholders.
//! Paths are dot-separated and resolved against a JSON data object, so a
//! host can pre-fill the organization name, dates and so on. Anything that
//! doesn't resolve is left blank for the author to type in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PagewrightError;
use crate::html::escape_text;
use crate::model::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    ActivityPlan,
    BudgetRequest,
}

const ACTIVITY_PLAN: &str = "\
<h2 style=\"text-align: center\">ACTIVITY PLAN</h2>\
<p><b>Organization:</b> {{ organization.name }}</p>\
<p><b>Title of Activity:</b> {{ activity.title }}</p>\
<p><b>Date and Venue:</b> {{ activity.date }}, {{ activity.venue }}</p>\
<h3>I. Rationale</h3>\
<p>{{ activity.rationale }}</p>\
<h3>II. Objectives</h3>\
<ol><li>{{ activity.objectives.0 }}</li></ol>\
<h3>III. Program Flow</h3>\
<table><tr><th>Time</th><th>Activity</th><th>Person in Charge</th></tr>\
<tr><td></td><td></td><td></td></tr></table>\
<h3>IV. Expected Output</h3>\
<p></p>";

const BUDGET_REQUEST: &str = "\
<h2 style=\"text-align: center\">BUDGET REQUEST</h2>\
<p><b>Organization:</b> {{ organization.name }}</p>\
<p><b>Activity:</b> {{ activity.title }}</p>\
<p><b>Date:</b> {{ activity.date }}</p>\
<h3>Breakdown of Expenses</h3>\
<table><tr><th>Item</th><th>Quantity</th><th>Unit Cost</th><th>Total</th></tr>\
<tr><td></td><td></td><td></td><td></td></tr>\
<tr><td><b>Grand Total</b></td><td></td><td></td><td>{{ budget.total }}</td></tr></table>\
<h3>Source of Funds</h3>\
<p>{{ budget.source }}</p>";

pub fn skeleton(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::ActivityPlan => ACTIVITY_PLAN,
        DocumentKind::BudgetRequest => BUDGET_REQUEST,
    }
}

/// Traverse a JSON value by dot-path segments.
fn traverse<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Replace every `{{ path }}` in `template` with the escaped value at
/// `path` in `data`.
pub fn fill(template: &str, data: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let path = after[..end].trim();
        match traverse(data, path) {
            Some(value) => out.push_str(&escape_text(&display(value))),
            None => log::debug!("template placeholder {} has no data", path),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// The first page of a new document of `kind`.
pub fn new_document(kind: DocumentKind, data: &Value) -> Result<Page, PagewrightError> {
    Page::from_html(&fill(skeleton(kind), data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fills_nested_paths() {
        let data = json!({ "organization": { "name": "Chess Club" }, "activity": { "objectives": ["Win"] } });
        assert_eq!(fill("<p>{{ organization.name }}</p>", &data), "<p>Chess Club</p>");
        assert_eq!(fill("{{activity.objectives.0}}", &data), "Win");
    }

    #[test]
    fn missing_values_are_blank_and_text_is_escaped() {
        let data = json!({ "a": "<b>&" });
        assert_eq!(fill("[{{ a }}][{{ nope.x }}]", &data), "[&lt;b&gt;&amp;][]");
        assert_eq!(fill("{{ unterminated", &data), "{{ unterminated");
    }

    #[test]
    fn skeletons_parse() {
        for kind in [DocumentKind::ActivityPlan, DocumentKind::BudgetRequest] {
            let page = new_document(kind, &json!({})).unwrap();
            assert!(page.blocks.len() > 3);
            assert!(page.blocks.iter().any(|b| b.is_atomic()));
        }
    }
}
