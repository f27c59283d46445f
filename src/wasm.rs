use wasm_bindgen::prelude::*;

/// Reflow a JSON document; returns the output document as JSON.
#[wasm_bindgen]
pub fn paginate_json(json: &str) -> Result<String, JsValue> {
    crate::paginate_json(json).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Captured print HTML for a JSON document.
#[wasm_bindgen]
pub fn render_print_html(json: &str) -> Result<String, JsValue> {
    let input: crate::DocumentInput =
        serde_json::from_str(json).map_err(|e| JsValue::from_str(&crate::PagewrightError::from(e).to_string()))?;
    crate::paginate_document(&input)
        .map(|p| p.print_html)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
