//! WASM bindings for the page and popup contexts.
//!
//! Extraction and pagination are exposed to JavaScript via wasm-bindgen;
//! the host page stays on the JavaScript side.

use wasm_bindgen::prelude::*;

use crate::config::AdmissionConfig;
use crate::extract::ingest;
use crate::paging;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Extract normalized text from an uploaded file.
///
/// Fails with the user-facing message for the failure class.
#[wasm_bindgen]
pub fn extract_document(file_name: &str, data: &[u8]) -> Result<String, JsValue> {
    ingest(file_name, data, &AdmissionConfig::default())
        .map(|file| file.extraction.text)
        .map_err(|e| JsValue::from_str(e.user_message()))
}

/// Page count at the given page size.
#[wasm_bindgen]
pub fn page_count(text: &str, page_size: usize) -> usize {
    paging::total_pages(text, page_size)
}

/// Text of one page; empty past the end.
#[wasm_bindgen]
pub fn page_slice(text: &str, page_size: usize, index: usize) -> String {
    paging::page(text, page_size, index).to_string()
}

/// Page size for a host of `selection_chars` characters.
#[wasm_bindgen]
pub fn page_size_for(selection_chars: usize) -> usize {
    paging::page_size_for(selection_chars, crate::config::PagingConfig::default().min_page_size)
}
