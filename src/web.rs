//! Browser glue: the output canvas and asset fetching.

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::core::error::{DisplayError, DisplayResult};

/// Id of the `<canvas>` element the viewer draws into.
pub const CANVAS_ID: &str = "clockview-canvas";

/// Look up the output canvas and size its backing store to the CSS
/// size times the device pixel ratio.
pub fn canvas() -> Option<web_sys::HtmlCanvasElement> {
    let window = web_sys::window()?;
    let document = window.document()?;
    let canvas = document
        .get_element_by_id(CANVAS_ID)?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .ok()?;

    let dpr = window.device_pixel_ratio();
    let rect = canvas.get_bounding_client_rect();
    canvas.set_width((rect.width() * dpr).round().max(1.0) as u32);
    canvas.set_height((rect.height() * dpr).round().max(1.0) as u32);
    Some(canvas)
}

/// Fetch `url` and return the response body.
pub async fn fetch_bytes(url: &str) -> DisplayResult<Vec<u8>> {
    let window = web_sys::window().ok_or_else(|| DisplayError::Fetch("no window".to_string()))?;

    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| fetch_error(url, e))?
        .dyn_into::<web_sys::Response>()
        .map_err(|e| fetch_error(url, e))?;
    if !response.ok() {
        return Err(DisplayError::Fetch(format!("{}: HTTP {}", url, response.status())));
    }

    let buffer = JsFuture::from(response.array_buffer().map_err(|e| fetch_error(url, e))?)
        .await
        .map_err(|e| fetch_error(url, e))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

fn fetch_error(url: &str, value: wasm_bindgen::JsValue) -> DisplayError {
    DisplayError::Fetch(format!("{}: {:?}", url, value))
}
