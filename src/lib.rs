//! In-page probe for browser automation drivers: resilient element
//! resolution (CSS and XPath candidate lists, text predicates), geometry and
//! visibility checks, and live annotation overlays that follow their target.
//!
//! The module compiles to WebAssembly and is driven through [`Probe`].

use wasm_bindgen::prelude::*;

// Console output stays off on host pages unless built with `console-log`.
macro_rules! probe_log {
    ($($arg:tt)*) => {
        if cfg!(feature = "console-log") {
            web_sys::console::log_1(&format!($($arg)*).into());
        }
    };
}

macro_rules! probe_warn {
    ($($arg:tt)*) => {
        if cfg!(feature = "console-log") {
            web_sys::console::warn_1(&format!($($arg)*).into());
        }
    };
}

pub mod actions;
pub mod config;
pub mod context;
mod dom;
pub mod error;
pub mod geometry;
pub mod inject;
pub mod overlay;
pub mod probe;
pub mod query;
pub mod text;
pub mod tracer;
pub mod wait;

pub use config::ProbeConfig;
pub use context::Context;
pub use error::ProbeError;
pub use geometry::BoundingBox;
pub use overlay::OverlayHandle;
pub use probe::Probe;

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    #[cfg(debug_assertions)]
    console_error_panic_hook::set_once(); // Better panic messages in browser
    probe_log!("pageprobe initialized");
    Ok(())
}
