//! formguard WASM
//!
//! Browser bindings for the formguard engine: a DOM-backed [`FormHost`]
//! and the `FormValidator` class exported to JavaScript.
//!
//! [`FormHost`]: formguard::FormHost

use wasm_bindgen::prelude::*;

mod bindings;
mod console;
pub mod dom;

pub use bindings::FormValidator;
pub use dom::DomHost;

/// Set panic hook and route diagnostics to the browser console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    console::init(tracing::Level::INFO);
}
