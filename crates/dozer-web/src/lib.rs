//! Dozer Web
//!
//! Browser front end for a Dozer notepage: draws notes into the DOM and
//! feeds DOM events into a [`dozer_core::NotepageSession`].

pub mod page;

#[cfg(target_arch = "wasm32")]
mod dom;

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use dom::{DomProbe, DomSurface};

#[cfg(target_arch = "wasm32")]
pub use web::run_wasm;
