//! Browser DOM layer for byte-range annotation.
//!
//! Implements `bytelabel_core::ViewBinding` over a rendered byte grid. It
//! assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom_view`: byte node lookup, painting and click handlers
//! - `logging`: console tracing and panic hook setup
//!
//! # Re-exports
//!
//! This crate re-exports `bytelabel-core` for convenience, so consumers
//! only need to depend on `bytelabel-browser`.

pub use bytelabel_core;
pub use bytelabel_core::*;

pub mod dom_view;
pub mod logging;

pub use dom_view::{DomByteNode, DomByteView};
pub use logging::init_logging;
