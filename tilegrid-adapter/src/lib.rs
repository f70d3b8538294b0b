//! Adapter utilities for the `tilegrid` crate.
//!
//! The `tilegrid` crate is UI-agnostic and focuses on the core layout, window and edit state.
//! This crate provides small, framework-neutral helpers commonly needed by adapters:
//!
//! - Scroll anchoring (keep the visible tiles in place while items are added above them)
//! - A frame-driven [`Controller`] that runs scheduling passes and forwards container events
//!
//! This crate is intentionally framework-agnostic (no ratatui/egui bindings).
#![forbid(unsafe_code)]

mod anchor;
mod controller;


pub use anchor::{ScrollAnchor, apply_anchor, capture_first_visible_anchor};
pub use controller::{Controller, FrameOutcome};
