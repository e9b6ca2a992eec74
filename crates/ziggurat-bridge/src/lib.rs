//! Ziggurat bridge crate.
//!
//! This crate interprets a computation engine's linear memory as typed GPU
//! buffers and keeps an instanced cell-grid pipeline in sync with it, one
//! dirty range at a time.

pub mod engine;
pub mod memory;
pub mod buffers;
pub mod sync;
pub mod grid;
pub mod session;

pub mod device;
pub mod render;
pub mod window;
pub mod logging;
