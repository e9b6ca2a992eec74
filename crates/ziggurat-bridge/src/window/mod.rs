//! Window runtime.
//!
//! Single window, event-driven: the engine mutates only in response to a
//! pointer click, and every click runs the full mutate → re-view → sync →
//! upload → draw cycle synchronously before control returns to the loop.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
