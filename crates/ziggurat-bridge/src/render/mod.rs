//! GPU rendering subsystem.
//!
//! One renderer, one pipeline, one instanced draw: every grid cell is an
//! instance expanded to two triangles in the vertex stage. Invisible cells
//! are drawn with zero alpha instead of being excluded, which keeps the
//! instance count and vertex layout constant for the session.
//!
//! Convention:
//! - CPU geometry is in cell units (top-left origin, +Y down).
//! - The vertex shader converts to NDC using a viewport uniform, flipping Y.

mod cells;

pub use cells::{CellRenderer, DrawParams, VERTICES_PER_INSTANCE, draw_params};
