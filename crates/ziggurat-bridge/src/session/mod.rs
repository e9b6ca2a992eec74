//! The single presentation session.
//!
//! Everything the bridge needs across a session (handle, buffer
//! descriptors, dirty-record location, grid shape) is resolved during one
//! synchronous boot sequence and carried in an explicit [`Session`] value
//! rather than ambient globals. There is no teardown: process exit reclaims
//! everything.

mod context;

pub use context::{DEFAULT_CELL_SCALE, Session, boot};
