//! Dirty-range synchronization.
//!
//! After every engine mutation the bridge reads the 3-element dirty record
//! through a fresh view and decides whether (and which) instance sub-range
//! must be re-uploaded. The engine is the record's sole writer; inconsistent
//! contents mean "nothing to upload", never an error.

mod dirty;

pub use dirty::{DIRTY_RECORD_LEN, DirtyRange, dirty_slice, poll};
