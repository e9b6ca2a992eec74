//! GPU buffer descriptors resolved from the engine.
//!
//! Both buffers are resolved once at boot; kind and element count are fixed
//! for the grid's lifetime. Only the views into them go stale.

mod resolve;

pub use resolve::{
    BufferDescriptor, COLOR_CHANNELS, FIELDS_PER_INSTANCE, normalized_colors, resolve,
};
