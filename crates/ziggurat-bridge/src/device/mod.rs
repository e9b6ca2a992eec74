//! GPU device + surface management.
//!
//! Owns the wgpu Instance/Adapter/Device/Queue and the window surface, and
//! hands out per-frame encoders. The drawing surface is sized once at boot
//! from the grid dimensions; resize handling exists only to keep the
//! swapchain valid if the platform forces a new size.

mod gpu;

pub use gpu::{Gpu, GpuFrame, SurfaceErrorAction};
