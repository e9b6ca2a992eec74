use anyhow::Result;

/// Opaque identifier for the engine's single presentation.
///
/// Returned by [`Engine::initialize`] and passed back on every query. The
/// bridge never interprets the raw value; it is stable for the process
/// lifetime.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PresentationHandle(u32);

impl PresentationHandle {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn into_raw(self) -> u32 {
        self.0
    }
}

/// The two GPU-bound buffer kinds the engine exposes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    /// Per-instance geometry that changes on interaction: 5 f32 fields per
    /// instance (rect x/y/w/h + visibility flag).
    Dynamic,
    /// Per-instance color, fixed after boot: 3 bytes per instance.
    Constant,
}

/// Contract implemented by the external computation engine.
///
/// Addresses and counts are `u32`: the engine lives in a 32-bit address
/// space, and its descriptor records are u32 words. The bridge widens to
/// `usize` at indexing sites.
///
/// Memory discipline: any `&mut self` call may grow the linear region and
/// relocate its backing storage. Callers must re-derive all views from
/// [`Engine::memory`] after such a call before reading them.
pub trait Engine {
    /// Runs the engine's boot entry point and returns the presentation
    /// handle all other queries take.
    fn initialize(&mut self) -> Result<PresentationHandle>;

    /// The engine's linear memory region, as it currently stands.
    ///
    /// The region base must be at least 4-byte aligned so typed views over
    /// word-aligned offsets are representable.
    fn memory(&self) -> &[u8];

    /// Byte offset of the given buffer within the linear region.
    fn buffer_address(&self, handle: PresentationHandle, kind: BufferKind) -> u32;

    /// Number of instances stored in the given buffer.
    fn buffer_element_count(&self, handle: PresentationHandle, kind: BufferKind) -> u32;

    /// Byte offset of the 3-element u32 dirty record `[flag, first, last]`.
    ///
    /// At boot the third element holds the total instance count; afterwards
    /// it is the inclusive end of the most recent dirty range.
    fn dirty_record_address(&self, handle: PresentationHandle) -> u32;

    /// Grid width in cells. Read once at boot; fixed for the session.
    fn viewport_width(&self, handle: PresentationHandle) -> u32;

    /// Grid height in cells. Read once at boot; fixed for the session.
    fn viewport_height(&self, handle: PresentationHandle) -> u32;

    /// Applies `count` interactions at the given cell.
    ///
    /// Pure side effect on engine memory and the dirty record; no return
    /// value is consumed by the bridge.
    fn handle_interaction(
        &mut self,
        handle: PresentationHandle,
        cell_x: u32,
        cell_y: u32,
        count: u32,
    );
}
