/// Zero-copy window onto the engine's linear memory region.
///
/// A `MemoryView` and every slice derived from it borrow the region passed
/// to [`MemoryView::new`]. Because mutating engine calls take `&mut self`,
/// no view can survive a boundary crossing; callers re-derive after every
/// call into the engine.
///
/// Offsets and lengths must come from just-resolved descriptors. Requesting
/// a range outside the region is a contract violation by the caller and
/// panics.
#[derive(Debug, Copy, Clone)]
pub struct MemoryView<'m> {
    region: &'m [u8],
}

impl<'m> MemoryView<'m> {
    #[inline]
    pub fn new(region: &'m [u8]) -> Self {
        Self { region }
    }

    /// Total size of the region in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.region.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Byte view of `len` bytes starting at `offset`.
    #[inline]
    pub fn bytes(&self, offset: usize, len: usize) -> &'m [u8] {
        &self.region[offset..offset + len]
    }

    /// f32 view of `len` floats starting at byte `offset`.
    ///
    /// `offset` must be 4-byte aligned relative to the (word-aligned)
    /// region base.
    #[inline]
    pub fn f32s(&self, offset: usize, len: usize) -> &'m [f32] {
        bytemuck::cast_slice(&self.region[offset..offset + len * 4])
    }

    /// u32 view of `len` words starting at byte `offset`.
    ///
    /// Same alignment requirement as [`MemoryView::f32s`].
    #[inline]
    pub fn u32s(&self, offset: usize, len: usize) -> &'m [u32] {
        bytemuck::cast_slice(&self.region[offset..offset + len * 4])
    }

    /// Owned copy of `len` bytes starting at `offset`.
    ///
    /// For one-shot decoding only (diagnostic message extraction), where the
    /// bytes must outlive potential memory growth.
    #[inline]
    pub fn snapshot(&self, offset: usize, len: usize) -> Vec<u8> {
        self.region[offset..offset + len].to_vec()
    }
}
