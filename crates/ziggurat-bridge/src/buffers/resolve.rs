use crate::engine::{BufferKind, Engine, PresentationHandle};

/// f32 fields per instance in the dynamic buffer: rect x/y/w/h + visibility.
pub const FIELDS_PER_INSTANCE: usize = 5;

/// Color channel bytes per instance in the constant buffer.
pub const COLOR_CHANNELS: usize = 3;

/// Location and shape of one engine-owned GPU buffer.
///
/// `base` is a byte offset into the linear region. The descriptor itself is
/// stable for the session; views derived through it are not.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BufferDescriptor {
    pub base: u32,
    pub element_count: u32,
    pub kind: BufferKind,
}

impl BufferDescriptor {
    /// Length of the dynamic buffer's f32 view, in floats.
    #[inline]
    pub fn float_len(&self) -> usize {
        debug_assert_eq!(self.kind, BufferKind::Dynamic);
        self.element_count as usize * FIELDS_PER_INSTANCE
    }

    /// Length of the constant buffer's byte view.
    #[inline]
    pub fn color_byte_len(&self) -> usize {
        debug_assert_eq!(self.kind, BufferKind::Constant);
        self.element_count as usize * COLOR_CHANNELS
    }
}

/// Queries the engine for one buffer's address and element count.
pub fn resolve<E: Engine>(
    engine: &E,
    handle: PresentationHandle,
    kind: BufferKind,
) -> BufferDescriptor {
    BufferDescriptor {
        base: engine.buffer_address(handle, kind),
        element_count: engine.buffer_element_count(handle, kind),
        kind,
    }
}

/// Maps constant-buffer color bytes to the f32 stream bound to the color
/// attribute: each channel byte in [0, 255] becomes a float in [0, 1].
pub fn normalized_colors(bytes: &[u8]) -> Vec<f32> {
    bytes.iter().map(|&b| f32::from(b) / 255.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── descriptor shapes ─────────────────────────────────────────────────

    #[test]
    fn dynamic_view_is_five_floats_per_instance() {
        let d = BufferDescriptor {
            base: 64,
            element_count: 9,
            kind: BufferKind::Dynamic,
        };
        assert_eq!(d.float_len(), 45);
    }

    #[test]
    fn constant_view_is_three_bytes_per_instance() {
        let d = BufferDescriptor {
            base: 256,
            element_count: 9,
            kind: BufferKind::Constant,
        };
        assert_eq!(d.color_byte_len(), 27);
    }

    // ── color normalization ───────────────────────────────────────────────

    #[test]
    fn normalization_is_exact_at_the_boundaries() {
        let colors = normalized_colors(&[0, 255]);
        assert_eq!(colors[0], 0.0);
        assert_eq!(colors[1], 1.0);
    }

    #[test]
    fn normalization_divides_by_255() {
        let colors = normalized_colors(&[51, 102, 204]);
        assert_eq!(colors, vec![51.0 / 255.0, 102.0 / 255.0, 204.0 / 255.0]);
    }

    #[test]
    fn normalization_preserves_channel_order_and_length() {
        let bytes = [10u8, 20, 30, 40, 50, 60];
        let colors = normalized_colors(&bytes);
        assert_eq!(colors.len(), bytes.len());
        assert!(colors.windows(2).all(|w| w[0] < w[1]));
    }
}
