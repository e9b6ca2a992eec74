//! A minimal stand-in computation engine.
//!
//! The real engine is an external sandboxed module; this one exists so the
//! viewer can drive the full bridge path end-to-end. It owns a linear
//! memory region laid out the way the bridge expects to find it: the dirty
//! record first, then the dynamic instance fields, then the constant color
//! bytes, then a boot banner.
//!
//! Word-backed storage keeps the region base 4-byte aligned, as real linear
//! memory is.

use anyhow::Result;

use ziggurat_bridge::engine::{BufferKind, DiagnosticsSink, Engine, PresentationHandle};
use ziggurat_bridge::memory::MemoryView;

const DIRTY_BASE: u32 = 0;
const DYNAMIC_BASE: u32 = 12;
const FIELD_BYTES: u32 = 5 * 4;

const BOOT_MESSAGE: &[u8] = b"sandbox engine online";

/// Grid of unit cells that toggle visibility when clicked.
pub struct SandboxEngine<S> {
    words: Vec<u32>,
    width: u32,
    height: u32,
    sink: S,
}

impl<S: DiagnosticsSink> SandboxEngine<S> {
    pub fn new(width: u32, height: u32, sink: S) -> Self {
        Self {
            words: Vec::new(),
            width,
            height,
            sink,
        }
    }

    fn cells(&self) -> u32 {
        self.width * self.height
    }

    fn constant_base(&self) -> u32 {
        DYNAMIC_BASE + self.cells() * FIELD_BYTES
    }

    fn message_base(&self) -> u32 {
        // Keep the banner word-aligned past the color bytes.
        (self.constant_base() + self.cells() * 3).next_multiple_of(4)
    }

    fn put_f32(&mut self, byte_offset: u32, value: f32) {
        self.words[byte_offset as usize / 4] = value.to_bits();
    }

    fn get_f32(&self, byte_offset: u32) -> f32 {
        f32::from_bits(self.words[byte_offset as usize / 4])
    }

    fn visibility_offset(cell: u32) -> u32 {
        DYNAMIC_BASE + cell * FIELD_BYTES + 4 * 4
    }
}

impl<S: DiagnosticsSink> Engine for SandboxEngine<S> {
    fn initialize(&mut self) -> Result<PresentationHandle> {
        let byte_len = self.message_base() + BOOT_MESSAGE.len() as u32;
        self.words = vec![0; byte_len.div_ceil(4) as usize];

        // Record's third word carries the instance count until the first
        // interaction overwrites it with a range end.
        self.words[2] = self.cells();

        for cell in 0..self.cells() {
            let (col, row) = (cell % self.width, cell / self.width);
            let base = DYNAMIC_BASE + cell * FIELD_BYTES;
            self.put_f32(base, col as f32);
            self.put_f32(base + 4, row as f32);
            self.put_f32(base + 8, 1.0);
            self.put_f32(base + 12, 1.0);
            let visible = if (col + row) % 2 == 0 { 1.0 } else { 0.0 };
            self.put_f32(base + 16, visible);
        }

        let constant = self.constant_base() as usize;
        let message = self.message_base() as usize;
        let (width, height) = (self.width, self.height);
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.words);
        for cell in 0..width * height {
            let (col, row) = (cell % width, cell / width);
            let base = constant + cell as usize * 3;
            bytes[base] = (col * 255 / width.max(2).saturating_sub(1)) as u8;
            bytes[base + 1] = (row * 255 / height.max(2).saturating_sub(1)) as u8;
            bytes[base + 2] = 160;
        }

        bytes[message..message + BOOT_MESSAGE.len()].copy_from_slice(BOOT_MESSAGE);

        // Decode the banner out of engine memory the way a host would: an
        // owned snapshot, taken before anything can move the region.
        let banner = MemoryView::new(self.memory())
            .snapshot(self.message_base() as usize, BOOT_MESSAGE.len());
        self.sink.log(&banner);

        Ok(PresentationHandle::from_raw(1))
    }

    fn memory(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    fn buffer_address(&self, _: PresentationHandle, kind: BufferKind) -> u32 {
        match kind {
            BufferKind::Dynamic => DYNAMIC_BASE,
            BufferKind::Constant => self.constant_base(),
        }
    }

    fn buffer_element_count(&self, _: PresentationHandle, _: BufferKind) -> u32 {
        self.cells()
    }

    fn dirty_record_address(&self, _: PresentationHandle) -> u32 {
        DIRTY_BASE
    }

    fn viewport_width(&self, _: PresentationHandle) -> u32 {
        self.width
    }

    fn viewport_height(&self, _: PresentationHandle) -> u32 {
        self.height
    }

    fn handle_interaction(&mut self, _: PresentationHandle, x: u32, y: u32, count: u32) {
        if x >= self.width || y >= self.height {
            self.sink.report_error(b"interaction outside the grid");
            self.words[0] = 0;
            return;
        }

        let cell = y * self.width + x;
        for _ in 0..count {
            let offset = Self::visibility_offset(cell);
            let flipped = if self.get_f32(offset) == 0.0 { 1.0 } else { 0.0 };
            self.put_f32(offset, flipped);
        }

        self.words[0] = 1;
        self.words[1] = cell;
        self.words[2] = cell;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct CapturingSink {
        logs: RefCell<Vec<String>>,
        errors: RefCell<Vec<String>>,
    }

    impl DiagnosticsSink for &CapturingSink {
        fn log(&self, message: &[u8]) {
            self.logs
                .borrow_mut()
                .push(String::from_utf8_lossy(message).into_owned());
        }

        fn report_error(&self, message: &[u8]) {
            self.errors
                .borrow_mut()
                .push(String::from_utf8_lossy(message).into_owned());
        }
    }

    #[test]
    fn boot_banner_reaches_the_sink() {
        let sink = CapturingSink::default();
        let mut engine = SandboxEngine::new(4, 3, &sink);
        engine.initialize().unwrap();
        assert_eq!(sink.logs.borrow().as_slice(), ["sandbox engine online"]);
    }

    #[test]
    fn layout_matches_the_advertised_descriptors() {
        let sink = CapturingSink::default();
        let mut engine = SandboxEngine::new(4, 3, &sink);
        let handle = engine.initialize().unwrap();

        let view = MemoryView::new(engine.memory());
        assert_eq!(view.u32s(DIRTY_BASE as usize, 3), &[0, 0, 12]);

        let dynamic_base = engine.buffer_address(handle, BufferKind::Dynamic);
        let floats = view.f32s(dynamic_base as usize, 12 * 5);
        // Cell 6 sits at column 2, row 1: unit rect, visible on the
        // checkerboard.
        assert_eq!(&floats[30..35], &[2.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn click_toggles_one_cell_and_flags_it() {
        let sink = CapturingSink::default();
        let mut engine = SandboxEngine::new(4, 3, &sink);
        let handle = engine.initialize().unwrap();

        engine.handle_interaction(handle, 1, 2, 1);

        // Cell (1, 2) is index 9 and starts hidden on the checkerboard.
        let view = MemoryView::new(engine.memory());
        assert_eq!(view.u32s(0, 3), &[1, 9, 9]);
        let offset = SandboxEngine::<&CapturingSink>::visibility_offset(9) as usize;
        assert_eq!(view.f32s(offset, 1), &[1.0]);
    }

    #[test]
    fn out_of_grid_interaction_reports_and_clears_the_flag() {
        let sink = CapturingSink::default();
        let mut engine = SandboxEngine::new(4, 3, &sink);
        let handle = engine.initialize().unwrap();

        engine.handle_interaction(handle, 99, 0, 1);

        assert_eq!(sink.errors.borrow().len(), 1);
        let view = MemoryView::new(engine.memory());
        assert_eq!(view.u32s(0, 3)[0], 0);
    }
}
