use std::time::Instant;

use anyhow::Result;

use crate::buffers::{self, BufferDescriptor, normalized_colors};
use crate::engine::{BufferKind, Engine, PresentationHandle};
use crate::grid::{CellCoord, GridSize};
use crate::memory::MemoryView;
use crate::sync::{self, DIRTY_RECORD_LEN, DirtyRange};

/// Per-cell pixel factor used when the shell does not override it.
pub const DEFAULT_CELL_SCALE: u32 = 16;

/// Session-wide context resolved at boot and passed explicitly to every
/// component that needs it.
///
/// Descriptors and the dirty-record offset are fixed for the session; views
/// derived through them must be re-acquired after every engine call.
#[derive(Debug, Copy, Clone)]
pub struct Session {
    pub handle: PresentationHandle,
    pub dynamic: BufferDescriptor,
    pub constant: BufferDescriptor,
    /// Byte offset of the `[flag, first, last]` dirty record.
    pub dirty_base: u32,
    /// Total instance count, taken from the dirty record's third word at
    /// boot and fixed thereafter.
    pub instances: u32,
    pub grid: GridSize,
}

/// Runs the boot sequence against the engine.
///
/// Order matters and mirrors the engine's own initialization: initialize,
/// resolve both buffer descriptors, locate the dirty record, derive the
/// instance count from it, then read the grid dimensions.
pub fn boot<E: Engine>(engine: &mut E) -> Result<Session> {
    let started = Instant::now();
    let handle = engine.initialize()?;

    let dynamic = buffers::resolve(engine, handle, BufferKind::Dynamic);
    let constant = buffers::resolve(engine, handle, BufferKind::Constant);
    let dirty_base = engine.dirty_record_address(handle);

    let view = MemoryView::new(engine.memory());
    let instances = view.u32s(dirty_base as usize, DIRTY_RECORD_LEN)[2];

    let grid = GridSize::new(engine.viewport_width(handle), engine.viewport_height(handle));

    if instances != dynamic.element_count {
        log::warn!(
            "instance count {} from dirty record disagrees with dynamic buffer count {}",
            instances,
            dynamic.element_count
        );
    }

    log::info!(
        "presentation {:?} booted in {:.3}s: {}x{} cells, {} instances",
        handle.into_raw(),
        started.elapsed().as_secs_f64(),
        grid.width,
        grid.height,
        instances
    );

    Ok(Session {
        handle,
        dynamic,
        constant,
        dirty_base,
        instances,
        grid,
    })
}

impl Session {
    /// Fresh f32 view of the dynamic buffer.
    pub fn dynamic_floats<'m>(&self, view: &MemoryView<'m>) -> &'m [f32] {
        view.f32s(self.dynamic.base as usize, self.dynamic.float_len())
    }

    /// Constant-buffer colors, normalized to the [0, 1] f32 stream the color
    /// attribute binds.
    pub fn constant_colors(&self, view: &MemoryView<'_>) -> Vec<f32> {
        normalized_colors(view.bytes(self.constant.base as usize, self.constant.color_byte_len()))
    }

    /// Runs one interaction through the engine and polls the dirty record.
    ///
    /// The returned range (if any) is the sub-range of instances the caller
    /// must re-upload before the next draw. The poll goes through a view
    /// derived *after* the engine call; anything held from before it is
    /// invalid by then.
    pub fn interact<E: Engine>(
        &self,
        engine: &mut E,
        cell: CellCoord,
        count: u32,
    ) -> Option<DirtyRange> {
        engine.handle_interaction(self.handle, cell.x, cell.y, count);

        let view = MemoryView::new(engine.memory());
        sync::poll(&view, self.dirty_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::dirty_slice;

    // Minimal in-memory engine: a 3x3 grid of unit cells whose linear
    // memory is laid out as [dirty record | dynamic floats | color bytes].
    // Every mutating call reallocates the backing storage to imitate the
    // growth-relocation behavior views must survive.
    struct TestEngine {
        words: Vec<u32>,
        grid: GridSize,
    }

    const GRID_W: u32 = 3;
    const GRID_H: u32 = 3;
    const CELLS: u32 = GRID_W * GRID_H;
    const DIRTY_BASE: u32 = 0;
    const DYNAMIC_BASE: u32 = 12;
    const CONSTANT_BASE: u32 = DYNAMIC_BASE + CELLS * 5 * 4;

    impl TestEngine {
        fn new() -> Self {
            Self {
                words: Vec::new(),
                grid: GridSize::new(GRID_W, GRID_H),
            }
        }

        fn bytes_mut(&mut self) -> &mut [u8] {
            bytemuck::cast_slice_mut(&mut self.words)
        }

        fn put_f32(&mut self, offset: u32, value: f32) {
            self.words[offset as usize / 4] = value.to_bits();
        }

        fn get_f32(&self, offset: u32) -> f32 {
            f32::from_bits(self.words[offset as usize / 4])
        }

        fn visibility_offset(cell: u32) -> u32 {
            DYNAMIC_BASE + cell * 5 * 4 + 4 * 4
        }
    }

    impl Engine for TestEngine {
        fn initialize(&mut self) -> Result<PresentationHandle> {
            let word_len = (CONSTANT_BASE + CELLS * 3).div_ceil(4) as usize;
            self.words = vec![0; word_len];

            self.words[2] = CELLS; // record[2] carries the count at boot
            for cell in 0..CELLS {
                let base = DYNAMIC_BASE + cell * 5 * 4;
                self.put_f32(base, (cell % GRID_W) as f32);
                self.put_f32(base + 4, (cell / GRID_W) as f32);
                self.put_f32(base + 8, 1.0);
                self.put_f32(base + 12, 1.0);
                self.put_f32(base + 16, 1.0); // all cells visible at boot
            }
            let constant = CONSTANT_BASE as usize;
            for (i, b) in self.bytes_mut()[constant..].iter_mut().enumerate() {
                *b = (i * 9) as u8;
            }
            Ok(PresentationHandle::from_raw(1))
        }

        fn memory(&self) -> &[u8] {
            bytemuck::cast_slice(&self.words)
        }

        fn buffer_address(&self, _: PresentationHandle, kind: BufferKind) -> u32 {
            match kind {
                BufferKind::Dynamic => DYNAMIC_BASE,
                BufferKind::Constant => CONSTANT_BASE,
            }
        }

        fn buffer_element_count(&self, _: PresentationHandle, _: BufferKind) -> u32 {
            CELLS
        }

        fn dirty_record_address(&self, _: PresentationHandle) -> u32 {
            DIRTY_BASE
        }

        fn viewport_width(&self, _: PresentationHandle) -> u32 {
            self.grid.width
        }

        fn viewport_height(&self, _: PresentationHandle) -> u32 {
            self.grid.height
        }

        fn handle_interaction(&mut self, _: PresentationHandle, x: u32, y: u32, count: u32) {
            // Relocate the region, as linear-memory growth may.
            let relocated = self.words.clone();
            self.words = relocated;

            if x >= GRID_W || y >= GRID_H {
                self.words[0] = 0;
                return;
            }
            let cell = y * GRID_W + x;
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

    fn booted() -> (TestEngine, Session) {
        let mut engine = TestEngine::new();
        let session = boot(&mut engine).unwrap();
        (engine, session)
    }

    // ── boot ──────────────────────────────────────────────────────────────

    #[test]
    fn boot_resolves_a_three_by_three_session() {
        let (_, session) = booted();
        assert_eq!(session.instances, 9);
        assert_eq!(session.grid, GridSize::new(3, 3));
        assert_eq!(session.grid.surface_size(16), (48, 48));
        assert_eq!(session.dynamic.float_len(), 45);
        assert_eq!(session.constant.color_byte_len(), 27);
    }

    #[test]
    fn boot_views_read_the_engine_layout() {
        let (engine, session) = booted();
        let view = MemoryView::new(engine.memory());

        let dynamic = session.dynamic_floats(&view);
        // Cell 5 sits at column 2, row 1 and is visible.
        assert_eq!(&dynamic[25..30], &[2.0, 1.0, 1.0, 1.0, 1.0]);

        let colors = session.constant_colors(&view);
        assert_eq!(colors.len(), 27);
        assert_eq!(colors[0], 0.0);
        assert_eq!(colors[1], 9.0 / 255.0);
    }

    // ── interact ──────────────────────────────────────────────────────────

    #[test]
    fn click_on_one_cell_reports_that_cell_alone() {
        let (mut engine, session) = booted();
        let range = session
            .interact(&mut engine, CellCoord { x: 1, y: 1 }, 1)
            .unwrap();
        assert_eq!(range, DirtyRange { first: 4, last: 4 });

        let view = MemoryView::new(engine.memory());
        let (offset, slice) = dirty_slice(session.dynamic_floats(&view), range);
        assert_eq!(offset, 4 * 5 * 4);
        assert_eq!(slice.len() * 4, 20);
        assert_eq!(slice[4], 0.0); // toggled invisible
    }

    #[test]
    fn interaction_count_applies_repeatedly() {
        let (mut engine, session) = booted();
        // An even count toggles visibility back to where it started.
        session.interact(&mut engine, CellCoord { x: 0, y: 0 }, 2);
        let view = MemoryView::new(engine.memory());
        assert_eq!(session.dynamic_floats(&view)[4], 1.0);
    }

    #[test]
    fn second_click_sees_the_first_mutation_through_fresh_views() {
        let (mut engine, session) = booted();

        let first = session.interact(&mut engine, CellCoord { x: 2, y: 0 }, 1);
        assert_eq!(first, Some(DirtyRange { first: 2, last: 2 }));

        // The engine relocated its memory during the first call; the second
        // cycle re-derives views and must observe the first toggle.
        let second = session.interact(&mut engine, CellCoord { x: 2, y: 0 }, 1);
        assert_eq!(second, Some(DirtyRange { first: 2, last: 2 }));

        let view = MemoryView::new(engine.memory());
        assert_eq!(session.dynamic_floats(&view)[2 * 5 + 4], 1.0);
    }

    #[test]
    fn click_outside_the_grid_reports_nothing() {
        let (mut engine, session) = booted();
        let range = session.interact(&mut engine, CellCoord { x: 9, y: 9 }, 1);
        assert_eq!(range, None);
    }
}
