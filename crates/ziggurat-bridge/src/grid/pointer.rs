use super::{CellCoord, GridSize};

/// Maps a pointer position to the grid cell under it.
///
/// `pointer` is relative to the drawing surface's origin (the platform layer
/// delivers window-relative positions, so the on-page offset subtraction has
/// already happened) and `displayed` is the surface's *displayed* size in
/// the same units. The displayed size is what matters: the surface may be
/// presented at a different size than its backing resolution, and the
/// mapping `(p x cells) / displayed` stays correct under that scaling.
///
/// Coordinates are floored toward zero, matching the engine's integer cell
/// addressing. Returns `None` for a degenerate displayed size or a position
/// outside the grid.
pub fn cell_at(pointer: (f64, f64), displayed: (f64, f64), grid: GridSize) -> Option<CellCoord> {
    let (px, py) = pointer;
    let (dw, dh) = displayed;

    if dw <= 0.0 || dh <= 0.0 || px < 0.0 || py < 0.0 {
        return None;
    }

    let x = (px * f64::from(grid.width) / dw).floor();
    let y = (py * f64::from(grid.height) / dh).floor();

    if x >= f64::from(grid.width) || y >= f64::from(grid.height) {
        return None;
    }
    Some(CellCoord {
        x: x as u32,
        y: y as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: GridSize = GridSize::new(3, 3);

    #[test]
    fn maps_by_displayed_size_not_backing_size() {
        // 48x48 backing presented at 96x96: a click at (95, 0) is still the
        // rightmost column.
        let cell = cell_at((95.0, 0.0), (96.0, 96.0), GRID).unwrap();
        assert_eq!(cell, CellCoord { x: 2, y: 0 });
    }

    #[test]
    fn axes_scale_independently() {
        let grid = GridSize::new(4, 2);
        let cell = cell_at((50.0, 50.0), (80.0, 60.0), grid).unwrap();
        assert_eq!(cell, CellCoord { x: 2, y: 1 });
    }

    #[test]
    fn coordinates_floor_toward_zero() {
        let cell = cell_at((31.9, 16.0), (48.0, 48.0), GRID).unwrap();
        assert_eq!(cell, CellCoord { x: 1, y: 1 });
    }

    #[test]
    fn cell_boundaries_belong_to_the_next_cell() {
        let cell = cell_at((16.0, 32.0), (48.0, 48.0), GRID).unwrap();
        assert_eq!(cell, CellCoord { x: 1, y: 2 });
    }

    #[test]
    fn positions_at_or_past_the_far_edge_are_rejected() {
        assert_eq!(cell_at((48.0, 0.0), (48.0, 48.0), GRID), None);
        assert_eq!(cell_at((0.0, 100.0), (48.0, 48.0), GRID), None);
    }

    #[test]
    fn negative_positions_and_degenerate_surfaces_are_rejected() {
        assert_eq!(cell_at((-1.0, 0.0), (48.0, 48.0), GRID), None);
        assert_eq!(cell_at((10.0, 10.0), (0.0, 48.0), GRID), None);
    }
}
