use crate::{WrError, WrResult};

/// Uniform grid with `steps` intervals on `[start, end]`.
///
/// The first point is exactly `start` and the last is exactly `end`, so
/// adjacent grids built from shared endpoints agree bit-for-bit. Fails when
/// `steps` is too fine to resolve at this magnitude of `start`.
pub fn uniform_grid(start: f64, end: f64, steps: usize) -> WrResult<Vec<f64>> {
    if !(start.is_finite() && end.is_finite()) || end <= start {
        return Err(WrError::InvalidRange {
            what: "grid",
            start,
            end,
        });
    }
    if steps == 0 {
        return Err(WrError::InvalidArg {
            what: "grid needs at least one step",
        });
    }
    let h = (end - start) / steps as f64;
    let mut grid: Vec<f64> = (0..steps).map(|i| start + i as f64 * h).collect();
    grid.push(end);
    if grid.windows(2).any(|w| w[0] >= w[1]) {
        return Err(WrError::InvalidRange {
            what: "grid points (steps too fine to resolve)",
            start,
            end,
        });
    }
    Ok(grid)
}
