//! Test-fixture image generation for the still-image source: a vertical
//! luma gradient, one step per row band.

/// The canonical `2^depth × 2^depth` gradient fixture: row r holds luma r
/// in every column, row-major.
pub fn gradient_luma(depth: u32) -> Vec<u8> {
    let lim = 1u32 << depth;
    let mut table = Vec::with_capacity((lim * lim) as usize);
    for row in 0..lim {
        for _ in 0..lim {
            table.push(row as u8);
        }
    }
    table
}

/// The same ramp stretched over an arbitrary raster.
pub fn gradient_frame(depth: u32, width: u32, height: u32) -> Vec<u8> {
    let lim = 1u32 << depth;
    let mut table = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        let luma = (y * lim / height) as u8;
        table.extend(std::iter::repeat_n(luma, width as usize));
    }
    table
}
