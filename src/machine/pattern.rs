//! Procedural self-test pattern: the visible area split into a
//! `2^color_depth × 8` grid of cells. Each of the 8 rows selects a 3-bit
//! channel mask (MSB red, then green, then blue); masked channels ramp with
//! the cell column, the rest read zero. The result is a reproducible RGB
//! gradient grid that makes most timing mistakes visible on sight.

use crate::machine::ConfigError;
use crate::machine::resolution::Resolution;
use crate::machine::timing::VgaTiming;

const CELLS_DOWN: u32 = 8;

#[derive(Debug)]
pub struct TestPattern {
    cells_across: u32,
    cell_width: u32,
    cell_height: u32,

    pix_count: u32,
    line_count: u32,
    cell_col_count: u32,
    cell_row_count: u32,
}

impl TestPattern {
    pub fn new(res: &Resolution, color_depth: u32) -> Result<Self, ConfigError> {
        res.validate()?;
        let cells_across = 1 << color_depth;
        Ok(Self {
            cells_across,
            cell_width: (res.width() as f64 / cells_across as f64).round() as u32,
            cell_height: (res.height() as f64 / CELLS_DOWN as f64).round() as u32,
            pix_count: 0,
            line_count: 0,
            cell_col_count: 0,
            cell_row_count: 0,
        })
    }

    /// One pixel clock against the current scan snapshot. Returns the
    /// (r, g, b) channel values for this clock; black while blanking.
    pub fn tick(&mut self, timing: &VgaTiming) -> (u8, u8, u8) {
        if !timing.active() {
            // Horizontal cell phase resets during blanking; the row state
            // persists so the grid continues across lines.
            self.cell_col_count = 0;
            self.pix_count = 0;
            return (0, 0, 0);
        }

        let color = self.cell_color();

        if self.pix_count == self.cell_width - 1 {
            self.pix_count = 0;
            self.cell_col_count = (self.cell_col_count + 1) % self.cells_across;
        } else {
            self.pix_count += 1;
        }

        // Row bookkeeping advances at the first visible pixel of each line.
        if timing.scan_counter == timing.res.h.prescan() {
            if self.line_count == self.cell_height - 1 {
                self.line_count = 0;
                self.cell_row_count = (self.cell_row_count + 1) % CELLS_DOWN;
            } else {
                self.line_count += 1;
            }
        }

        color
    }

    fn cell_color(&self) -> (u8, u8, u8) {
        let ramp = self.cell_col_count as u8;
        let row = self.cell_row_count;
        (
            if row & 0b100 != 0 { ramp } else { 0 },
            if row & 0b010 != 0 { ramp } else { 0 },
            if row & 0b001 != 0 { ramp } else { 0 },
        )
    }

    pub fn reset(&mut self) {
        self.pix_count = 0;
        self.line_count = 0;
        self.cell_col_count = 0;
        self.cell_row_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use crate::machine::timing::tiny_resolution;

    use super::*;

    /// Expected row index for ticks past a line's first pixel: the row
    /// register advances during the first pixel of each wrapping line.
    fn expected_row(y: u32, cell_height: u32) -> u32 {
        ((y + 1) / cell_height) % CELLS_DOWN
    }

    #[test]
    fn test_gradient_grid_geometry() {
        let res = tiny_resolution();
        let mut timing = VgaTiming::new(res).unwrap();
        // 16 cells across of width 1, 8 rows of height 2
        let mut pattern = TestPattern::new(&res, 4).unwrap();

        for _ in 0..res.frame_clocks() {
            let (x, y) = (timing.x_pos(), timing.y_pos());
            let (r, g, b) = pattern.tick(&timing);
            if timing.active() && x >= 1 {
                let ramp = x as u8; // cell_width == 1
                let row = expected_row(y, 2);
                assert_eq!(r, if row & 4 != 0 { ramp } else { 0 }, "({x},{y})");
                assert_eq!(g, if row & 2 != 0 { ramp } else { 0 }, "({x},{y})");
                assert_eq!(b, if row & 1 != 0 { ramp } else { 0 }, "({x},{y})");
            }
            timing.tick();
        }
    }

    #[test]
    fn test_black_during_blanking() {
        let res = tiny_resolution();
        let mut timing = VgaTiming::new(res).unwrap();
        let mut pattern = TestPattern::new(&res, 4).unwrap();

        for _ in 0..res.frame_clocks() {
            let rgb = pattern.tick(&timing);
            if !timing.active() {
                assert_eq!(rgb, (0, 0, 0));
            }
            timing.tick();
        }
    }

    #[test]
    fn test_pattern_repeats_every_frame() {
        let res = tiny_resolution();
        let mut timing = VgaTiming::new(res).unwrap();
        let mut pattern = TestPattern::new(&res, 4).unwrap();

        let mut frames = Vec::new();
        for _ in 0..2 {
            let mut frame = Vec::new();
            for _ in 0..res.frame_clocks() {
                let rgb = pattern.tick(&timing);
                if timing.active() {
                    frame.push(rgb);
                }
                timing.tick();
            }
            frames.push(frame);
        }
        assert_eq!(frames[0], frames[1]);
        assert_eq!(frames[0].len(), (res.width() * res.height()) as usize);
    }

    #[test]
    fn test_vga_cell_sizes() {
        let res = crate::machine::resolution::ResolutionName::Vga640x480.resolution();
        let pattern = TestPattern::new(&res, 4).unwrap();
        assert_eq!(pattern.cell_width, 40);
        assert_eq!(pattern.cell_height, 60);
    }
}
