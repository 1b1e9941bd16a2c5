//! Static-image pixel source: a read-only luma table addressed by
//! `y * width + x`, swept exactly like the raster. This is the calibration
//! client for the timing generator — if driving it reproduces the source
//! image pixel-for-pixel at the expected raster position, the timing
//! contract is honored.

use crate::machine::ConfigError;
use crate::machine::resolution::Resolution;
use crate::machine::timing::VgaTiming;

#[derive(Debug)]
pub struct Still {
    width: u32,
    height: u32,
    /// Per-pixel luma, `pixel_depth` bits per sample, row-major.
    table: Vec<u8>,
    x: u32,
    y: u32,
}

impl Still {
    pub fn new(res: &Resolution, table: Vec<u8>) -> Result<Self, ConfigError> {
        res.validate()?;
        let expected = (res.width() * res.height()) as usize;
        if table.len() != expected {
            return Err(ConfigError::StillImageSize {
                len: table.len(),
                expected,
            });
        }
        Ok(Self {
            width: res.width(),
            height: res.height(),
            table,
            x: 0,
            y: 0,
        })
    }

    /// A built-in image: a horizontal `2^pixel_depth`-step luma ramp,
    /// repeated on every line.
    pub fn bars(res: &Resolution, pixel_depth: u32) -> Result<Self, ConfigError> {
        res.validate()?;
        let steps = 1u32 << pixel_depth;
        let width = res.width();
        let mut table = Vec::with_capacity((width * res.height()) as usize);
        for _ in 0..res.height() {
            for x in 0..width {
                table.push((x * steps / width) as u8);
            }
        }
        Self::new(res, table)
    }

    /// One pixel clock against the current scan snapshot. Returns the
    /// (r, g, b) channels — the luma sample replicated into all three while
    /// active, black otherwise.
    pub fn tick(&mut self, timing: &VgaTiming) -> (u8, u8, u8) {
        if timing.new_frame() {
            self.x = 0;
            self.y = 0;
        } else if timing.new_line() {
            self.x = 0;
            self.y = (self.y + 1) % self.height;
        }

        if !timing.active() {
            return (0, 0, 0);
        }

        let luma = self.table[(self.y * self.width + self.x) as usize];
        if self.x + 1 < self.width {
            self.x += 1;
        }
        (luma, luma, luma)
    }

    pub fn reset(&mut self) {
        self.x = 0;
        self.y = 0;
    }
}

#[cfg(test)]
mod tests {
    use crate::host::testvec;
    use crate::machine::timing::tiny_resolution;

    use super::*;

    #[test]
    fn test_round_trips_source_image() {
        let res = tiny_resolution();
        // 16×16 gradient fixture matches the tiny mode exactly
        let image = testvec::gradient_luma(4);
        let mut timing = VgaTiming::new(res).unwrap();
        let mut still = Still::new(&res, image.clone()).unwrap();

        for _ in 0..2 * res.frame_clocks() {
            let (x, y) = (timing.x_pos(), timing.y_pos());
            let (r, g, b) = still.tick(&timing);
            if timing.active() {
                let expected = image[(y * res.width() + x) as usize];
                assert_eq!((r, g, b), (expected, expected, expected), "({x},{y})");
            } else {
                assert_eq!((r, g, b), (0, 0, 0));
            }
            timing.tick();
        }
    }

    #[test]
    fn test_resets_to_origin_on_new_frame() {
        let res = tiny_resolution();
        let mut timing = VgaTiming::new(res).unwrap();
        let mut still = Still::new(&res, testvec::gradient_luma(4)).unwrap();

        // Desynchronize the raster state on purpose
        still.x = 7;
        still.y = 11;
        while !timing.new_frame() {
            still.tick(&timing);
            timing.tick();
        }
        still.tick(&timing);
        assert_eq!((still.x, still.y), (0, 0));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let res = tiny_resolution();
        assert_eq!(
            Still::new(&res, vec![0; 17]).unwrap_err(),
            ConfigError::StillImageSize {
                len: 17,
                expected: 256,
            }
        );
    }

    #[test]
    fn test_bars_ramp() {
        let res = tiny_resolution();
        let still = Still::bars(&res, 4).unwrap();
        // width 16, 16 steps: one luma step per pixel
        for x in 0..16 {
            assert_eq!(still.table[x], x as u8);
            assert_eq!(still.table[15 * 16 + x], x as u8);
        }
    }
}
