//! The scanout timing generator: two free-running counters sweeping the full
//! scan envelope of the configured mode. The counters are the only state;
//! every signal consumers care about (sync, active window, pixel coordinates,
//! the new-line/new-frame pulses) is derived from the current counter values
//! and owns no memory of its own.

use crate::machine::ConfigError;
use crate::machine::resolution::Resolution;

#[derive(Debug)]
pub struct VgaTiming {
    pub res: Resolution,
    pub scan_counter: u32, // 0..h.fullscan-1
    pub line_counter: u32, // 0..v.fullscan-1
}

impl VgaTiming {
    pub fn new(res: Resolution) -> Result<Self, ConfigError> {
        res.validate()?;
        Ok(Self {
            res,
            scan_counter: 0,
            line_counter: 0,
        })
    }

    /// Advance by one pixel clock.
    pub fn tick(&mut self) {
        if self.scan_counter == self.res.h.fullscan() - 1 {
            self.scan_counter = 0;
            if self.line_counter == self.res.v.fullscan() - 1 {
                self.line_counter = 0;
            } else {
                self.line_counter += 1;
            }
        } else {
            self.scan_counter += 1;
        }
    }

    /// Return to the power-on scan position.
    pub fn reset(&mut self) {
        self.scan_counter = 0;
        self.line_counter = 0;
    }

    /// Horizontal sync asserted. The physical VGA pin is active-low; this is
    /// the asserted condition, not the pin level.
    pub fn hsync(&self) -> bool {
        self.scan_counter < self.res.h.sync_pulse
    }

    /// Vertical sync asserted, same convention as [`Self::hsync`].
    pub fn vsync(&self) -> bool {
        self.line_counter < self.res.v.sync_pulse
    }

    /// True while the scan position is inside the visible window on both axes.
    pub fn active(&self) -> bool {
        self.line_counter >= self.res.v.prescan()
            && self.line_counter < self.res.v.prescan() + self.res.height()
            && self.scan_counter >= self.res.h.prescan()
            && self.scan_counter < self.res.h.prescan() + self.res.width()
    }

    /// One-cycle pulse, one clock before the first visible pixel of each
    /// visible line.
    pub fn new_line(&self) -> bool {
        self.line_counter >= self.res.v.prescan()
            && self.line_counter < self.res.v.prescan() + self.res.height()
            && self.scan_counter == self.res.h.prescan() - 1
    }

    /// One-cycle pulse, one clock before the first visible pixel of the
    /// frame. Fires exactly once per `h.fullscan × v.fullscan` clocks.
    pub fn new_frame(&self) -> bool {
        self.line_counter == self.res.v.prescan()
            && self.scan_counter == self.res.h.prescan() - 1
    }

    /// Pixel x coordinate: 0 before the visible window, the window offset
    /// inside it, clamped at `width` after it. The clamp (rather than a wrap)
    /// is intentional and load-bearing for consumers that latch at the end of
    /// a line.
    pub fn x_pos(&self) -> u32 {
        self.scan_counter
            .saturating_sub(self.res.h.prescan())
            .min(self.res.width())
    }

    /// Pixel y coordinate, same clamp convention as [`Self::x_pos`].
    pub fn y_pos(&self) -> u32 {
        self.line_counter
            .saturating_sub(self.res.v.prescan())
            .min(self.res.height())
    }

    /// True from one clock before the active window until the end of the
    /// line. The pixel processor sequences its program counter in this
    /// window so a batch is ready on the first visible pixel.
    pub fn compute_window(&self) -> bool {
        self.line_counter >= self.res.v.prescan()
            && self.scan_counter >= self.res.h.prescan() - 1
    }
}

/// A deliberately tiny mode so exhaustive test sweeps stay cheap.
#[cfg(test)]
pub(crate) fn tiny_resolution() -> Resolution {
    use crate::machine::resolution::ScanTimings;
    Resolution {
        pixel_clock_hz: 1e6,
        h: ScanTimings {
            sync_pulse: 4,
            back_porch: 3,
            visible: 16,
            front_porch: 2,
        },
        v: ScanTimings {
            sync_pulse: 2,
            back_porch: 3,
            visible: 16,
            front_porch: 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::machine::resolution::ResolutionName;

    use super::*;

    #[test]
    fn test_frame_period_all_presets() {
        for name in ResolutionName::ALL {
            let res = name.resolution();
            let mut timing = VgaTiming::new(res).unwrap();
            let mut pulses = Vec::new();
            for clock in 0..2 * res.frame_clocks() {
                if timing.new_frame() {
                    pulses.push(clock);
                }
                timing.tick();
            }
            assert_eq!(pulses.len(), 2, "{name:?}");
            assert_eq!(pulses[1] - pulses[0], res.frame_clocks(), "{name:?}");
        }
    }

    #[test]
    fn test_active_window_enumerates_raster_order() {
        let res = tiny_resolution();
        let mut timing = VgaTiming::new(res).unwrap();
        let mut seen = Vec::new();
        for _ in 0..res.frame_clocks() {
            if timing.active() {
                seen.push((timing.x_pos(), timing.y_pos()));
            }
            timing.tick();
        }
        assert_eq!(seen.len(), (res.width() * res.height()) as usize);
        let mut expected = Vec::new();
        for y in 0..res.height() {
            for x in 0..res.width() {
                expected.push((x, y));
            }
        }
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_active_count_vga() {
        let res = ResolutionName::Vga640x480.resolution();
        let mut timing = VgaTiming::new(res).unwrap();
        let active = (0..res.frame_clocks())
            .filter(|_| {
                let a = timing.active();
                timing.tick();
                a
            })
            .count();
        assert_eq!(active, 640 * 480);
    }

    #[test]
    fn test_sync_windows() {
        let res = tiny_resolution();
        let mut timing = VgaTiming::new(res).unwrap();
        for _ in 0..res.frame_clocks() {
            assert_eq!(timing.hsync(), timing.scan_counter < res.h.sync_pulse);
            assert_eq!(timing.vsync(), timing.line_counter < res.v.sync_pulse);
            timing.tick();
        }
    }

    #[test]
    fn test_coordinate_clamp_after_window() {
        let res = tiny_resolution();
        let mut timing = VgaTiming::new(res).unwrap();
        // Walk to the front porch of a visible line
        while !(timing.line_counter == res.v.prescan()
            && timing.scan_counter == res.h.prescan() + res.width())
        {
            timing.tick();
        }
        // Clamped at width, not wrapped to zero
        assert_eq!(timing.x_pos(), res.width());
        timing.tick();
        assert_eq!(timing.x_pos(), res.width());
    }

    #[test]
    fn test_new_line_once_per_visible_line() {
        let res = tiny_resolution();
        let mut timing = VgaTiming::new(res).unwrap();
        let pulses = (0..res.frame_clocks())
            .filter(|_| {
                let p = timing.new_line();
                timing.tick();
                p
            })
            .count();
        assert_eq!(pulses, res.height() as usize);
    }

    #[test]
    fn test_new_frame_precedes_first_active_pixel() {
        let res = tiny_resolution();
        let mut timing = VgaTiming::new(res).unwrap();
        while !timing.new_frame() {
            timing.tick();
        }
        assert!(!timing.active());
        timing.tick();
        assert!(timing.active());
        assert_eq!((timing.x_pos(), timing.y_pos()), (0, 0));
    }

    #[test]
    fn test_reset_returns_to_origin() {
        let res = tiny_resolution();
        let mut timing = VgaTiming::new(res).unwrap();
        for _ in 0..1234 {
            timing.tick();
        }
        timing.reset();
        assert_eq!(timing.scan_counter, 0);
        assert_eq!(timing.line_counter, 0);
        assert!(timing.vsync());
    }
}
