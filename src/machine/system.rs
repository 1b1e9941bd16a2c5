//! Top-level wiring: the timing generator plus one pixel source, stepped in
//! lockstep. Every tick is two-phase — all consumers evaluate against the
//! current counter snapshot, then the counters advance — which is the
//! software rendering of "combinational logic settles before the next edge".

use tracing::info;

use crate::host::framedump::{Frame, Rgb};
use crate::machine::ConfigError;
use crate::machine::pattern::TestPattern;
use crate::machine::ppu::PixelProcessor;
use crate::machine::resolution::Resolution;
use crate::machine::still::Still;
use crate::machine::timing::VgaTiming;

pub enum PixelSource {
    Pattern(TestPattern),
    Still(Still),
    Program(PixelProcessor),
}

pub struct System {
    pub timing: VgaTiming,
    source: PixelSource,
    pixel_depth: u32,
}

impl System {
    pub fn new(
        res: Resolution,
        source: PixelSource,
        pixel_depth: u32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            timing: VgaTiming::new(res)?,
            source,
            pixel_depth,
        })
    }

    /// One pixel clock: sample the source against the current scan position,
    /// record any visible pixel into `frame`, then advance the counters.
    pub fn tick(&mut self, frame: &mut Frame) {
        match &mut self.source {
            PixelSource::Pattern(pattern) => {
                let rgb = pattern.tick(&self.timing);
                self.record_scanout(frame, rgb);
            }
            PixelSource::Still(still) => {
                let rgb = still.tick(&self.timing);
                self.record_scanout(frame, rgb);
            }
            PixelSource::Program(ppu) => {
                let stride = ppu.stride() as u32;
                let new_frame = self.timing.new_frame();
                // The consumer requests a batch-advance once per group of
                // `stride` pixels, when the lanes' results are ready.
                let batch_boundary =
                    self.timing.active() && self.timing.x_pos() % stride == stride - 1;
                let start_next_batch = new_frame || (ppu.result_ready() && batch_boundary);
                if start_next_batch && !new_frame {
                    let y = ppu.y_coord();
                    for lane in 0..ppu.stride() {
                        let rgb = Rgb::from_channels(self.pixel_depth, ppu.lane_channels(lane));
                        frame.set(ppu.lane_x(lane), y, rgb);
                    }
                }
                ppu.tick(&self.timing, start_next_batch);
            }
        }
        self.timing.tick();
    }

    fn record_scanout(&self, frame: &mut Frame, rgb: (u8, u8, u8)) {
        if self.timing.active() {
            frame.set(
                self.timing.x_pos(),
                self.timing.y_pos(),
                Rgb::from_channels(self.pixel_depth, rgb),
            );
        }
    }

    /// Run one full scan sweep (`h.fullscan × v.fullscan` clocks) and return
    /// the captured visible frame.
    pub fn render_frame(&mut self) -> Frame {
        let res = self.timing.res;
        let mut frame = Frame::new(res.width(), res.height());
        for _ in 0..res.frame_clocks() {
            self.tick(&mut frame);
        }
        frame
    }

    /// Global reset: every counter and register back to power-on values.
    /// The next rendered frame reproduces frame 0 bit-for-bit.
    pub fn reset(&mut self) {
        info!("system reset");
        self.timing.reset();
        match &mut self.source {
            PixelSource::Pattern(pattern) => pattern.reset(),
            PixelSource::Still(still) => still.reset(),
            PixelSource::Program(ppu) => ppu.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::host::testvec;
    use crate::machine::alu::{
        Instruction, PixelDestination, PixelOpcode, PixelOperand,
    };
    use crate::machine::timing::tiny_resolution;

    use super::*;

    fn xor_program() -> Vec<Instruction> {
        vec![Instruction {
            left_op: PixelOperand::XPos,
            right_op: PixelOperand::YPos,
            dest: PixelDestination::Output,
            opcode: PixelOpcode::Xor,
            immediate: 0,
        }]
    }

    #[test]
    fn test_program_frame_matches_direct_evaluation() {
        let res = tiny_resolution();
        let ppu = PixelProcessor::new(&res, 8, 4, xor_program()).unwrap();
        let mut system = System::new(res, PixelSource::Program(ppu), 4).unwrap();

        let frame = system.render_frame();
        for y in 0..res.height() {
            for x in 0..res.width() {
                let packed = (x ^ y) as u16 & 0xFFF;
                let expected = Rgb::from_channels(
                    4,
                    (
                        (packed & 0xF) as u8,
                        (packed >> 4 & 0xF) as u8,
                        (packed >> 8 & 0xF) as u8,
                    ),
                );
                assert_eq!(frame.get(x, y), expected, "({x},{y})");
            }
        }
    }

    #[test]
    fn test_still_frame_matches_source_image() {
        let res = tiny_resolution();
        let image = testvec::gradient_luma(4);
        let still = Still::new(&res, image.clone()).unwrap();
        let mut system = System::new(res, PixelSource::Still(still), 4).unwrap();

        let frame = system.render_frame();
        for y in 0..res.height() {
            for x in 0..res.width() {
                let luma = image[(y * res.width() + x) as usize];
                let expected = Rgb::from_channels(4, (luma, luma, luma));
                assert_eq!(frame.get(x, y), expected, "({x},{y})");
            }
        }
    }

    #[test]
    fn test_reset_reproduces_frame_zero() {
        let res = tiny_resolution();
        let pattern = TestPattern::new(&res, 4).unwrap();
        let mut system = System::new(res, PixelSource::Pattern(pattern), 4).unwrap();

        let frame0 = system.render_frame();
        // Stop mid-frame at an arbitrary tick, then reset
        let mut scratch = Frame::new(res.width(), res.height());
        for _ in 0..137 {
            system.tick(&mut scratch);
        }
        system.reset();
        assert_eq!(system.render_frame(), frame0);
    }

    #[test]
    fn test_reset_reproduces_frame_zero_with_program() {
        let res = tiny_resolution();
        let ppu = PixelProcessor::new(&res, 8, 4, xor_program()).unwrap();
        let mut system = System::new(res, PixelSource::Program(ppu), 4).unwrap();

        let frame0 = system.render_frame();
        let mut scratch = Frame::new(res.width(), res.height());
        for _ in 0..313 {
            system.tick(&mut scratch);
        }
        system.reset();
        assert_eq!(system.render_frame(), frame0);
    }

    #[test]
    fn test_frames_are_stable_after_the_first() {
        let res = tiny_resolution();
        let still = Still::bars(&res, 4).unwrap();
        let mut system = System::new(res, PixelSource::Still(still), 4).unwrap();

        let first = system.render_frame();
        let second = system.render_frame();
        assert_eq!(first, second);
    }
}
