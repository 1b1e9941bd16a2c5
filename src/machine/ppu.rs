//! The multi-lane pixel processor. `stride` identical ALU lanes share one
//! microprogram, one program counter, the line coordinate and the frame
//! counter; each lane owns its x coordinate, register file and output latch.
//! One batch = one full microprogram execution = `stride` pixels, so a
//! visible line is exactly `width / stride` batches.
//!
//! Everything here is driven by the timing generator's *current* counter
//! snapshot: callers evaluate a tick against the snapshot first and advance
//! the timing generator afterwards, mirroring the settle-then-latch ordering
//! of the synchronous hardware this models.

use tracing::trace;

use crate::machine::ConfigError;
use crate::machine::alu::{AluInputs, Instruction, PixelAlu};
use crate::machine::resolution::Resolution;
use crate::machine::timing::VgaTiming;

#[derive(Debug, Clone)]
struct Lane {
    alu: PixelAlu,
    x_coord: u32,
}

#[derive(Debug)]
pub struct PixelProcessor {
    width: u32,
    program: Vec<Instruction>,
    pc: usize,
    lanes: Vec<Lane>,
    y_coord: u32,
    frame_counter: u32,
}

impl PixelProcessor {
    /// All preconditions are checked here; `tick` is total.
    ///
    /// A program longer than `stride` can never reach its last instruction
    /// inside a batch window, so it is rejected along with the empty program
    /// and a stride that does not divide the line width.
    pub fn new(
        res: &Resolution,
        stride: usize,
        pixel_depth: u32,
        program: Vec<Instruction>,
    ) -> Result<Self, ConfigError> {
        res.validate()?;
        if stride == 0 || res.width() as usize % stride != 0 {
            return Err(ConfigError::StrideMismatch {
                stride,
                width: res.width(),
            });
        }
        if program.is_empty() {
            return Err(ConfigError::EmptyProgram);
        }
        if program.len() > stride {
            return Err(ConfigError::ProgramTooLong {
                len: program.len(),
                max: stride,
            });
        }
        let lane = Lane {
            alu: PixelAlu::new(pixel_depth, res),
            x_coord: 0,
        };
        Ok(Self {
            width: res.width(),
            program,
            pc: 0,
            lanes: vec![lane; stride],
            y_coord: 0,
            frame_counter: 0,
        })
    }

    pub fn stride(&self) -> usize {
        self.lanes.len()
    }

    /// True while the program counter addresses the final instruction, i.e.
    /// the lanes' output latches hold a finished batch.
    pub fn result_ready(&self) -> bool {
        self.pc == self.program.len() - 1
    }

    /// True while the lanes are computing the last batch of a line.
    pub fn end_of_line(&self) -> bool {
        self.lanes[0].x_coord == self.width - self.stride() as u32
    }

    pub fn lane_x(&self, lane: usize) -> u32 {
        self.lanes[lane].x_coord
    }

    pub fn lane_output(&self, lane: usize) -> u16 {
        self.lanes[lane].alu.output()
    }

    pub fn lane_channels(&self, lane: usize) -> (u8, u8, u8) {
        self.lanes[lane].alu.channels()
    }

    pub fn y_coord(&self) -> u32 {
        self.y_coord
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    /// One pixel clock. `timing` is the current (pre-advance) scan snapshot;
    /// `start_next_batch` is the consumer's batch-advance request for this
    /// clock, asserted once per group of `stride` pixels.
    pub fn tick(&mut self, timing: &VgaTiming, start_next_batch: bool) {
        let stride = self.lanes.len() as u32;
        let new_frame = timing.new_frame();
        let active = timing.active();
        let result_ready = self.result_ready();
        let end_of_line = self.end_of_line();

        // Lanes evaluate the current instruction against the snapshot, then
        // commit. Lanes share nothing mutable, so per-lane eval-then-commit
        // is the same fixed point the hardware settles to.
        let instruction = self.program[self.pc];
        for lane in &mut self.lanes {
            let inputs = AluInputs {
                x_pos: lane.x_coord,
                y_pos: self.y_coord,
                frame: self.frame_counter,
            };
            let result = lane.alu.eval(&instruction, &inputs);
            lane.alu.commit(&instruction, result);
        }

        // Lane coordinates advance in the active window, widened by the
        // new-line pulse so the frame pulse one clock earlier can reset them.
        if active || timing.new_line() {
            for (index, lane) in self.lanes.iter_mut().enumerate() {
                if new_frame || (end_of_line && start_next_batch) {
                    lane.x_coord = index as u32;
                } else if start_next_batch {
                    lane.x_coord += stride;
                }
            }
        }

        // The program counter runs one clock ahead of the visible window so
        // the first batch of a line is ready with its first pixel.
        if timing.compute_window() {
            if start_next_batch {
                self.pc = 0;
            } else if !result_ready {
                self.pc += 1;
            }
        }

        if new_frame {
            self.frame_counter = self.frame_counter.wrapping_add(1);
            self.y_coord = 0;
            trace!("frame {}", self.frame_counter);
        } else if active && end_of_line && start_next_batch {
            self.y_coord += 1;
        }
    }

    /// Global reset: counters, program counter, every lane's register file
    /// and output latch back to power-on values.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.y_coord = 0;
        self.frame_counter = 0;
        for lane in &mut self.lanes {
            lane.alu.reset();
            lane.x_coord = 0;
        }
    }
}
