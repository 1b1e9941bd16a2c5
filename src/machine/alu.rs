//! The per-pixel micro-ALU: one instruction per clock over two operands
//! selected from the register file, the scan coordinates, the frame number,
//! or an immediate. Arithmetic is 32-bit unsigned with wrapping overflow;
//! comparisons produce 1/0. Register and output writes are synchronous: a
//! result committed on one clock is visible to operand selection on the next.
//!
//! The coordinate ports are narrow hardware signals sized to the video mode
//! (`bit_length(width)` and `bit_length(height)` bits), so a wider value
//! driven onto them truncates. The frame port carries the pipeline's full
//! 32-bit frame counter.

use crate::machine::ConfigError;
use crate::machine::resolution::Resolution;

pub const REGISTER_COUNT: usize = 4;
pub const REGISTER_WIDTH: u32 = 32;

const OPERAND_BITS: u32 = 4;
const DEST_BITS: u32 = 3;
const OPCODE_BITS: u32 = 4;

/// Field offsets of the packed instruction word, LSB-first in field order.
const RIGHT_OP_SHIFT: u32 = OPERAND_BITS;
const DEST_SHIFT: u32 = RIGHT_OP_SHIFT + OPERAND_BITS;
const OPCODE_SHIFT: u32 = DEST_SHIFT + DEST_BITS;
const IMMEDIATE_SHIFT: u32 = OPCODE_SHIFT + OPCODE_BITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PixelOperand {
    Gp0 = 0,
    Gp1 = 1,
    Gp2 = 2,
    Gp3 = 3,
    XPos = 4,
    YPos = 5,
    Frame = 6,
    Imm = 7,
}

impl TryFrom<u8> for PixelOperand {
    type Error = ConfigError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PixelOperand::Gp0),
            1 => Ok(PixelOperand::Gp1),
            2 => Ok(PixelOperand::Gp2),
            3 => Ok(PixelOperand::Gp3),
            4 => Ok(PixelOperand::XPos),
            5 => Ok(PixelOperand::YPos),
            6 => Ok(PixelOperand::Frame),
            7 => Ok(PixelOperand::Imm),
            _ => Err(ConfigError::BadOperand(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PixelDestination {
    Gp0 = 0,
    Gp1 = 1,
    Gp2 = 2,
    Gp3 = 3,
    Output = 7,
}

impl PixelDestination {
    /// Register file index, `None` for the output latch.
    fn register_index(self) -> Option<usize> {
        match self {
            PixelDestination::Gp0 => Some(0),
            PixelDestination::Gp1 => Some(1),
            PixelDestination::Gp2 => Some(2),
            PixelDestination::Gp3 => Some(3),
            PixelDestination::Output => None,
        }
    }
}

impl TryFrom<u8> for PixelDestination {
    type Error = ConfigError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PixelDestination::Gp0),
            1 => Ok(PixelDestination::Gp1),
            2 => Ok(PixelDestination::Gp2),
            3 => Ok(PixelDestination::Gp3),
            7 => Ok(PixelDestination::Output),
            _ => Err(ConfigError::BadDestination(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PixelOpcode {
    Not = 0,
    And = 1,
    Or = 2,
    Xor = 3,
    Add = 4,
    Sub = 5,
    Eq = 6,
    Gt = 7,
    Gte = 8,
    Lt = 9,
    Lte = 10,
}

impl TryFrom<u8> for PixelOpcode {
    type Error = ConfigError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PixelOpcode::Not),
            1 => Ok(PixelOpcode::And),
            2 => Ok(PixelOpcode::Or),
            3 => Ok(PixelOpcode::Xor),
            4 => Ok(PixelOpcode::Add),
            5 => Ok(PixelOpcode::Sub),
            6 => Ok(PixelOpcode::Eq),
            7 => Ok(PixelOpcode::Gt),
            8 => Ok(PixelOpcode::Gte),
            9 => Ok(PixelOpcode::Lt),
            10 => Ok(PixelOpcode::Lte),
            _ => Err(ConfigError::BadOpcode(value)),
        }
    }
}

/// One fixed-width microprogram word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub left_op: PixelOperand,
    pub right_op: PixelOperand,
    pub dest: PixelDestination,
    pub opcode: PixelOpcode,
    pub immediate: u32,
}

impl Instruction {
    /// Packed word width: left_op(4) right_op(4) dest(3) opcode(4) imm(32).
    pub const WORD_BITS: u32 = IMMEDIATE_SHIFT + REGISTER_WIDTH;

    /// Pack into the persisted word layout, fields concatenated LSB-first.
    pub fn encode(&self) -> u64 {
        (self.left_op as u64)
            | (self.right_op as u64) << RIGHT_OP_SHIFT
            | (self.dest as u64) << DEST_SHIFT
            | (self.opcode as u64) << OPCODE_SHIFT
            | (self.immediate as u64) << IMMEDIATE_SHIFT
    }

    pub fn decode(word: u64) -> Result<Self, ConfigError> {
        if word >> Self::WORD_BITS != 0 {
            return Err(ConfigError::BadInstructionWord(word, Self::WORD_BITS));
        }
        let field = |shift: u32, bits: u32| ((word >> shift) & ((1 << bits) - 1)) as u8;
        Ok(Self {
            left_op: field(0, OPERAND_BITS).try_into()?,
            right_op: field(RIGHT_OP_SHIFT, OPERAND_BITS).try_into()?,
            dest: field(DEST_SHIFT, DEST_BITS).try_into()?,
            opcode: field(OPCODE_SHIFT, OPCODE_BITS).try_into()?,
            immediate: (word >> IMMEDIATE_SHIFT) as u32,
        })
    }
}

/// Pipeline inputs shared by both operand muxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AluInputs {
    pub x_pos: u32,
    pub y_pos: u32,
    pub frame: u32,
}

/// Mask for a hardware signal wide enough to hold `max_value`.
fn signal_mask(max_value: u32) -> u32 {
    let bits = u32::BITS - max_value.leading_zeros();
    if bits >= u32::BITS {
        u32::MAX
    } else {
        (1 << bits) - 1
    }
}

/// One ALU lane: a private register file and a packed-RGB output latch.
#[derive(Debug, Clone)]
pub struct PixelAlu {
    pixel_depth: u32,
    x_mask: u32,
    y_mask: u32,
    registers: [u32; REGISTER_COUNT],
    output: u16,
}

impl PixelAlu {
    /// `pixel_depth` is the per-channel color depth; the output latch holds
    /// three channel slices, so it must fit in 16 bits. The mode sizes the
    /// coordinate ports.
    pub fn new(pixel_depth: u32, res: &Resolution) -> Self {
        debug_assert!(pixel_depth > 0 && 3 * pixel_depth <= 16);
        Self {
            pixel_depth,
            x_mask: signal_mask(res.width()),
            y_mask: signal_mask(res.height()),
            registers: [0; REGISTER_COUNT],
            output: 0,
        }
    }

    fn pick_operand(&self, sel: PixelOperand, instruction: &Instruction, inputs: &AluInputs) -> u32 {
        match sel {
            PixelOperand::Gp0 => self.registers[0],
            PixelOperand::Gp1 => self.registers[1],
            PixelOperand::Gp2 => self.registers[2],
            PixelOperand::Gp3 => self.registers[3],
            PixelOperand::XPos => inputs.x_pos & self.x_mask,
            PixelOperand::YPos => inputs.y_pos & self.y_mask,
            PixelOperand::Frame => inputs.frame,
            PixelOperand::Imm => instruction.immediate,
        }
    }

    /// Combinational result for the current register snapshot. Pure: commits
    /// nothing.
    pub fn eval(&self, instruction: &Instruction, inputs: &AluInputs) -> u32 {
        let left = self.pick_operand(instruction.left_op, instruction, inputs);
        let right = self.pick_operand(instruction.right_op, instruction, inputs);
        match instruction.opcode {
            PixelOpcode::Not => !left,
            PixelOpcode::And => left & right,
            PixelOpcode::Or => left | right,
            PixelOpcode::Xor => left ^ right,
            PixelOpcode::Add => left.wrapping_add(right),
            PixelOpcode::Sub => left.wrapping_sub(right),
            PixelOpcode::Eq => (left == right) as u32,
            PixelOpcode::Gt => (left > right) as u32,
            PixelOpcode::Gte => (left >= right) as u32,
            PixelOpcode::Lt => (left < right) as u32,
            PixelOpcode::Lte => (left <= right) as u32,
        }
    }

    /// The clock edge: latch `result` into the output register or the
    /// destination GP register. Exactly one write per instruction.
    pub fn commit(&mut self, instruction: &Instruction, result: u32) {
        match instruction.dest.register_index() {
            Some(index) => self.registers[index] = result,
            None => {
                let mask = (1u32 << (3 * self.pixel_depth)) - 1;
                self.output = (result & mask) as u16;
            }
        }
    }

    /// One full clock: evaluate against the current snapshot, then commit.
    pub fn step(&mut self, instruction: &Instruction, inputs: &AluInputs) -> u32 {
        let result = self.eval(instruction, inputs);
        self.commit(instruction, result);
        result
    }

    /// The packed R,G,B output latch, R in the low slice.
    pub fn output(&self) -> u16 {
        self.output
    }

    /// The output latch split into (r, g, b) channel values.
    pub fn channels(&self) -> (u8, u8, u8) {
        let mask = (1u16 << self.pixel_depth) - 1;
        (
            (self.output & mask) as u8,
            (self.output >> self.pixel_depth & mask) as u8,
            (self.output >> (2 * self.pixel_depth) & mask) as u8,
        )
    }

    pub fn reset(&mut self) {
        self.registers = [0; REGISTER_COUNT];
        self.output = 0;
    }
}
