pub mod alu;
pub mod pattern;
pub mod ppu;
pub mod resolution;
pub mod still;
pub mod system;
pub mod timing;
pub mod uart;

use thiserror::Error;

/// Everything that can go wrong goes wrong before the first tick. The tick
/// path itself is total: no error channel, no panic, one fixed unit of work
/// per pixel clock.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{axis} {field} must be positive")]
    InvalidTiming {
        axis: &'static str,
        field: &'static str,
    },

    #[error("stride {stride} does not evenly divide width {width}")]
    StrideMismatch { stride: usize, width: u32 },

    #[error("pixel program is empty")]
    EmptyProgram,

    #[error("pixel program has {len} instructions, at most {max} fit in a batch window")]
    ProgramTooLong { len: usize, max: usize },

    #[error("unmapped operand selector {0:#x}")]
    BadOperand(u8),

    #[error("unmapped destination selector {0:#x}")]
    BadDestination(u8),

    #[error("unmapped opcode {0:#x}")]
    BadOpcode(u8),

    #[error("instruction word {0:#x} has bits set above the {1}-bit field layout")]
    BadInstructionWord(u64, u32),

    #[error("still image has {len} samples, expected {expected}")]
    StillImageSize { len: usize, expected: usize },

    #[error("baud rate {baud} not derivable from {clock_hz} Hz clock (off by {ppm} ppm)")]
    BaudUnreachable { baud: u32, clock_hz: u64, ppm: u32 },
}
