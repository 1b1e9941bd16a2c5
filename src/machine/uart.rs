//! Serial control link, modelled only to its configuration contract plus a
//! byte loopback used as a host liveness probe. The core pipeline consumes
//! none of its payload. 8-N-1 framing: one start bit (low), eight data bits
//! LSB-first, one stop bit (high).

use std::collections::VecDeque;

use tracing::{trace, warn};

use crate::machine::ConfigError;

/// Tolerated deviation between the requested baud rate and the nearest one
/// the clock divides down to.
pub const DEFAULT_MAX_PPM: u32 = 50_000;

/// Clock divisor for a requested baud rate. Surfaced once at startup; an
/// unreachable rate is a configuration error, never a mid-stream one.
pub fn divisor(clock_hz: f64, baud: u32, max_ppm: u32) -> Result<u32, ConfigError> {
    let div = (clock_hz / baud as f64) as u32;
    if div == 0 {
        return Err(ConfigError::BaudUnreachable {
            baud,
            clock_hz: clock_hz as u64,
            ppm: 1_000_000,
        });
    }
    let actual = clock_hz / div as f64;
    let ppm = (1e6 * (actual - baud as f64) / baud as f64).round() as u32;
    if ppm > max_ppm {
        return Err(ConfigError::BaudUnreachable {
            baud,
            clock_hz: clock_hz as u64,
            ppm,
        });
    }
    Ok(div)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Idle,
    /// `frame` holds start + data + stop bits, shifted out LSB-first.
    Shift { frame: u16, bit: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Idle,
    /// Sampling data bits mid-bit-period after a start edge.
    Shift { countdown: u32, bit: u8, data: u8 },
    /// Waiting out the stop bit before re-arming.
    StopWait { countdown: u32, data: u8 },
}

/// A loopback UART: TX drives a single wire that RX samples.
pub struct Uart {
    divisor: u32,
    tx_counter: u32,
    tx: TxState,
    tx_queue: VecDeque<u8>,
    rx: RxState,
    rx_queue: VecDeque<u8>,
    /// The loopback wire, idle high.
    line: bool,
}

impl Uart {
    pub fn new(clock_hz: f64, baud: u32) -> Result<Self, ConfigError> {
        let divisor = divisor(clock_hz, baud, DEFAULT_MAX_PPM)?;
        Ok(Self {
            divisor,
            tx_counter: 0,
            tx: TxState::Idle,
            tx_queue: VecDeque::new(),
            rx: RxState::Idle,
            rx_queue: VecDeque::new(),
            line: true,
        })
    }

    pub fn send(&mut self, byte: u8) {
        self.tx_queue.push_back(byte);
    }

    pub fn recv(&mut self) -> Option<u8> {
        self.rx_queue.pop_front()
    }

    pub fn idle(&self) -> bool {
        self.tx == TxState::Idle && self.tx_queue.is_empty() && self.rx == RxState::Idle
    }

    /// One system clock.
    pub fn tick(&mut self) {
        if self.tx_counter == 0 {
            self.tx_counter = self.divisor - 1;
            self.tx_strobe();
        } else {
            self.tx_counter -= 1;
        }
        self.rx_sample();
    }

    /// Advance the transmitter by one bit period.
    fn tx_strobe(&mut self) {
        match self.tx {
            TxState::Idle => {
                if let Some(byte) = self.tx_queue.pop_front() {
                    trace!("uart tx {byte:#04x}");
                    self.tx = TxState::Shift {
                        frame: (byte as u16) << 1 | 1 << 9,
                        bit: 0,
                    };
                    self.line = false; // start bit
                } else {
                    self.line = true;
                }
            }
            TxState::Shift { frame, bit } => {
                let bit = bit + 1;
                if bit == 10 {
                    self.tx = TxState::Idle;
                    self.line = true;
                } else {
                    self.line = frame >> bit & 1 != 0;
                    self.tx = TxState::Shift { frame, bit };
                }
            }
        }
    }

    /// The receiver watches the wire every clock.
    fn rx_sample(&mut self) {
        match self.rx {
            RxState::Idle => {
                if !self.line {
                    // Start edge: first data bit is 1.5 bit periods out
                    self.rx = RxState::Shift {
                        countdown: self.divisor + self.divisor / 2,
                        bit: 0,
                        data: 0,
                    };
                }
            }
            RxState::Shift {
                countdown,
                bit,
                data,
            } => {
                if countdown > 1 {
                    self.rx = RxState::Shift {
                        countdown: countdown - 1,
                        bit,
                        data,
                    };
                } else {
                    let data = data | (self.line as u8) << bit;
                    if bit == 7 {
                        self.rx = RxState::StopWait {
                            countdown: self.divisor,
                            data,
                        };
                    } else {
                        self.rx = RxState::Shift {
                            countdown: self.divisor,
                            bit: bit + 1,
                            data,
                        };
                    }
                }
            }
            RxState::StopWait { countdown, data } => {
                if countdown > 1 {
                    self.rx = RxState::StopWait {
                        countdown: countdown - 1,
                        data,
                    };
                } else {
                    if self.line {
                        trace!("uart rx {data:#04x}");
                        self.rx_queue.push_back(data);
                    } else {
                        warn!("uart rx framing error, dropping {data:#04x}");
                    }
                    self.rx = RxState::Idle;
                }
            }
        }
    }
}
