//! Frame capture: the software stand-in for the physical color pins. Channel
//! samples come out of the pipeline at the configured color depth and are
//! scaled to 8 bits for the dump.

use std::io::{self, Write};
use std::path::Path;

use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Scale `depth`-bit channel values up to 8 bits, full range.
    pub fn from_channels(depth: u32, (r, g, b): (u8, u8, u8)) -> Self {
        let max = (1u32 << depth) - 1;
        let scale = |v: u8| (v as u32 * 255 / max) as u8;
        Self {
            r: scale(r),
            g: scale(g),
            b: scale(b),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::default(); (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set(&mut self, x: u32, y: u32, rgb: Rgb) {
        self.pixels[(y * self.width + x) as usize] = rgb;
    }

    pub fn get(&self, x: u32, y: u32) -> Rgb {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Binary PPM (P6), 8 bits per channel.
    pub fn write_ppm(&self, mut out: impl Write) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        out.write_all(bytemuck::cast_slice(&self.pixels))
    }

    pub fn save_ppm(&self, path: &Path) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_ppm(io::BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_scaling() {
        assert_eq!(
            Rgb::from_channels(4, (0xF, 0x8, 0x0)),
            Rgb {
                r: 255,
                g: 136,
                b: 0,
            }
        );
    }

    #[test]
    fn test_ppm_layout() {
        let mut frame = Frame::new(2, 1);
        frame.set(0, 0, Rgb { r: 1, g: 2, b: 3 });
        frame.set(1, 0, Rgb { r: 4, g: 5, b: 6 });
        let mut bytes = Vec::new();
        frame.write_ppm(&mut bytes).unwrap();
        assert_eq!(bytes, b"P6\n2 1\n255\n\x01\x02\x03\x04\x05\x06");
    }

    #[test]
    fn test_save_ppm_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.ppm");
        let mut frame = Frame::new(3, 2);
        frame.set(2, 1, Rgb { r: 9, g: 9, b: 9 });
        frame.save_ppm(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"P6\n3 2\n255\n"));
        assert_eq!(bytes.len(), 11 + 3 * 2 * 3);
    }
}
