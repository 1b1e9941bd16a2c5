//! VESA/VGA mode descriptors. The timing quads follow the usual convention:
//! each axis is swept as sync pulse, back porch, visible region, front porch,
//! all counted in pixel clocks. Literal values from <http://www.tinyvga.com>.

use clap::ValueEnum;

use crate::machine::ConfigError;

/// One axis of the scan envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanTimings {
    pub sync_pulse: u32,
    pub back_porch: u32,
    pub visible: u32,
    pub front_porch: u32,
}

impl ScanTimings {
    /// Clocks from the start of the line/frame to the first visible pixel.
    pub fn prescan(&self) -> u32 {
        self.sync_pulse + self.back_porch
    }

    /// Total blanking clocks, i.e. everything except the visible region.
    pub fn overscan(&self) -> u32 {
        self.prescan() + self.front_porch
    }

    /// Full sweep length in clocks.
    pub fn fullscan(&self) -> u32 {
        self.overscan() + self.visible
    }

    fn validate(&self, axis: &'static str) -> Result<(), ConfigError> {
        for (field, value) in [
            ("sync_pulse", self.sync_pulse),
            ("back_porch", self.back_porch),
            ("visible", self.visible),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidTiming { axis, field });
            }
        }
        // front_porch may legitimately be a single clock or zero
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub pixel_clock_hz: f64,
    pub h: ScanTimings,
    pub v: ScanTimings,
}

impl Resolution {
    pub fn width(&self) -> u32 {
        self.h.visible
    }

    pub fn height(&self) -> u32 {
        self.v.visible
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.h.validate("horizontal")?;
        self.v.validate("vertical")?;
        Ok(())
    }

    /// Clocks in one full frame sweep, visible or not.
    pub fn frame_clocks(&self) -> u64 {
        self.h.fullscan() as u64 * self.v.fullscan() as u64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResolutionName {
    /// VGA 640×480 @ 60 Hz, 25.175 MHz pixel clock
    Vga640x480,
    /// SVGA 800×600 @ 60 Hz, 40 MHz pixel clock
    Svga800x600,
    /// XGA 1024×768 @ 60 Hz, 65 MHz pixel clock
    Xga1024x768,
    /// VESA 1280×960 @ 60 Hz, 108 MHz pixel clock
    Vesa1280x960,
    /// VESA 1280×1024 @ 60 Hz, 108 MHz pixel clock
    Vesa1280x1024,
    /// VESA 1600×1200 @ 60 Hz, 162 MHz pixel clock
    Vesa1600x1200,
}

impl ResolutionName {
    pub fn resolution(self) -> Resolution {
        match self {
            ResolutionName::Vga640x480 => Resolution {
                pixel_clock_hz: 25.175e6,
                h: ScanTimings {
                    sync_pulse: 96,
                    back_porch: 48,
                    visible: 640,
                    front_porch: 16,
                },
                v: ScanTimings {
                    sync_pulse: 2,
                    back_porch: 33,
                    visible: 480,
                    front_porch: 10,
                },
            },
            ResolutionName::Svga800x600 => Resolution {
                pixel_clock_hz: 40e6,
                h: ScanTimings {
                    sync_pulse: 128,
                    back_porch: 88,
                    visible: 800,
                    front_porch: 40,
                },
                v: ScanTimings {
                    sync_pulse: 4,
                    back_porch: 23,
                    visible: 600,
                    front_porch: 1,
                },
            },
            ResolutionName::Xga1024x768 => Resolution {
                pixel_clock_hz: 65e6,
                h: ScanTimings {
                    sync_pulse: 136,
                    back_porch: 160,
                    visible: 1024,
                    front_porch: 24,
                },
                v: ScanTimings {
                    sync_pulse: 6,
                    back_porch: 29,
                    visible: 768,
                    front_porch: 3,
                },
            },
            ResolutionName::Vesa1280x960 => Resolution {
                pixel_clock_hz: 108e6,
                h: ScanTimings {
                    sync_pulse: 136,
                    back_porch: 216,
                    visible: 1280,
                    front_porch: 80,
                },
                v: ScanTimings {
                    sync_pulse: 3,
                    back_porch: 30,
                    visible: 960,
                    front_porch: 1,
                },
            },
            ResolutionName::Vesa1280x1024 => Resolution {
                pixel_clock_hz: 108e6,
                h: ScanTimings {
                    sync_pulse: 112,
                    back_porch: 248,
                    visible: 1280,
                    front_porch: 48,
                },
                v: ScanTimings {
                    sync_pulse: 3,
                    back_porch: 38,
                    visible: 1024,
                    front_porch: 1,
                },
            },
            ResolutionName::Vesa1600x1200 => Resolution {
                pixel_clock_hz: 162e6,
                h: ScanTimings {
                    sync_pulse: 192,
                    back_porch: 304,
                    visible: 1600,
                    front_porch: 64,
                },
                v: ScanTimings {
                    sync_pulse: 3,
                    back_porch: 46,
                    visible: 1200,
                    front_porch: 1,
                },
            },
        }
    }

    pub const ALL: [ResolutionName; 6] = [
        ResolutionName::Vga640x480,
        ResolutionName::Svga800x600,
        ResolutionName::Xga1024x768,
        ResolutionName::Vesa1280x960,
        ResolutionName::Vesa1280x1024,
        ResolutionName::Vesa1600x1200,
    ];
}
