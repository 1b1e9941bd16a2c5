use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, ValueEnum};
use tracing::{Level, info, warn};

mod host;
mod machine;

use host::testvec;
use machine::alu::Instruction;
use machine::pattern::TestPattern;
use machine::ppu::PixelProcessor;
use machine::resolution::ResolutionName;
use machine::still::Still;
use machine::system::{PixelSource, System};
use machine::uart::Uart;

/// VGA pixel pipeline emulator
/// Renders frames through a cycle-accurate model of the scanout pipeline
#[derive(Parser)]
#[command(name = "pixelbeam")]
#[command(about = "A cycle-accurate VGA pixel-compute pipeline emulator")]
struct Args {
    /// Video mode preset [default: vga640x480]
    #[arg(long, value_enum)]
    resolution: Option<ResolutionName>,

    /// Pixel source driving the scanout [default: pattern]
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// Microprogram for the program source: hex-encoded instruction words
    #[arg(long, value_name = "WORDS")]
    program: Option<String>,

    /// Raw luma image for the still source (width × height bytes)
    #[arg(long, value_name = "PATH")]
    still_image: Option<PathBuf>,

    /// Number of parallel ALU lanes
    #[arg(long, default_value_t = 8)]
    stride: usize,

    /// Per-channel color depth in bits
    #[arg(long, default_value_t = 4)]
    color_depth: u32,

    /// Frames to render
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Output PPM path; multiple frames get a numeric suffix
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Write the gradient still-image fixture for this mode and exit
    #[arg(long, value_name = "PATH")]
    write_testvec: Option<PathBuf>,

    /// Probe the serial loopback at this baud rate before rendering
    #[arg(long, value_name = "BAUD")]
    serial_check: Option<u32>,

    /// Log to a file instead of stdout
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Procedural gradient-grid self-test pattern
    Pattern,
    /// Static-image lookup
    Still,
    /// Microprogrammed pixel processor
    Program,
}

/// The demo microprogram: threshold `x - y` against zero.
fn default_program() -> Vec<Instruction> {
    use machine::alu::{PixelDestination, PixelOpcode, PixelOperand};
    vec![
        Instruction {
            left_op: PixelOperand::XPos,
            right_op: PixelOperand::YPos,
            dest: PixelDestination::Gp0,
            opcode: PixelOpcode::Sub,
            immediate: 0,
        },
        Instruction {
            left_op: PixelOperand::Gp0,
            right_op: PixelOperand::Imm,
            dest: PixelDestination::Output,
            opcode: PixelOpcode::Gt,
            immediate: 0,
        },
    ]
}

fn parse_program(words: &str) -> Result<Vec<Instruction>, Box<dyn std::error::Error>> {
    let mut program = Vec::new();
    for word in words.split([' ', ',']).filter(|w| !w.is_empty()) {
        let word = u64::from_str_radix(word.trim_start_matches("0x"), 16)?;
        program.push(Instruction::decode(word)?);
    }
    Ok(program)
}

fn frame_path(out: &Path, frame: u32, frames: u32) -> PathBuf {
    if frames == 1 {
        return out.to_owned();
    }
    let stem = out.file_stem().unwrap_or_default().to_string_lossy();
    out.with_file_name(format!("{stem}-{frame:04}.ppm"))
}

fn serial_check(pixel_clock_hz: f64, baud: u32) -> Result<(), Box<dyn std::error::Error>> {
    let mut uart = Uart::new(pixel_clock_hz, baud)?;
    let probe = [0x55, 0xAA, 0x0F, 0xF0];
    for byte in probe {
        uart.send(byte);
    }
    // Generous bound: well past the probe's worst-case bit time
    for _ in 0..60 * (pixel_clock_hz / baud as f64) as u64 {
        uart.tick();
        if uart.idle() {
            break;
        }
    }
    for expected in probe {
        if uart.recv() != Some(expected) {
            return Err("serial loopback probe failed".into());
        }
    }
    info!("serial loopback OK at {baud} baud");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let level = if args.verbose {
        Level::TRACE
    } else {
        Level::INFO
    };
    match &args.log_file {
        Some(path) => host::logging::setup_logging_file(level, path)?,
        None => host::logging::setup_logging_stdio(level),
    }

    let name = args.resolution.unwrap_or(ResolutionName::Vga640x480);
    let res = name.resolution();
    info!(
        "{:?}: {}x{} @ {:.3} MHz pixel clock",
        name,
        res.width(),
        res.height(),
        res.pixel_clock_hz / 1e6
    );

    if let Some(path) = &args.write_testvec {
        let table = testvec::gradient_frame(args.color_depth, res.width(), res.height());
        fs::write(path, &table)?;
        info!("wrote {} byte fixture to {path:?}", table.len());
        return Ok(());
    }

    if let Some(baud) = args.serial_check {
        serial_check(res.pixel_clock_hz, baud)?;
    }

    let source = match args.source.unwrap_or(SourceKind::Pattern) {
        SourceKind::Pattern => PixelSource::Pattern(TestPattern::new(&res, args.color_depth)?),
        SourceKind::Still => {
            let still = match &args.still_image {
                Some(path) => Still::new(&res, fs::read(path)?)?,
                None => Still::bars(&res, args.color_depth)?,
            };
            PixelSource::Still(still)
        }
        SourceKind::Program => {
            let program = match &args.program {
                Some(words) => parse_program(words)?,
                None => default_program(),
            };
            info!("pixel program: {} instructions, {} lanes", program.len(), args.stride);
            PixelSource::Program(PixelProcessor::new(&res, args.stride, args.color_depth, program)?)
        }
    };

    let mut system = System::new(res, source, args.color_depth)?;

    let start = Instant::now();
    for frame in 0..args.frames {
        let rendered = system.render_frame();
        if let Some(out) = &args.out {
            let path = frame_path(out, frame, args.frames);
            rendered.save_ppm(&path)?;
            info!("frame {frame} -> {path:?}");
        }
    }
    let elapsed = start.elapsed();

    let clocks = res.frame_clocks() * args.frames as u64;
    info!("rendered {} frame(s) in {elapsed:?}", args.frames);
    if elapsed.as_secs_f64() > 0.0 {
        let rate = clocks as f64 / elapsed.as_secs_f64();
        info!(
            "  {clocks} pixel clocks, {:.1} Mclk/s ({:.2}x realtime)",
            rate / 1e6,
            rate / res.pixel_clock_hz
        );
        if rate < res.pixel_clock_hz {
            warn!("model runs below the real pixel clock for this mode");
        }
    }

    Ok(())
}
