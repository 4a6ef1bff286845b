use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use vcrtc::{
    Argb16, ComposeEngine, ComposerOpts, CountingRefresh, CrcSink, InMemoryCrcSink, Output,
    PixelFormat, RefreshSource, Scene, WritebackJob, WritebackStatus,
};

#[derive(Parser, Debug)]
#[command(name = "vcrtc", version)]
struct Cli {
    /// Log composer activity at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a scene for a number of refresh ticks and print one CRC per tick.
    Compose(ComposeArgs),
    /// List supported pixel formats.
    Formats,
    /// Run a single codec or blend computation.
    #[command(subcommand)]
    Probe(Probe),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Number of refresh ticks to deliver.
    #[arg(long, default_value_t = 1)]
    frames: u64,

    /// Write the composed frame as a PNG (uses the scene's writeback format, ARGB8888 if unset).
    #[arg(long)]
    png: Option<PathBuf>,

    /// Optional composer options JSON.
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Reject unknown fourccs instead of decoding them as XRGB8888.
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand, Debug)]
enum Probe {
    /// Expand one RGB565 value to canonical 16-bit channels.
    Rgb565 {
        /// Packed value, decimal or 0x-prefixed hex.
        #[arg(value_parser = parse_u16)]
        value: u16,
    },
    /// Convert one 8-bit YUV sample to canonical 16-bit channels.
    Yuv { y: u8, u: u8, v: u8 },
    /// Blend one 16-bit channel: `ceil((src * 65535 + dst * (65535 - alpha)) / 65535)`.
    Blend {
        #[arg(value_parser = parse_u16)]
        src: u16,
        #[arg(value_parser = parse_u16)]
        dst: u16,
        #[arg(value_parser = parse_u16)]
        alpha: u16,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Formats => cmd_formats(),
        Command::Probe(probe) => cmd_probe(probe),
    }
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("'{s}' is not a 16-bit value: {e}"))
}

fn read_opts(path: Option<&Path>, strict: bool) -> anyhow::Result<ComposerOpts> {
    let opts = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read options '{}'", path.display()))?;
            ComposerOpts::from_json_str(&json)?
        }
        None => ComposerOpts::default(),
    };
    Ok(if strict {
        opts.with_fallback_format(None)
    } else {
        opts
    })
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let scene = Scene::from_path(&args.in_path)
        .with_context(|| format!("load scene '{}'", args.in_path.display()))?;
    let opts = read_opts(args.opts.as_deref(), args.strict)?;
    let stack = scene.build_stack().context("build plane stack")?;

    let wb_frame = match (scene.build_writeback(&stack)?, &args.png) {
        (Some(frame), _) => Some(frame),
        (None, Some(_)) => {
            let dst = stack.primary().dst;
            Some(vcrtc::FrameInfo::alloc(
                PixelFormat::Argb8888,
                dst.x2.max(0) as u32,
                dst.y2.max(0) as u32,
            )?)
        }
        (None, None) => None,
    };

    let refresh = Arc::new(CountingRefresh::new());
    let sink = Arc::new(InMemoryCrcSink::new());
    let output = Output::new(
        opts.clone(),
        Arc::clone(&refresh) as Arc<dyn RefreshSource>,
        Arc::clone(&sink) as Arc<dyn CrcSink>,
    )?;
    output.set_crc_source(Some("auto"))?;
    output.commit(stack);

    let wb_status = match &wb_frame {
        Some(frame) => {
            let (job, rx) = WritebackJob::with_receiver(frame.clone());
            output.queue_writeback(job);
            Some(rx)
        }
        None => None,
    };

    for frame in 0..args.frames {
        output.handle_refresh_tick(frame);
        output.flush()?;
    }

    let stats = output.stats();
    output.shutdown()?;

    for (frame, crc) in sink.entries() {
        println!("frame {}: crc {crc:#010x}", frame.0);
    }
    eprintln!(
        "activations={} compositions={} failures={} crc_entries={} writebacks={}",
        stats.activations, stats.compositions, stats.failures, stats.crc_entries, stats.writebacks
    );
    if stats.failures > 0 && stats.compositions == 0 {
        anyhow::bail!("every composition failed; run with --verbose for details");
    }

    if let (Some(path), Some(frame), Some(rx)) = (&args.png, &wb_frame, wb_status) {
        match rx.try_recv() {
            Ok(WritebackStatus::Completed) => {}
            other => anyhow::bail!("writeback did not complete: {other:?}"),
        }
        let engine = ComposeEngine::new(vcrtc::FormatResolver::new(opts.fallback_format));
        let pixels = engine.read_back(frame).context("read back writeback buffer")?;
        write_png(path, &pixels, frame.width, frame.height)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn write_png(path: &Path, pixels: &[Argb16], width: u32, height: u32) -> anyhow::Result<()> {
    let narrow = |c: u16| c.div_ceil(257) as u8;
    let mut rgba = Vec::with_capacity(pixels.len() * 4);
    for px in pixels {
        rgba.extend_from_slice(&[narrow(px.r), narrow(px.g), narrow(px.b), narrow(px.a)]);
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &rgba,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_formats() -> anyhow::Result<()> {
    for format in PixelFormat::ALL {
        let code = format.fourcc().to_le_bytes();
        println!(
            "{:<14} {} {:#010x} planes={}",
            format.name(),
            String::from_utf8_lossy(&code),
            format.fourcc(),
            format.color_planes()
        );
    }
    Ok(())
}

fn print_px(px: Argb16) {
    println!(
        "a={:#06x} r={:#06x} g={:#06x} b={:#06x}",
        px.a, px.r, px.g, px.b
    );
}

fn cmd_probe(probe: Probe) -> anyhow::Result<()> {
    match probe {
        Probe::Rgb565 { value } => {
            let px = vcrtc::rgb565_to_argb16(value);
            print_px(px);
            println!("re-encoded={:#06x}", vcrtc::argb16_to_rgb565(px));
        }
        Probe::Yuv { y, u, v } => print_px(vcrtc::yuv_to_argb16(y, u, v)),
        Probe::Blend { src, dst, alpha } => {
            println!("{:#06x}", vcrtc::blend_channel(src, dst, alpha));
        }
    }
    Ok(())
}
