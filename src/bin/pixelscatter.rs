use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use pixelscatter::{
    DisplayRect, EventScript, FetchMode, FrameIndex, FrameObserver, FrameReport, HoverOptions,
    ImageLoader, ImageSource, MotionEngine, PixelBuffer, VirtualClock,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pixelscatter", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample an image and print the particle grid as JSON.
    Sample(SampleArgs),
    /// Simulate up to a frame and write it as a PNG.
    Frame(FrameArgs),
    /// Simulate a run of frames and write each one as a PNG.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Sampling quality (pixels per particle when > 1).
    #[arg(long)]
    quality: Option<f64>,

    /// Output JSON path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SimArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Hover options JSON; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Event script JSON replayed against the virtual clock.
    #[arg(long)]
    events: Option<PathBuf>,

    /// Sampling quality (pixels per particle when > 1).
    #[arg(long)]
    quality: Option<f64>,

    /// Pointer influence radius in image pixels.
    #[arg(long)]
    radius: Option<f64>,

    /// Repel displacement scale per frame.
    #[arg(long)]
    force_speed: Option<f64>,

    /// Fraction of the distance to origin closed per frame.
    #[arg(long)]
    return_speed: Option<f64>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    sim: SimArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    sim: SimArgs,

    /// Number of frames to write.
    #[arg(long)]
    frames: u64,

    /// Output directory for `frame_NNNNN.png` files.
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Sample(args) => cmd_sample(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let mut opts = HoverOptions::default();
    if let Some(q) = args.quality {
        opts.quality = q;
    }
    let cfg = opts.validate_and_normalize()?;
    let buffer = load_image(&args.in_path, cfg.fetch_mode)?;
    let grid = pixelscatter::sample(&buffer, cfg.block_side);

    match &args.out {
        Some(out) => {
            ensure_parent(out)?;
            let f = std::fs::File::create(out)
                .with_context(|| format!("create '{}'", out.display()))?;
            serde_json::to_writer_pretty(f, &grid)
                .with_context(|| format!("write grid '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => {
            let stdout = std::io::stdout();
            serde_json::to_writer_pretty(stdout.lock(), &grid).context("write grid to stdout")?;
            println!();
        }
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (mut engine, script) = setup(&args.sim)?;
    let mut obs = Replay {
        script,
        capture: Capture::Single {
            frame: FrameIndex(args.frame),
            out: args.out.clone(),
        },
        written: 0,
        error: None,
    };

    let fps = obs.script.fps()?;
    let mut clock = VirtualClock::new(fps, Instant::now()).with_limit(args.frame + 1);
    engine.run();
    engine.drive(&mut clock, &mut obs);
    obs.finish()?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let (mut engine, script) = setup(&args.sim)?;
    let mut obs = Replay {
        script,
        capture: Capture::All {
            dir: args.out_dir.clone(),
        },
        written: 0,
        error: None,
    };

    let fps = obs.script.fps()?;
    let mut clock = VirtualClock::new(fps, Instant::now()).with_limit(args.frames);
    engine.run();
    let ran = engine.drive(&mut clock, &mut obs);
    obs.finish()?;

    eprintln!("wrote {ran} frames to {}", args.out_dir.display());
    Ok(())
}

fn setup(args: &SimArgs) -> anyhow::Result<(MotionEngine, EventScript)> {
    let mut opts = match &args.config {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            HoverOptions::from_json_str(&s)?
        }
        None => HoverOptions::default(),
    };
    if let Some(v) = args.quality {
        opts.quality = v;
    }
    if let Some(v) = args.radius {
        opts.force_radius = v;
    }
    if let Some(v) = args.force_speed {
        opts.force_speed = v;
    }
    if let Some(v) = args.return_speed {
        opts.return_speed = v;
    }

    let script = match &args.events {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("read event script '{}'", path.display()))?;
            EventScript::from_json_str(&s)?
        }
        None => EventScript::default(),
    };

    let cfg = opts.validate_and_normalize()?;
    let buffer = load_image(&args.in_path, cfg.fetch_mode)?;
    let display = script.display.unwrap_or_else(|| {
        DisplayRect::at_origin(f64::from(buffer.width), f64::from(buffer.height))
    });

    let mut engine = MotionEngine::new(cfg, assets_root(&args.in_path));
    engine.install_image(buffer)?;
    engine.attach_surface(display)?;
    tracing::info!(
        particles = engine.grid().len(),
        ratio = engine.scale().ratio,
        "engine ready"
    );
    Ok((engine, script))
}

fn load_image(path: &Path, mode: FetchMode) -> anyhow::Result<PixelBuffer> {
    let file = path
        .file_name()
        .with_context(|| format!("input '{}' has no file name", path.display()))?;
    let loader = ImageLoader::new(assets_root(path), mode);
    let buffer = loader.load_blocking(&ImageSource::Path(PathBuf::from(file)))?;
    Ok(buffer)
}

fn assets_root(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn ensure_parent(out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn write_png(engine: &MotionEngine, out: &Path) -> anyhow::Result<()> {
    let frame = engine
        .snapshot()
        .context("no surface attached")?
        .into_straight();
    ensure_parent(out)?;
    image::save_buffer_with_format(
        out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}

enum Capture {
    Single { frame: FrameIndex, out: PathBuf },
    All { dir: PathBuf },
}

struct Replay {
    script: EventScript,
    capture: Capture,
    written: u64,
    error: Option<anyhow::Error>,
}

impl Replay {
    fn finish(self) -> anyhow::Result<()> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if let Capture::Single { frame, .. } = &self.capture
            && self.written == 0
        {
            anyhow::bail!("frame {} was never rendered", frame.0);
        }
        Ok(())
    }
}

impl FrameObserver for Replay {
    fn before_frame(&mut self, engine: &mut MotionEngine, index: FrameIndex, now: Instant) {
        for event in self.script.events_at(index) {
            engine.handle_event(event, now);
        }
    }

    fn after_frame(&mut self, engine: &mut MotionEngine, report: &FrameReport) {
        let out = match &self.capture {
            Capture::Single { frame, out } if *frame == report.index => out.clone(),
            Capture::Single { .. } => return,
            Capture::All { dir } => dir.join(format!("frame_{:05}.png", report.index.0)),
        };
        match write_png(engine, &out) {
            Ok(()) => self.written += 1,
            Err(e) => {
                self.error = Some(e);
                engine.stop();
            }
        }
    }
}
