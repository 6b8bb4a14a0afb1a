use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "shadeframe", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render every frame to a PNG sequence or an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Compile and validate the formulas without rendering.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Input job JSON.
    #[arg(long)]
    job: Option<PathBuf>,

    /// Red channel formula.
    #[arg(long)]
    r: Option<String>,

    /// Green channel formula.
    #[arg(long)]
    g: Option<String>,

    /// Blue channel formula.
    #[arg(long)]
    b: Option<String>,

    /// Alpha channel formula.
    #[arg(long)]
    a: Option<String>,

    /// Raster width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Raster height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Number of frames.
    #[arg(long)]
    frames: Option<u64>,

    /// Output frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Image to composite every frame over.
    #[arg(long)]
    backdrop: Option<PathBuf>,
}

impl JobArgs {
    fn load(self) -> anyhow::Result<shadeframe::ShaderJob> {
        let base = self
            .job
            .as_deref()
            .map(shadeframe::ShaderJob::from_path)
            .transpose()?;
        let overrides = shadeframe::JobOverrides {
            r: self.r,
            g: self.g,
            b: self.b,
            a: self.a,
            width: self.width,
            height: self.height,
            frames: self.frames,
            fps: self.fps,
            backdrop: self.backdrop,
        };
        let job = overrides.apply(base)?;
        job.validate()?;
        Ok(job)
    }
}

#[derive(Args, Debug)]
struct ThreadArgs {
    /// Render frames in parallel.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for parallel rendering.
    #[arg(long)]
    threads: Option<usize>,

    /// Frames per render chunk.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
}

impl ThreadArgs {
    fn threading(&self) -> shadeframe::RenderThreading {
        shadeframe::RenderThreading {
            parallel: self.parallel,
            chunk_size: self.chunk_size,
            threads: self.threads,
            ..Default::default()
        }
    }
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Frame index (0-based).
    #[arg(long, default_value_t = 0)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    threads: ThreadArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Output directory for `frame_NNN.png` files.
    #[arg(long, conflicts_with = "mp4", required_unless_present = "mp4")]
    out_dir: Option<PathBuf>,

    /// Output MP4 path.
    #[arg(long)]
    mp4: Option<PathBuf>,

    /// Background color (hex `RRGGBB`) that alpha is flattened over for MP4 output.
    #[arg(long, default_value = "000000", value_parser = parse_hex_rgb)]
    bg: [u8; 3],

    #[command(flatten)]
    threads: ThreadArgs,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    #[command(flatten)]
    job: JobArgs,
}

fn parse_hex_rgb(s: &str) -> Result<[u8; 3], String> {
    let s = s.trim_start_matches('#');
    if s.len() != 6 || !s.is_ascii() {
        return Err(format!("expected RRGGBB, got '{s}'"));
    }
    let byte = |i: usize| {
        u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| format!("bad hex color '{s}': {e}"))
    };
    Ok([byte(0)?, byte(2)?, byte(4)?])
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn backdrop(job: &shadeframe::ShaderJob) -> anyhow::Result<Option<shadeframe::FrameRGBA>> {
    job.backdrop
        .as_deref()
        .map(shadeframe::load_backdrop)
        .transpose()
        .map_err(Into::into)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let job = args.job.load()?;
    let session = shadeframe::compile_session(&job, args.threads.threading())?;

    let mut frame = session.render_frame(shadeframe::FrameIndex(args.frame))?;
    if let Some(bd) = backdrop(&job)? {
        frame = shadeframe::alpha_over(&bd, &frame)?;
    }

    shadeframe::write_png(&args.out, &frame)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let job = args.job.load()?;
    let mut session = shadeframe::compile_session(&job, args.threads.threading())?;
    let bd = backdrop(&job)?;

    let (mut sink, out): (Box<dyn shadeframe::FrameSink>, PathBuf) = match (args.out_dir, args.mp4)
    {
        (Some(dir), _) => (Box::new(shadeframe::PngSequenceSink::new(&dir)) as _, dir),
        (None, Some(mp4)) => {
            let [r, g, b] = args.bg;
            let sink = shadeframe::FfmpegSink::new(&mp4, [r, g, b, 255]);
            (Box::new(sink) as _, mp4)
        }
        (None, None) => anyhow::bail!("either --out-dir or --mp4 is required"),
    };

    let stats = match bd {
        Some(bd) => {
            let mut sink = shadeframe::BackdropSink::new(bd, sink.as_mut());
            session.render_all(&mut sink)?
        }
        None => session.render_all(sink.as_mut())?,
    };

    eprintln!(
        "wrote {} ({} frames, {} rendered)",
        out.display(),
        stats.frames_total,
        stats.frames_rendered
    );
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let job = args.job.load()?;
    let session = shadeframe::compile_session(&job, shadeframe::RenderThreading::default())?;
    let canvas = session.canvas();
    let program = session
        .program()
        .context("compiled session has no program")?;
    for channel in shadeframe::Channel::ALL {
        println!("{channel}: {}", program.tree(channel));
    }
    println!(
        "ok: {}x{}, {} frames{}",
        canvas.width,
        canvas.height,
        session.frames(),
        if program.is_frame_invariant() {
            " (static)"
        } else {
            ""
        }
    );
    Ok(())
}
