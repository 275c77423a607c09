use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "joyplot", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an image as a joyplot and write it to a PNG or JPEG.
    Frame(FrameArgs),
    /// Render an image as a joyplot into a timestamped JPEG.
    Snapshot(SnapshotArgs),
    /// Render every frame of a video into a numbered PNG sequence (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Print the default parameters as JSON.
    Params,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output width in physical pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Output height in physical pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Physical pixels per logical pixel.
    #[arg(long, default_value_t = 1.0)]
    density: f64,

    /// Parameters JSON; missing fields use defaults.
    #[arg(long)]
    params: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image path (.png or .jpg).
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory that receives the snapshot.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory that receives `joyplot_NNNNNN.png` frames.
    #[arg(long)]
    out_dir: PathBuf,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Snapshot(args) => cmd_snapshot(args),
        Command::Render(args) => cmd_render(args),
        Command::Params => cmd_params(),
    }
}

fn load_params(path: Option<&Path>) -> anyhow::Result<joyplot::Params> {
    match path {
        Some(p) => joyplot::Params::from_json_file(p)
            .with_context(|| format!("load params '{}'", p.display())),
        None => Ok(joyplot::Params::default()),
    }
}

fn surface(args: &OutputArgs) -> anyhow::Result<joyplot::Surface> {
    Ok(joyplot::Surface::new(args.width, args.height, args.density)?)
}

fn render_image(in_path: &Path, output: &OutputArgs) -> anyhow::Result<(joyplot::FrameRGBA, joyplot::Params)> {
    let params = load_params(output.params.as_deref())?;
    let frame = joyplot::VideoFrame::open(in_path)
        .with_context(|| format!("read input image '{}'", in_path.display()))?;
    let rendered = joyplot::render_still(&frame, &params, surface(output)?)?;
    Ok((rendered, params))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (rendered, params) = render_image(&args.in_path, &args.output)?;
    joyplot::export::save_frame(&rendered, &args.out, params.background)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_snapshot(args: SnapshotArgs) -> anyhow::Result<()> {
    let (rendered, params) = render_image(&args.in_path, &args.output)?;
    let path = joyplot::export::save_snapshot(&rendered, &args.dir, params.background)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let params = load_params(args.output.params.as_deref())?;
    let surface = surface(&args.output)?;

    let mut source = joyplot::FfmpegSource::open(&args.in_path)
        .with_context(|| format!("open video '{}'", args.in_path.display()))?;
    if let Some(n) = args.max_frames {
        source = source.with_max_frames(n);
    }
    let frames = joyplot::render_sequence(&mut source, &params, surface, &args.out_dir)?;
    eprintln!("wrote {frames} frames to {}", args.out_dir.display());
    Ok(())
}

fn cmd_params() -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(&joyplot::Params::default())?;
    println!("{s}");
    Ok(())
}
