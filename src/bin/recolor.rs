use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "recolor", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recolor one image with one mask and write a PNG.
    Apply(ApplyArgs),
    /// Recolor every image in a directory with the same-named mask from another directory.
    Sequence(SequenceArgs),
}

#[derive(Args, Debug)]
struct OperatorArgs {
    /// Options JSON (`color`, `mask_channel`, `resample`).
    #[arg(long)]
    options: Option<PathBuf>,

    /// Target color as `R,G,B` (0-255). Overrides the options file.
    #[arg(long, value_parser = parse_rgb)]
    color: Option<recolor::ColorRgb>,

    /// Mask channel to read. Overrides the options file.
    #[arg(long, value_enum)]
    mask_channel: Option<ChannelChoice>,

    /// Mask resampling kernel for the CPU backend. Overrides the options file.
    #[arg(long, value_enum)]
    resample: Option<ResampleChoice>,

    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Cpu)]
    backend: BackendChoice,
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Input RGB image.
    #[arg(long)]
    image: PathBuf,

    /// Mask image (gray, RGB or RGBA; any size).
    #[arg(long)]
    mask: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    op: OperatorArgs,
}

#[derive(Parser, Debug)]
struct SequenceArgs {
    /// Directory of input images, processed in file-name order.
    #[arg(long)]
    images: PathBuf,

    /// Directory of masks. Frames without a same-named mask produce no output.
    #[arg(long)]
    masks: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    op: OperatorArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Cpu,
    Gpu,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChannelChoice {
    Red,
    Alpha,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ResampleChoice {
    Nearest,
    Bilinear,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
        Command::Sequence(args) => cmd_sequence(args),
    }
}

fn parse_rgb(s: &str) -> Result<recolor::ColorRgb, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected R,G,B, got '{s}'"));
    };
    let c = |v: &str| v.parse::<u8>().map_err(|e| format!("bad component '{v}': {e}"));
    Ok(recolor::ColorRgb::new(c(*r)?, c(*g)?, c(*b)?))
}

fn load_options(args: &OperatorArgs) -> anyhow::Result<recolor::RecolorOptions> {
    let mut opts = match &args.options {
        Some(path) => recolor::RecolorOptions::from_json_file(path)?,
        None => recolor::RecolorOptions::default(),
    };
    if let Some(color) = args.color {
        opts.color = Some(color);
    }
    if let Some(channel) = args.mask_channel {
        opts = opts.with_mask_channel(match channel {
            ChannelChoice::Red => recolor::MaskChannel::Red,
            ChannelChoice::Alpha => recolor::MaskChannel::Alpha,
        });
    }
    if let Some(resample) = args.resample {
        opts = opts.with_resample(match resample {
            ResampleChoice::Nearest => recolor::MaskResample::Nearest,
            ResampleChoice::Bilinear => recolor::MaskResample::Bilinear,
        });
    }
    opts.validate().context("invalid recolor options")?;
    Ok(opts)
}

/// A node plus whatever it needs to move host images in and out of its domain.
struct Runner {
    node: recolor::RecolorNode,
    #[cfg(feature = "gpu")]
    gpu: Option<std::sync::Arc<recolor::GpuContext>>,
}

impl Runner {
    fn open(args: &OperatorArgs) -> anyhow::Result<Self> {
        let opts = load_options(args)?;
        match args.backend {
            BackendChoice::Cpu => Ok(Self {
                node: recolor::RecolorNode::open(&recolor::NodeContract::cpu(), &opts)?,
                #[cfg(feature = "gpu")]
                gpu: None,
            }),
            #[cfg(not(feature = "gpu"))]
            BackendChoice::Gpu => {
                anyhow::bail!("recolor was built without the `gpu` feature")
            }
            #[cfg(feature = "gpu")]
            BackendChoice::Gpu => {
                let ctx = std::sync::Arc::new(recolor::GpuContext::new()?);
                eprintln!("gpu adapter: {}", ctx.adapter_name());
                let node = recolor::RecolorNode::open_with_gpu(
                    &recolor::NodeContract::gpu(),
                    &opts,
                    ctx.clone(),
                )?;
                Ok(Self {
                    node,
                    gpu: Some(ctx),
                })
            }
        }
    }

    #[cfg(feature = "gpu")]
    fn to_frame(
        &self,
        img: recolor::ImageFrame,
        role: recolor::UploadRole,
    ) -> anyhow::Result<recolor::Frame> {
        match &self.gpu {
            Some(ctx) => Ok(recolor::Frame::Gpu(ctx.upload(&img, role)?)),
            None => Ok(recolor::Frame::Cpu(img)),
        }
    }

    #[cfg(not(feature = "gpu"))]
    fn to_frame(
        &self,
        img: recolor::ImageFrame,
        _role: recolor::UploadRole,
    ) -> anyhow::Result<recolor::Frame> {
        Ok(recolor::Frame::Cpu(img))
    }

    fn to_host(&self, frame: recolor::Frame) -> anyhow::Result<recolor::ImageFrame> {
        #[cfg(feature = "gpu")]
        if let Some(ctx) = &self.gpu {
            let img = frame
                .into_gpu()
                .context("gpu node produced a host frame (bug)")?;
            let host = ctx.download(&img)?;
            img.release();
            return Ok(host.into_rgb8()?);
        }
        frame
            .into_cpu()
            .context("cpu node produced a texture frame (bug)")
    }

    fn run(
        &mut self,
        index: i64,
        image: &Path,
        mask: Option<&Path>,
    ) -> anyhow::Result<Option<recolor::ImageFrame>> {
        let img = recolor::ImageFrame::open(image)
            .with_context(|| format!("read image '{}'", image.display()))?
            .into_rgb8()?;
        let image = self.to_frame(img, recolor::UploadRole::Image)?;
        let mask = match mask {
            Some(path) => {
                let m = recolor::ImageFrame::open(path)
                    .with_context(|| format!("read mask '{}'", path.display()))?;
                Some(self.to_frame(m, recolor::UploadRole::Mask)?)
            }
            None => None,
        };

        let packet = self
            .node
            .process(recolor::Timestamp(index), &image, mask.as_ref())?;
        release_frame(image);
        if let Some(mask) = mask {
            release_frame(mask);
        }
        packet.map(|p| self.to_host(p.frame)).transpose()
    }

    fn close(mut self) -> anyhow::Result<()> {
        self.node.close()?;
        Ok(())
    }
}

// Source textures are transient; free them as soon as the node is done with them.
fn release_frame(frame: recolor::Frame) {
    #[cfg(feature = "gpu")]
    if let Some(img) = frame.into_gpu() {
        img.release();
    }
    #[cfg(not(feature = "gpu"))]
    drop(frame);
}

fn write_png(img: recolor::ImageFrame, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    img.save(out)
        .with_context(|| format!("write png '{}'", out.display()))
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let mut runner = Runner::open(&args.op)?;
    let out = runner
        .run(0, &args.image, Some(&args.mask))?
        .context("recolor produced no output")?;
    runner.close()?;

    write_png(out, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_sequence(args: SequenceArgs) -> anyhow::Result<()> {
    let mut frames: Vec<PathBuf> = std::fs::read_dir(&args.images)
        .with_context(|| format!("list images in '{}'", args.images.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    frames.sort();

    let mut runner = Runner::open(&args.op)?;
    let (mut written, mut skipped) = (0usize, 0usize);
    for (i, frame) in frames.iter().enumerate() {
        let Some(name) = frame.file_name() else {
            continue;
        };
        let mask_path = args.masks.join(name);
        let mask = mask_path.is_file().then_some(mask_path.as_path());

        match runner.run(i as i64, frame, mask)? {
            Some(out) => {
                let mut dst = args.out.join(name);
                dst.set_extension("png");
                write_png(out, &dst)?;
                written += 1;
            }
            None => {
                eprintln!("no mask for {}, skipped", frame.display());
                skipped += 1;
            }
        }
    }
    runner.close()?;

    eprintln!(
        "wrote {written} frame(s) to {}, skipped {skipped}",
        args.out.display()
    );
    Ok(())
}
