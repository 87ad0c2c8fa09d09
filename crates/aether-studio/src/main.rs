//! Aether studio: headless demo of the paint engine.
//!
//! Bakes gradient swatches to PNG and, with `--gpu`, runs the gradient-map
//! blend pass on a wgpu device and writes its output too.

use std::fs;
use std::path::{Path, PathBuf};

use aether_engine::coords::Vec2;
use aether_engine::device::HeadlessInit;
use aether_engine::logging::{LoggingConfig, init_logging};
use aether_engine::paint::{BlendMode, Color, ColorGradient, LinearGradient, RadialGradient};
use aether_engine::render::WgpuBackend;
use aether_engine::scene::Node;
use aether_engine::texture::Bitmap;
use anyhow::{Context, Result};
use clap::Parser;

/// Headless swatch renderer for the Aether paint engine
#[derive(Parser, Debug)]
#[command(name = "aether-studio")]
#[command(version)]
struct Args {
    /// Directory the PNG files are written to
    #[arg(short, long, default_value = "aether-out")]
    out: PathBuf,

    /// Width of the gradient ramp swatches, in pixels
    #[arg(long, default_value_t = 256)]
    width: u32,

    /// Also run the gradient-map pass on a GPU adapter
    #[arg(long)]
    gpu: bool,

    /// Log filter (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    anyhow::ensure!(args.width > 0, "--width must be positive");
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;

    let root = Node::root("studio");

    // ── ramps ─────────────────────────────────────────────────────────────
    for (name, gradient) in [
        ("black-white", ColorGradient::black_white()),
        ("rainbow", ColorGradient::rainbow()),
    ] {
        let ramp = gradient.create_bitmap(&root, args.width);
        save_png(&ramp, &args.out.join(format!("{name}.png")))?;
    }

    // ── baked paint textures ──────────────────────────────────────────────
    let mut linear = LinearGradient::new(Vec2::zero(), Vec2::new(1.0, 1.0), ColorGradient::rainbow());
    save_png(linear.texture(&root), &args.out.join("linear.png"))?;

    let c = Vec2::new(0.5, 0.5);
    let mut radial = RadialGradient::new(c, c, 0.5, ColorGradient::rainbow());
    save_png(radial.texture(&root), &args.out.join("radial.png"))?;

    if args.gpu {
        let mut luma = LinearGradient::new(Vec2::zero(), Vec2::new(1.0, 0.0), ColorGradient::black_white());
        let mapped = gradient_map(&root, luma.texture(&root))?;
        save_png(&mapped, &args.out.join("gradient-map.png"))?;
        luma.detach();
    }

    linear.detach();
    radial.detach();
    log::info!("swatches written to {}", args.out.display());
    Ok(())
}

/// Maps `source` through the rainbow ramp on the first available adapter.
fn gradient_map(root: &Node, source: &Bitmap) -> Result<Bitmap> {
    let mut backend = WgpuBackend::headless(HeadlessInit::default())?;
    let destination = Bitmap::new(root, source.width(), source.height());

    let pass = ColorGradient::rainbow().process(
        source,
        &destination,
        BlendMode::Opaque,
        Color::white(),
        &mut backend,
    );
    backend.block_on(pass)?.context("gradient-map pass failed")?;
    backend.read_pixels(&destination)?;
    Ok(destination)
}

fn save_png(bitmap: &Bitmap, path: &Path) -> Result<()> {
    let rgba = bgra_to_rgba(&bitmap.pixels());
    let img = image::RgbaImage::from_raw(bitmap.width(), bitmap.height(), rgba)
        .context("pixel buffer does not match bitmap size")?;
    img.save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::debug!("wrote {} ({}x{})", path.display(), bitmap.width(), bitmap.height());
    Ok(())
}

/// Unpacks `a<<24 | r<<16 | g<<8 | b` texels into RGBA bytes.
fn bgra_to_rgba(pixels: &[u32]) -> Vec<u8> {
    pixels
        .iter()
        .flat_map(|&p| {
            let [b, g, r, a] = p.to_le_bytes();
            [r, g, b, a]
        })
        .collect()
}
