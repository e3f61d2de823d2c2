use clap::{Args, Parser, Subcommand};
use qr_art::analysis::{AnalysisSummary, analyze_background};
use qr_art::config::{PipelineConfig, generator_kind};
use qr_art::error::{QrArtError, Result};
use qr_art::generation::{GenerationConfig, Verifier, generate_art, local_service};
use qr_art::models::{Anchor, ArtSettings, ArtStyle, BlendMode, RenderSettings};
use qr_art::pipeline::{Extraction, extract_batch, extract_matrix};
use qr_art::render::control::CONTROL_BLUR_RADIUS;
use qr_art::render::{composite, control_image, render_art};
use qr_art::tools::{binary_stats, collect_images, grayscale_stats, load_raster, save_png};
use qr_art::utils::grayscale::rgba_to_grayscale;
use qr_art::{RasterImage, logger};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "qrtool", version, about = "QR matrix recovery and art tools")]
struct Cli {
    /// Gaussian blur before thresholding (camera photos)
    #[arg(long, global = true)]
    photo: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recover the module matrix of a QR image
    Extract {
        #[arg(long)]
        image: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract a matrix and score a background for overlay placement
    Analyze {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        background: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Blend a QR image into a background photo
    Blend {
        #[arg(long)]
        qr: PathBuf,
        #[arg(long)]
        background: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Use the settings recommended by background analysis
        #[arg(long)]
        auto: bool,
        #[command(flatten)]
        overlay: OverlayArgs,
    },
    /// Render procedural art from a QR image
    Art {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        art: ArtArgs,
    },
    /// Write the black and white control image of a QR image
    Control {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 1024)]
        size: usize,
        #[arg(long, default_value_t = CONTROL_BLUR_RADIUS)]
        blur: usize,
    },
    /// Generate verified artwork with the local generator
    Generate {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = "winter-village")]
        style: ArtStyle,
        #[arg(long, default_value_t = 1024)]
        size: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Module mismatches still accepted
        #[arg(long, default_value_t = 0)]
        max_bit_errors: usize,
    },
    /// Extract every image under a directory in parallel
    Batch {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Args)]
struct OverlayArgs {
    #[arg(long, default_value_t = 0.3)]
    opacity: f32,
    #[arg(long, default_value = "multiply")]
    mode: BlendMode,
    #[arg(long, default_value = "bottom-right")]
    position: Anchor,
    #[arg(long, default_value_t = 150)]
    size: usize,
    #[arg(long, default_value_t = 0.5)]
    edge_strength: f32,
    #[arg(long, default_value_t = 0.7)]
    texture_adaption: f32,
}

impl From<&OverlayArgs> for RenderSettings {
    fn from(args: &OverlayArgs) -> Self {
        RenderSettings {
            opacity: args.opacity,
            blend_mode: args.mode,
            position: args.position,
            size_px: args.size,
            edge_strength: args.edge_strength,
            texture_adaption: args.texture_adaption,
        }
        .clamped()
    }
}

#[derive(Args)]
struct ArtArgs {
    #[arg(long, default_value = "winter-village")]
    style: ArtStyle,
    #[arg(long, default_value_t = 600)]
    size: usize,
    #[arg(long, default_value_t = 0.7)]
    control_strength: f32,
    #[arg(long, default_value_t = 0.3)]
    denoising: f32,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() {
    logger::init();
    let cli = Cli::parse();
    let config = if cli.photo {
        PipelineConfig {
            blur_sigma: PipelineConfig::photo().blur_sigma,
            ..PipelineConfig::from_env()
        }
    } else {
        PipelineConfig::from_env()
    };

    let result = match cli.command {
        Command::Extract { image, json } => extract_cmd(&image, &config, json),
        Command::Analyze {
            image,
            background,
            json,
        } => analyze_cmd(&image, &background, &config, json),
        Command::Blend {
            qr,
            background,
            out,
            auto,
            overlay,
        } => blend_cmd(&qr, &background, &out, auto, &overlay),
        Command::Art { image, out, art } => art_cmd(&image, &out, &art, &config),
        Command::Control {
            image,
            out,
            size,
            blur,
        } => control_cmd(&image, &out, size, blur, &config),
        Command::Generate {
            image,
            out,
            style,
            size,
            seed,
            max_bit_errors,
        } => generate_cmd(&image, &out, style, size, seed, max_bit_errors, &config),
        Command::Batch { root, limit } => batch_cmd(&root, limit, &config),
    };

    if let Err(err) = result {
        error!("{err}");
        std::process::exit(1);
    }
}

fn load_and_extract(path: &Path, config: &PipelineConfig) -> Result<(RasterImage, Extraction)> {
    let image = load_raster(path)?;
    let extraction = extract_matrix(&image, config)?;
    Ok((image, extraction))
}

fn extract_cmd(path: &Path, config: &PipelineConfig, json: bool) -> Result<()> {
    let (image, extraction) = load_and_extract(path, config)?;
    let summary = AnalysisSummary::new(&extraction, None);
    if json {
        print_json(&summary)?;
        return Ok(());
    }

    println!("Image: {} ({}x{})", path.display(), image.width(), image.height());
    let gray = rgba_to_grayscale(image.as_bytes(), image.width(), image.height());
    let gray_stats = grayscale_stats(&gray);
    println!(
        "Grayscale range: {}-{}, average: {}",
        gray_stats.min, gray_stats.max, gray_stats.avg
    );
    let stats = binary_stats(&extraction.binary);
    println!(
        "Binary: dark_pixels={} total={} dark_ratio={:.2}%",
        stats.dark_pixels,
        stats.total_pixels,
        stats.dark_ratio * 100.0
    );
    print!("{summary}");
    print!("{}", extraction.matrix.to_ascii());
    Ok(())
}

fn analyze_cmd(path: &Path, background: &Path, config: &PipelineConfig, json: bool) -> Result<()> {
    let (_, extraction) = load_and_extract(path, config)?;
    let background = load_raster(background)?;
    let summary = AnalysisSummary::new(&extraction, analyze_background(&background));
    if json {
        print_json(&summary)
    } else {
        print!("{summary}");
        Ok(())
    }
}

fn blend_cmd(
    qr: &Path,
    background: &Path,
    out: &Path,
    auto: bool,
    overlay: &OverlayArgs,
) -> Result<()> {
    let qr = load_raster(qr)?;
    let background = load_raster(background)?;
    let settings = match analyze_background(&background).filter(|_| auto) {
        Some(analysis) => RenderSettings {
            size_px: overlay.size,
            ..analysis.recommended
        },
        None => RenderSettings::from(overlay),
    };
    info!(
        mode = %settings.blend_mode,
        position = %settings.position,
        opacity = settings.opacity,
        "blending"
    );
    save_png(&composite(&background, &qr, &settings), out)?;
    println!("Wrote {}", out.display());
    Ok(())
}

fn art_cmd(path: &Path, out: &Path, args: &ArtArgs, config: &PipelineConfig) -> Result<()> {
    let (_, extraction) = load_and_extract(path, config)?;
    let settings = ArtSettings {
        style: args.style,
        output_size: args.size,
        control_strength: args.control_strength,
        denoising: args.denoising,
        seed: args.seed,
    };
    let start = Instant::now();
    let art = render_art(&extraction.matrix, &settings);
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "art rendered");
    save_png(&art, out)?;
    println!("Wrote {}", out.display());
    Ok(())
}

fn control_cmd(
    path: &Path,
    out: &Path,
    size: usize,
    blur: usize,
    config: &PipelineConfig,
) -> Result<()> {
    let (_, extraction) = load_and_extract(path, config)?;
    save_png(&control_image(&extraction.matrix, size, blur), out)?;
    println!("Wrote {}", out.display());
    Ok(())
}

fn generate_cmd(
    path: &Path,
    out: &Path,
    style: ArtStyle,
    size: usize,
    seed: u64,
    max_bit_errors: usize,
    config: &PipelineConfig,
) -> Result<()> {
    let (_, extraction) = load_and_extract(path, config)?;
    let service = local_service(generator_kind())?;
    let generation = GenerationConfig {
        image_size: size,
        ..GenerationConfig::default()
    };
    let verifier = Verifier {
        pipeline: *config,
        max_bit_errors,
    };
    let outcome = generate_art(&service, &extraction.matrix, style, &generation, verifier, seed)?;
    save_png(&outcome.image, out)?;
    println!(
        "Wrote {} after {} attempt(s), seed {}, quality {:?}",
        out.display(),
        outcome.attempts,
        outcome.seed,
        outcome.quality
    );
    Ok(())
}

fn batch_cmd(root: &Path, limit: Option<usize>, config: &PipelineConfig) -> Result<()> {
    let mut paths = collect_images(root);
    if let Some(limit) = limit {
        paths.truncate(limit);
    }
    let mut images = Vec::with_capacity(paths.len());
    let mut names = Vec::with_capacity(paths.len());
    for path in paths {
        match load_raster(&path) {
            Ok(image) => {
                images.push(image);
                names.push(path);
            }
            Err(err) => eprintln!("{}: {err}", path.display()),
        }
    }

    let start = Instant::now();
    let results = extract_batch(&images, config);
    let elapsed = start.elapsed();

    let mut recovered = 0usize;
    for (path, result) in names.iter().zip(&results) {
        match result {
            Ok(extraction) => {
                recovered += 1;
                println!(
                    "{}: {}x{} modules, version {}",
                    path.display(),
                    extraction.grid.module_count,
                    extraction.grid.module_count,
                    extraction.grid.version
                );
            }
            Err(err) => println!("{}: {err}", path.display()),
        }
    }
    println!("Recovered {recovered}/{} in {:.2?}", results.len(), elapsed);
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| QrArtError::Encode(format!("json: {e}")))?;
    println!("{text}");
    Ok(())
}
