use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ghs_composite_rs::image_pipeline::{
    BalanceMethod, ColorCompositePipeline, ConversionConfig, GrayscaleStretchPipeline, ProtectionParameters,
    PyramidConfig, StretchParameters, TiffCompression, TileFormat, ToneConfig, build_pyramid,
};
use ghs_composite_rs::logger;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "ghs-composite")]
#[command(author, version, about = "GHS tone mapping and color compositing for astronomical images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Stretch one FITS/TIFF file into <output>_grayscale.tif
    Grayscale(GrayscaleArgs),

    /// Combine red, green and blue files into a color composite
    Composite(CompositeArgs),

    /// Tile an image into a Deep Zoom pyramid with vips
    Pyramid(PyramidArgs),
}

#[derive(Args)]
struct ToneArgs {
    /// Stretch strength
    #[arg(long, default_value_t = 2.0)]
    k: f64,

    /// Local contrast factor
    #[arg(long = "L", default_value_t = 5.0)]
    l: f64,

    /// Symmetry point
    #[arg(long, default_value_t = 0.25)]
    s: f64,

    /// Shadow protection point (0 disables)
    #[arg(long, default_value_t = 0.01)]
    sp: f64,

    /// Highlight protection point (1 disables)
    #[arg(long, default_value_t = 0.98)]
    hp: f64,

    /// Lower normalization percentile
    #[arg(long = "lower-pct", default_value_t = 0.5)]
    lower_pct: f64,

    /// Upper normalization percentile
    #[arg(long = "upper-pct", default_value_t = 99.5)]
    upper_pct: f64,
}

impl ToneArgs {
    fn to_config(&self) -> ToneConfig {
        ToneConfig::builder()
            .percentiles(self.lower_pct, self.upper_pct)
            .stretch(StretchParameters {
                k: self.k,
                l: self.l,
                s: self.s,
            })
            .protection(ProtectionParameters {
                shadow_point: self.sp,
                highlight_point: self.hp,
                ..ProtectionParameters::default()
            })
            .build()
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzw,
    DeflateFast,
    DeflateBalanced,
    DeflateBest,
}

impl From<CompressionArg> for TiffCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::DeflateFast => TiffCompression::DeflateFast,
            CompressionArg::DeflateBalanced => TiffCompression::DeflateBalanced,
            CompressionArg::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BalanceArg {
    /// Match per-channel black/white percentiles
    Percentile,
    /// Equalize channel means
    GrayWorld,
    /// Clip and quantize only
    Clip,
}

#[derive(Args)]
struct GrayscaleArgs {
    /// Input FITS or TIFF file
    #[arg(long)]
    input: PathBuf,

    /// Output base name
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    tone: ToneArgs,

    /// TIFF compression
    #[arg(long, value_enum, default_value = "none")]
    compression: CompressionArg,
}

#[derive(Args)]
struct CompositeArgs {
    /// Red channel file
    #[arg(long = "r")]
    red: PathBuf,

    /// Green channel file (registration reference)
    #[arg(long = "g")]
    green: PathBuf,

    /// Blue channel file
    #[arg(long = "b")]
    blue: PathBuf,

    /// Output base name
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    tone: ToneArgs,

    /// Display product color balance
    #[arg(long, value_enum, default_value = "percentile")]
    balance: BalanceArg,

    /// Black point percentile of the percentile balance
    #[arg(long, default_value_t = 0.5)]
    balance_lower_pct: f64,

    /// White point percentile of the percentile balance
    #[arg(long, default_value_t = 99.5)]
    balance_upper_pct: f64,

    /// TIFF compression
    #[arg(long, value_enum, default_value = "none")]
    compression: CompressionArg,
}

impl CompositeArgs {
    fn balance_method(&self) -> BalanceMethod {
        match self.balance {
            BalanceArg::Percentile => BalanceMethod::PercentileMatch {
                lower: self.balance_lower_pct,
                upper: self.balance_upper_pct,
            },
            BalanceArg::GrayWorld => BalanceMethod::GrayWorld,
            BalanceArg::Clip => BalanceMethod::Clip,
        }
    }
}

#[derive(Args)]
struct PyramidArgs {
    /// Large TIFF or JPEG to tile
    #[arg(long)]
    input: PathBuf,

    /// Folder receiving the image-named pyramid directory
    #[arg(long)]
    output: PathBuf,

    /// Tile size in pixels
    #[arg(long = "tileSize", alias = "tile-size", default_value_t = 256)]
    tile_size: u32,

    /// Tile overlap in pixels
    #[arg(long, default_value_t = 1)]
    overlap: u32,

    /// Tile format: jpeg, png or webp
    #[arg(long, default_value = "jpeg")]
    format: TileFormat,

    /// Quality for jpeg/webp tiles (1-100)
    #[arg(long, default_value_t = 90)]
    quality: u8,
}

fn run(cli: Cli) -> Result<PathBuf> {
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Grayscale(args) => {
            let config = ConversionConfig::builder()
                .tone(args.tone.to_config())
                .compression(args.compression.into())
                .build();
            debug!(?config, "Grayscale configuration");

            let report = GrayscaleStretchPipeline::new(config).convert_file(&args.input, &args.output)?;
            Ok(report.output)
        }
        Commands::Composite(args) => {
            let config = ConversionConfig::builder()
                .tone(args.tone.to_config())
                .balance(args.balance_method())
                .compression(args.compression.into())
                .build();
            debug!(?config, "Composite configuration");

            let report = ColorCompositePipeline::new(config).convert_files(
                &args.red,
                &args.green,
                &args.blue,
                &args.output,
            )?;
            info!(
                red_aligned = report.red_aligned,
                blue_aligned = report.blue_aligned,
                "Composite complete"
            );
            Ok(report.display_output)
        }
        Commands::Pyramid(args) => {
            let config = PyramidConfig {
                tile_size: args.tile_size,
                overlap: args.overlap,
                format: args.format,
                quality: args.quality,
            };
            Ok(build_pyramid(&args.input, &args.output, &config)?)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init();

    match run(cli) {
        Ok(path) => {
            println!("SUCCESS:{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
