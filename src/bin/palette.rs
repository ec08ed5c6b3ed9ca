use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use palette_extractor_wasm::{
    EXPORT_FILE_NAME, HexColor, PaletteConfig, PaletteState, QuantizerKind, SwatchEntry,
    export::write_palette_file, nearest_name,
};
use serde::Serialize;
use tracing::info;

/// Extract a dominant color palette from images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of colors in the palette (2-10)
    #[arg(short = 'k', long)]
    colors: Option<i64>,

    /// Hex color to keep in the palette; repeat for several
    #[arg(short, long = "lock")]
    locks: Vec<HexColor>,

    /// Quantization strategy
    #[arg(short, long, value_parser = parse_quantizer)]
    quantizer: Option<QuantizerKind>,

    /// Longest side images are reduced to before sampling (0 disables)
    #[arg(long)]
    downscale: Option<u32>,

    /// k-means seed
    #[arg(long)]
    seed: Option<u64>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for palette files
    #[arg(short = 'd', long, default_value = ".")]
    out_dir: PathBuf,

    /// Print JSON instead of writing text files
    #[arg(long)]
    json: bool,

    /// Don't look up color names
    #[arg(long)]
    no_names: bool,
}

fn parse_quantizer(raw: &str) -> Result<QuantizerKind, String> {
    match raw {
        "kmeans" | "k-means" => Ok(QuantizerKind::KMeans),
        "median-cut" | "mediancut" => Ok(QuantizerKind::MedianCut),
        other => Err(format!("unknown quantizer `{other}` (expected kmeans or median-cut)")),
    }
}

#[derive(Serialize)]
struct SwatchReport<'a> {
    #[serde(flatten)]
    entry: &'a SwatchEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'static str>,
}

#[derive(Serialize)]
struct ImageReport<'a> {
    input: String,
    swatches: Vec<SwatchReport<'a>>,
}

fn build_config(args: &Args) -> Result<PaletteConfig> {
    let mut config = match &args.config {
        Some(path) => PaletteConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PaletteConfig::default(),
    };
    if let Some(kind) = args.quantizer {
        config.quantizer = kind;
    }
    if let Some(max_side) = args.downscale {
        config.downscale = (max_side > 0).then_some(max_side);
    }
    if let Some(seed) = args.seed {
        config.kmeans.seed = seed;
    }
    Ok(config)
}

/// Decode one input, then apply the requested locks on top of the first palette.
fn process(config: &PaletteConfig, args: &Args, input: &Path) -> Result<PaletteState> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let mut state = PaletteState::new(config.clone());
    if let Some(n) = args.colors {
        state.set_color_count(n);
    }

    let token = state.begin_upload();
    state
        .load_image(token, &bytes)
        .with_context(|| format!("extracting palette from {}", input.display()))?;

    if !args.locks.is_empty() {
        // Locked colors go first; the generator fills the rest.
        state.pin_colors(args.locks.iter().cloned());
        state.regenerate()?;
        info!(locked = args.locks.len(), input = %input.display(), "applied locked colors");
    }
    Ok(state)
}

fn output_name(input: &Path, several: bool) -> String {
    if several {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        format!("{stem}-{EXPORT_FILE_NAME}")
    } else {
        EXPORT_FILE_NAME.to_string()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("palette_extractor_wasm=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let several = args.inputs.len() > 1;

    let mut states = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        states.push((input, process(&config, &args, input)?));
    }

    if args.json {
        let reports: Vec<ImageReport> = states
            .iter()
            .map(|(input, state)| ImageReport {
                input: input.display().to_string(),
                swatches: state
                    .palette()
                    .iter()
                    .map(|entry| SwatchReport {
                        entry,
                        name: (!args.no_names).then(|| nearest_name(&entry.color).name),
                    })
                    .collect(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for (input, state) in &states {
        println!("{}:", input.display());
        if state.palette().is_empty() {
            println!("  (no opaque pixels)");
        }
        for entry in state.palette() {
            let lock = if entry.locked { "locked" } else { "      " };
            if args.no_names {
                println!("  {} {lock}", entry.color);
            } else {
                println!("  {} {lock} {}", entry.color, nearest_name(&entry.color).name);
            }
        }
        let path = write_palette_file(&args.out_dir, &output_name(input, several), state.palette())?;
        println!("Saved → {}", path.display());
    }

    Ok(())
}
