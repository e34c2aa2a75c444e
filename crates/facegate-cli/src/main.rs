use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facegate_core::{
    any_match, decode_rgb, default_model_dir, FaceEncoder, OnnxFaceEncoder, TargetStore,
    DEFAULT_STORE_PATH, DEFAULT_TOLERANCE,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "facegate", about = "facegate target face CLI", version)]
struct Cli {
    /// Target store file shared with facegated
    #[arg(long, global = true, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,
    /// Directory containing det_10g.onnx and w600k_r50.onnx
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
    /// Match distance threshold (lower is stricter)
    #[arg(long, global = true, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the first face in an image as the target
    Register {
        /// Image file
        image: PathBuf,
    },
    /// Check whether any face in an image matches the target
    Verify {
        /// Image file
        image: PathBuf,
    },
    /// Show whether a target is stored
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = TargetStore::new(&cli.store);

    match &cli.command {
        Commands::Register { image } => {
            let mut encoder = load_encoder(cli.model_dir.as_deref())?;
            println!("{}", register(&mut encoder, &store, &read_image(image)?)?);
        }
        Commands::Verify { image } => {
            let mut encoder = load_encoder(cli.model_dir.as_deref())?;
            println!("{}", verify(&mut encoder, &store, &read_image(image)?, cli.tolerance)?);
        }
        Commands::Status => match store.try_load()? {
            Some(target) => println!(
                "target set ({} dims) in {}",
                target.dim(),
                store.path().display()
            ),
            None => println!("no target set in {}", store.path().display()),
        },
    }

    Ok(())
}

fn load_encoder(model_dir: Option<&Path>) -> Result<OnnxFaceEncoder> {
    let dir = model_dir.map(Path::to_path_buf).unwrap_or_else(default_model_dir);
    OnnxFaceEncoder::load(&dir).with_context(|| format!("loading models from {}", dir.display()))
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Store the first face in `image` as the target.
fn register<E: FaceEncoder>(encoder: &mut E, store: &TargetStore, image: &[u8]) -> Result<String> {
    let rgb = decode_rgb(image)?;
    let faces = encoder.detect_and_encode(&rgb)?;
    let Some(first) = faces.first() else {
        return Ok("no face detected; target unchanged".to_string());
    };

    store.save(first)?;
    tracing::info!(faces = faces.len(), path = %store.path().display(), "target saved");
    Ok(format!("target set from first of {} face(s)", faces.len()))
}

fn verify<E: FaceEncoder>(
    encoder: &mut E,
    store: &TargetStore,
    image: &[u8],
    tolerance: f32,
) -> Result<String> {
    let Some(target) = store.load() else {
        return Ok("match: false (no target face set yet)".to_string());
    };

    let rgb = decode_rgb(image)?;
    let faces = encoder.detect_and_encode(&rgb)?;
    let matched = any_match(&*encoder, &target, &faces, tolerance);
    Ok(format!("match: {matched}"))
}
