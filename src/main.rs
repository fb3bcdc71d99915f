//! gpstamp CLI: front end for the photo-stamping engine.
//!
//! Reads a photo and caption from disk, stamps the overlay and caption onto
//! the photo, and writes the resulting JPEG. Style parameters can be
//! overridden with a JSON file.

use camino::Utf8PathBuf;
use clap::Parser;
use gpstamp::{Stamper, StyleConfig};

/// gpstamp: overlay compositing and letter-spaced caption stamping
#[derive(Parser)]
#[command(name = "gpstamp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the photo to stamp
    #[arg(long)]
    photo: Utf8PathBuf,

    /// Caption text (use \n for line breaks)
    #[arg(long, conflicts_with = "caption_file")]
    caption: Option<String>,

    /// Read the caption from a file instead
    #[arg(long)]
    caption_file: Option<Utf8PathBuf>,

    /// Overlay image asset
    #[arg(long, default_value = "overlay.png")]
    overlay: Utf8PathBuf,

    /// Font asset for caption rendering
    #[arg(long, default_value = "fonts/DejaVuSans.ttf")]
    font: Utf8PathBuf,

    /// Optional style configuration (JSON)
    #[arg(long)]
    style: Option<Utf8PathBuf>,

    /// Output path for the stamped JPEG
    #[arg(short, long, default_value = "stamped.jpg")]
    out: Utf8PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let caption = match (&cli.caption, &cli.caption_file) {
        (Some(text), _) => text.replace("\\n", "\n"),
        (None, Some(path)) => std::fs::read_to_string(path.as_std_path())?,
        (None, None) => anyhow::bail!("Provide a caption with --caption or --caption-file"),
    };

    let style = match &cli.style {
        Some(path) => {
            let json = std::fs::read_to_string(path.as_std_path())?;
            serde_json::from_str::<StyleConfig>(&json)?
        }
        None => StyleConfig::default(),
    };

    let photo = std::fs::read(cli.photo.as_std_path())?;
    log::info!("Stamping {} ({} bytes)", cli.photo, photo.len());

    let stamper = Stamper::from_paths(&cli.overlay, &cli.font)?;
    let jpeg = stamper.stamp(&photo, &caption, &style)?;

    std::fs::write(cli.out.as_std_path(), &jpeg)?;
    log::info!("Wrote {} ({} bytes)", cli.out, jpeg.len());

    Ok(())
}

/// Initialize logging based on verbosity.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}
