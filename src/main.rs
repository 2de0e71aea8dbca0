use arcade_img::{ConvertOptions, Converter, Palette, TargetSize, ARCADE_PALETTE};
use clap::Parser;
use std::error::Error;
use std::fs;
use std::io::{stdout, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Convert an image to a MakeCode Arcade image
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image path
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Write the MakeCode Arcade image here instead of standard output
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Save the quantized image (first frame for GIFs) here instead of
    /// writing text
    #[arg(short, long, value_name = "PATH")]
    preview: Option<PathBuf>,

    /// Output width. If height is omitted, aspect ratio is kept
    #[arg(long, value_name = "W")]
    width: Option<u32>,

    /// Output height. If width is omitted, aspect ratio is kept
    #[arg(long, value_name = "H")]
    height: Option<u32>,

    /// Comma separated 6-digit hex colors, e.g. "#000000,#ffffff"
    #[arg(long, default_value = ARCADE_PALETTE)]
    palette: Palette,

    /// Read the input as a GIF and output a list of images
    #[arg(short, long)]
    gif: bool,

    /// Include debug messages
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let converter = Converter::new(ConvertOptions {
        size: TargetSize::new(args.width, args.height),
        palette: args.palette.clone(),
        animated: args.gif,
    });
    info!(
        "Opening {} {}",
        if args.gif { "GIF" } else { "image" },
        args.input.display()
    );

    if let Some(path) = &args.preview {
        let image = converter.preview(&args.input)?;
        info!("Writing preview to {}", path.display());
        image.save(path)?;
        return Ok(());
    }

    // an existing output file is only replaced once conversion succeeded
    let text = converter.render(&args.input)?;
    match &args.output {
        Some(path) => {
            fs::write(path, text)?;
            info!("Wrote MakeCode Arcade image to {}", path.display());
        }
        None => writeln!(stdout().lock(), "{text}")?,
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.debug);
    debug!("Received arguments: {:?}", args);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}: {e}", args.input.display());
            ExitCode::FAILURE
        }
    }
}
