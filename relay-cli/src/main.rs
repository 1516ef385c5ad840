//! i420-relay — shared-memory I420 frame transform stage
//!
//! Waits on a named region containing an I420 image, applies crop /
//! 180-degree flip / rescale, and republishes the result as I420 and
//! ARGB into two newly created regions for downstream consumers.
//!
//! The region backend here is the process-local reference
//! implementation from `relay-shm`; an OS-backed mapping drops in
//! behind the same `Region` trait without touching the pipeline.

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use relay_pipeline::{Pipeline, RegionNames};
use relay_shm::{CancelToken, RegionHub};
use relay_video::{Geometry, GeometryConfig};

mod preview;
mod signal;

#[derive(Parser, Debug)]
#[command(name = "i420-relay")]
#[command(
    about = "Waits on a shared memory region containing an I420 image and republishes \
             transformed I420 and ARGB renditions into two new regions"
)]
struct Args {
    /// Name of the existing region containing the I420 input image
    #[arg(long = "in")]
    input: String,

    /// Width of the input image
    #[arg(long = "in.width")]
    in_width: u32,

    /// Height of the input image
    #[arg(long = "in.height")]
    in_height: u32,

    /// Name of the region to be created for the I420 output image
    #[arg(long = "out")]
    out: String,

    /// Name of the region to be created for the ARGB output image
    /// (default: value from --out + '.argb')
    #[arg(long = "out.argb")]
    out_argb: Option<String>,

    /// Crop this area from the input image (x for top left)
    #[arg(long = "crop.x")]
    crop_x: Option<u32>,

    /// Crop this area from the input image (y for top left)
    #[arg(long = "crop.y")]
    crop_y: Option<u32>,

    /// Crop this area from the input image (width)
    #[arg(long = "crop.width")]
    crop_width: Option<u32>,

    /// Crop this area from the input image (height)
    #[arg(long = "crop.height")]
    crop_height: Option<u32>,

    /// Scale the optionally cropped area to this final width
    #[arg(long = "scale.width")]
    scale_width: Option<u32>,

    /// Scale the optionally cropped area to this final height
    #[arg(long = "scale.height")]
    scale_height: Option<u32>,

    /// Rotate the image by 180 degrees
    #[arg(long)]
    flip: bool,

    /// Display the output image in a preview window
    #[arg(long)]
    verbose: bool,
}

impl Args {
    fn geometry_config(&self) -> GeometryConfig {
        GeometryConfig {
            in_width: self.in_width,
            in_height: self.in_height,
            crop_x: self.crop_x,
            crop_y: self.crop_y,
            crop_width: self.crop_width,
            crop_height: self.crop_height,
            scale_width: self.scale_width,
            scale_height: self.scale_height,
            rotate180: self.flip,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    let geometry = match Geometry::resolve(&args.geometry_config()) {
        Ok(geometry) => geometry,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{}", Args::command().render_usage());
            return ExitCode::from(1);
        }
    };

    let names = RegionNames::new(args.input, args.out, args.out_argb);
    let hub = RegionHub::new();
    let mut pipeline = match Pipeline::bind(&hub, &names, geometry) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    if args.verbose {
        match preview::PreviewWindow::new(
            &names.out_argb,
            geometry.final_width,
            geometry.final_height,
        ) {
            Ok(window) => pipeline = pipeline.with_sink(Box::new(window)),
            Err(err) => log::warn!("cannot open preview window: {err}"),
        }
    }

    let cancel = CancelToken::new();
    signal::install(&cancel);
    pipeline.run(&cancel);

    ExitCode::SUCCESS
}
