// What you SEE:
// • Two windows: "Camera feed" (raw, captioned with the active stages) and
//   "Processed feed" (after the filter chain).
// • Keys 1-9 toggle blur, edges, gradient, brightness, contrast, negative,
//   grayscale, half width, half height.
// • A rotates 90°, B/C mirror, D starts/stops recording. ESC quits.
// • Tab picks a parameter (blur, edge threshold, brightness, contrast),
//   Up/Down adjust it live. The flags below set the starting values.

mod camera;
mod capture_loop;
mod config;
mod draw;
mod error;
mod input;
mod params;
mod pipeline;
mod recorder;
mod toggles;
mod types;
mod vision;

use camera::{CameraCapture, FrameSource, ImageSequence};
use capture_loop::CaptureLoop;
use clap::Parser;
use config::Config;
use draw::Drawer;
use error::Error;
use recorder::FfmpegRecorder;
use tracing::info;

fn main() -> Result<(), Error> {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=debug or RUST_LOG=webcam_filters=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = Config::parse();
    let params = config.parameters();
    info!(
        blur_size = params.blur_size(),
        edge_threshold = params.edge_threshold(),
        brightness = params.brightness(),
        contrast = params.contrast(),
        "filter parameters"
    );
    let plan = config.recording_plan();

    if config.frames.is_empty() {
        /* --- Camera + window setup ---
           A camera that fails to open ends the program before anything is shown. */
        let cam = CameraCapture::new(config.camera, config.width, config.height)?;
        let (w, h) = cam.resolution();
        run(cam, w, h, plan, params)
    } else {
        let source = ImageSequence::new(config.frames.clone());
        run(source, config.width, config.height, plan, params)
    }
}

fn run<S: FrameSource>(
    source: S,
    width: u32,
    height: u32,
    plan: Option<capture_loop::RecordingPlan>,
    params: params::ParameterStore,
) -> Result<(), Error> {
    let drawer = Drawer::new(width as usize, height as usize)?;
    let summary = CaptureLoop::new(source, drawer, plan, FfmpegRecorder::open, params).run()?;
    info!(
        frames = summary.frames_processed,
        recorded = summary.frames_recorded,
        "bye"
    );
    Ok(())
}
