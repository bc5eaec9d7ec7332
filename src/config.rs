// Command-line configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::capture_loop::RecordingPlan;
use crate::params::{ParamChange, ParameterStore};

#[derive(Debug, Parser)]
#[command(name = "webcam-filters", version, about = "Live webcam filters: toggle stages with 1-9 and A-D, Tab + Up/Down tune parameters, ESC quits")]
pub struct Config {
    /// Camera index (0 = default webcam)
    #[arg(long, default_value_t = 0)]
    pub camera: u32,

    /// Requested capture width, also the recording width
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Requested capture height, also the recording height
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Play these image files as the frame source instead of opening a camera
    #[arg(long, value_name = "FILE", num_args = 1..)]
    pub frames: Vec<PathBuf>,

    /// Recording output file
    #[arg(long, default_value = "footage.avi")]
    pub output: PathBuf,

    /// Recording frame rate
    #[arg(long, default_value_t = 32.0)]
    pub fps: f64,

    /// Disable recording (the D key does nothing)
    #[arg(long)]
    pub no_record: bool,

    /// Starting Gaussian kernel size (made odd, 3-101)
    #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
    pub blur_size: i32,

    /// Starting Canny high threshold, 0-255 (low threshold is a third of it)
    #[arg(long, default_value_t = 255, allow_negative_numbers = true)]
    pub edge_threshold: i32,

    /// Starting brightness, 0-510 (255 = unchanged)
    #[arg(long, default_value_t = 255, allow_negative_numbers = true)]
    pub brightness: i32,

    /// Starting contrast in percent, 0-200 (100 = unchanged)
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    pub contrast: i32,
}

impl Config {
    /// Parameter writes requested on the command line, in order.
    pub fn param_changes(&self) -> [ParamChange; 4] {
        [
            ParamChange::BlurSize(self.blur_size),
            ParamChange::EdgeThreshold(self.edge_threshold),
            ParamChange::Brightness(self.brightness),
            ParamChange::Contrast(self.contrast),
        ]
    }

    /// Build the parameter store, correcting out-of-range flags.
    pub fn parameters(&self) -> ParameterStore {
        let mut params = ParameterStore::default();
        for change in self.param_changes() {
            let stored = params.apply(change);
            tracing::debug!(?change, stored, "parameter set");
        }
        params
    }

    pub fn recording_plan(&self) -> Option<RecordingPlan> {
        (!self.no_record).then(|| RecordingPlan {
            path: self.output.clone(),
            fps: self.fps,
            width: self.width,
            height: self.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_setup() {
        let config = Config::parse_from(["webcam-filters"]);
        assert_eq!(config.camera, 0);
        assert_eq!((config.width, config.height), (640, 480));
        assert!(config.frames.is_empty());
        assert_eq!(config.parameters(), ParameterStore::default());
        let plan = config.recording_plan().unwrap();
        assert_eq!(plan.path, PathBuf::from("footage.avi"));
        assert_eq!(plan.fps, 32.0);
    }

    #[test]
    fn parameter_flags_are_validated() {
        let config = Config::parse_from([
            "webcam-filters",
            "--blur-size",
            "8",
            "--edge-threshold",
            "-20",
            "--brightness",
            "600",
            "--contrast",
            "150",
        ]);
        let params = config.parameters();
        assert_eq!(params.blur_size(), 9);
        assert_eq!(params.edge_threshold(), 0);
        assert_eq!(params.brightness(), 510);
        assert_eq!(params.contrast(), 150);

        let huge = Config::parse_from(["webcam-filters", "--blur-size", "2147483647"]);
        assert_eq!(huge.parameters().blur_size(), 101);
    }

    #[test]
    fn no_record_removes_the_plan() {
        let config = Config::parse_from(["webcam-filters", "--no-record", "--frames", "a.png", "b.png"]);
        assert!(config.recording_plan().is_none());
        assert_eq!(config.frames.len(), 2);
    }
}
