//! Recording sink: raw frames piped into an ffmpeg child process.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::Error;
use crate::types::Frame;
use crate::vision;

/// Fixed for the lifetime of a recording.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordingSettings {
    pub path: PathBuf,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    /// Decided by the first captured frame, never changed afterwards.
    pub color: bool,
}

pub trait Recorder {
    fn write(&mut self, frame: &Frame) -> Result<(), Error>;
    /// Flush and close the output file.
    fn finish(self) -> Result<(), Error>;
}

/// Bring a processed frame to the recording's channel count and size.
/// Gray frames are expanded to three channels for colour recordings.
pub fn prepare_for_recording(frame: Frame, settings: &RecordingSettings) -> Frame {
    let frame = if settings.color {
        frame.into_color()
    } else {
        frame.into_gray()
    };
    let (w, h) = frame.dimensions();
    if (w, h) == (settings.width, settings.height) {
        return frame;
    }
    vision::resize_linear(
        &frame,
        settings.width as f64 / w as f64,
        settings.height as f64 / h as f64,
    )
}

/// ffmpeg arguments: raw frames on stdin, MPEG-4 Part 2 tagged XVID out.
pub fn ffmpeg_args(settings: &RecordingSettings) -> Vec<String> {
    let pix_fmt = if settings.color { "rgb24" } else { "gray" };
    vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        // Raw frames from stdin
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        pix_fmt.to_string(),
        "-s".to_string(),
        format!("{}x{}", settings.width, settings.height),
        "-r".to_string(),
        settings.fps.to_string(),
        "-i".to_string(),
        "-".to_string(),
        "-c:v".to_string(),
        "mpeg4".to_string(),
        "-vtag".to_string(),
        "xvid".to_string(),
        "-q:v".to_string(),
        "5".to_string(),
        settings.path.to_string_lossy().to_string(),
    ]
}

pub struct FfmpegRecorder {
    child: Child,
    stdin: Option<ChildStdin>,
    settings: RecordingSettings,
    frames: u64,
}

impl FfmpegRecorder {
    pub fn open(settings: &RecordingSettings) -> Result<Self, Error> {
        let ffmpeg = ffmpeg_sidecar::paths::ffmpeg_path();
        Self::open_with(&ffmpeg, settings)
    }

    fn open_with(ffmpeg: &Path, settings: &RecordingSettings) -> Result<Self, Error> {
        let args = ffmpeg_args(settings);
        debug!("ffmpeg {}", args.join(" "));

        let mut child = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::RecorderStart(format!("{}: {e}", ffmpeg.display())))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::RecorderStart("ffmpeg stdin unavailable".into()))?;

        info!(
            path = %settings.path.display(),
            width = settings.width,
            height = settings.height,
            fps = settings.fps,
            color = settings.color,
            "recording to file"
        );
        Ok(Self {
            child,
            stdin: Some(stdin),
            settings: settings.clone(),
            frames: 0,
        })
    }
}

impl Recorder for FfmpegRecorder {
    fn write(&mut self, frame: &Frame) -> Result<(), Error> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(Error::RecorderWrite(std::io::ErrorKind::BrokenPipe.into()));
        };
        debug_assert_eq!(frame.dimensions(), (self.settings.width, self.settings.height));
        stdin.write_all(frame.samples())?;
        self.frames += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<(), Error> {
        // Close stdin to signal EOF
        drop(self.stdin.take());
        let status = self.child.wait()?;
        if status.success() {
            info!(frames = self.frames, path = %self.settings.path.display(), "recording finished");
        } else {
            warn!(%status, "ffmpeg exited with an error");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(color: bool) -> RecordingSettings {
        RecordingSettings {
            path: PathBuf::from("footage.avi"),
            fps: 32.0,
            width: 8,
            height: 6,
            color,
        }
    }

    #[test]
    fn gray_frames_become_colour_for_colour_recordings() {
        let out = prepare_for_recording(Frame::filled(1, 8, 6, 77), &settings(true));
        assert_eq!(out.channels(), 3);
        assert_eq!(out.dimensions(), (8, 6));
        assert!(out.samples().iter().all(|&v| v == 77));
    }

    #[test]
    fn mono_recordings_stay_mono() {
        let out = prepare_for_recording(Frame::filled(3, 8, 6, 10), &settings(false));
        assert_eq!(out.channels(), 1);
    }

    #[test]
    fn frames_are_scaled_to_the_recording_size() {
        let out = prepare_for_recording(Frame::filled(3, 4, 3, 200), &settings(true));
        assert_eq!(out.dimensions(), (8, 6));
        let out = prepare_for_recording(Frame::filled(3, 6, 8, 200), &settings(true));
        assert_eq!(out.dimensions(), (8, 6));
        assert!(out.samples().iter().all(|&v| v == 200));
    }

    #[test]
    fn ffmpeg_reads_raw_frames_of_the_fixed_size() {
        let args = ffmpeg_args(&settings(true));
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgb24 -s 8x6 -r 32 -i -"));
        assert!(joined.contains("-vtag xvid"));
        assert_eq!(args.last().map(String::as_str), Some("footage.avi"));
        assert!(ffmpeg_args(&settings(false)).join(" ").contains("-pix_fmt gray"));
    }

    #[test]
    fn missing_encoder_fails_to_start() {
        let result = FfmpegRecorder::open_with(Path::new("/no/such/ffmpeg-binary"), &settings(true));
        assert!(matches!(result, Err(Error::RecorderStart(_))));
    }
}
