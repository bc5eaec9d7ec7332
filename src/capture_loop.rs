// The main loop: pull → show raw → process → show processed → record → input → parameters.

use tracing::{error, info, trace, warn};

use crate::camera::FrameSource;
use crate::draw::{Display, View};
use crate::error::Error;
use crate::input::{InputController, RunState};
use crate::params::ParameterStore;
use crate::pipeline;
use crate::recorder::{Recorder, RecordingSettings, prepare_for_recording};
use crate::toggles::ToggleState;
use crate::types::Frame;

/// Recording configuration known before the first frame arrives.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordingPlan {
    pub path: std::path::PathBuf,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

impl RecordingPlan {
    /// The colour mode comes from the first captured frame.
    pub fn settle(&self, first: &Frame) -> RecordingSettings {
        RecordingSettings {
            path: self.path.clone(),
            fps: self.fps,
            width: self.width,
            height: self.height,
            color: first.is_color(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub frames_recorded: u64,
}

pub struct CaptureLoop<S, D, R, O> {
    source: S,
    display: D,
    open_recorder: O,
    recorder: Option<R>,
    plan: Option<RecordingPlan>,
    input: InputController,
    toggles: ToggleState,
    params: ParameterStore,
}

impl<S, D, R, O> CaptureLoop<S, D, R, O>
where
    S: FrameSource,
    D: Display,
    R: Recorder,
    O: FnMut(&RecordingSettings) -> Result<R, Error>,
{
    /// `plan = None` runs without recording support; the record key is then ignored.
    pub fn new(source: S, display: D, plan: Option<RecordingPlan>, open_recorder: O, params: ParameterStore) -> Self {
        Self {
            source,
            display,
            open_recorder,
            recorder: None,
            input: InputController::new(plan.is_some()),
            plan,
            toggles: ToggleState::new(),
            params,
        }
    }

    /// Run until ESC, a closed window or the end of the stream.
    /// The source is released and any recording finalised on every exit path.
    pub fn run(mut self) -> Result<RunSummary, Error> {
        let mut summary = RunSummary::default();
        let result = self.drive(&mut summary);

        self.source.release();
        if let Some(recorder) = self.recorder.take() {
            if let Err(e) = recorder.finish() {
                error!("closing recording: {e}");
            }
        }
        info!(
            processed = summary.frames_processed,
            recorded = summary.frames_recorded,
            "capture stopped"
        );
        result.map(|()| summary)
    }

    fn drive(&mut self, summary: &mut RunSummary) -> Result<(), Error> {
        let Some(mut frame) = self.source.next_frame()? else {
            info!("no frames from source");
            return Ok(());
        };
        let settings = self.plan.as_ref().map(|plan| plan.settle(&frame));

        loop {
            let caption = self.toggles.describe();
            self.display.show(View::Raw, &frame, Some(&caption))?;

            let processed = pipeline::process(frame, &self.toggles, &self.params);
            summary.frames_processed += 1;
            trace!(size = ?processed.dimensions(), channels = processed.channels(), "frame processed");

            self.display.show(View::Processed, &processed, None)?;

            if self.toggles.recording {
                if let Some(settings) = &settings {
                    if self.record(processed, settings) {
                        summary.frames_recorded += 1;
                    }
                }
            }

            let key = self.display.poll_key();
            if self.input.handle(key, &mut self.toggles) == RunState::Stopped {
                return Ok(());
            }
            // Takes effect from the next frame, like a toggle.
            for change in self.display.poll_param_changes(&self.params) {
                let stored = self.params.apply(change);
                info!(?change, stored, "parameter changed");
            }
            if !self.display.is_open() {
                info!("window closed");
                return Ok(());
            }

            frame = match self.source.next_frame()? {
                Some(next) => next,
                None => {
                    info!("end of stream");
                    return Ok(());
                }
            };
        }
    }

    /// Append one frame, opening the recorder on first use.
    /// Any recorder failure switches recording off instead of stopping capture.
    fn record(&mut self, frame: Frame, settings: &RecordingSettings) -> bool {
        if self.recorder.is_none() {
            match (self.open_recorder)(settings) {
                Ok(recorder) => self.recorder = Some(recorder),
                Err(e) => {
                    warn!("cannot start recording: {e}");
                    self.toggles.recording = false;
                    return false;
                }
            }
        }
        let Some(recorder) = self.recorder.as_mut() else {
            return false;
        };

        let frame = prepare_for_recording(frame, settings);
        match recorder.write(&frame) {
            Ok(()) => true,
            Err(e) => {
                warn!("recording stopped: {e}");
                self.toggles.recording = false;
                if let Some(broken) = self.recorder.take() {
                    if let Err(e) = broken.finish() {
                        error!("closing recording: {e}");
                    }
                }
                false
            }
        }
    }
}
