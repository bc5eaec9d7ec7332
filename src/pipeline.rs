// The frame processor: a fixed, ordered chain of stages, each switched on or
// off by the toggles. Order matters: every stage consumes the previous output.

use crate::params::ParameterStore;
use crate::toggles::ToggleState;
use crate::types::Frame;
use crate::vision::{self, FlipAxis};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    GaussianBlur,
    EdgeDetect,
    Gradient,
    Brightness,
    Contrast,
    Negative,
    Grayscale,
    HalfWidth,
    HalfHeight,
    Rotate,
    Mirror,
}

impl Stage {
    /// Application order.
    pub const ORDER: [Stage; 11] = [
        Stage::GaussianBlur,
        Stage::EdgeDetect,
        Stage::Gradient,
        Stage::Brightness,
        Stage::Contrast,
        Stage::Negative,
        Stage::Grayscale,
        Stage::HalfWidth,
        Stage::HalfHeight,
        Stage::Rotate,
        Stage::Mirror,
    ];

    pub fn is_active(self, toggles: &ToggleState) -> bool {
        match self {
            Stage::GaussianBlur => toggles.blur,
            Stage::EdgeDetect => toggles.edge,
            Stage::Gradient => toggles.gradient,
            Stage::Brightness => toggles.brightness,
            Stage::Contrast => toggles.contrast,
            Stage::Negative => toggles.negative,
            Stage::Grayscale => toggles.grayscale,
            Stage::HalfWidth => toggles.half_width,
            Stage::HalfHeight => toggles.half_height,
            Stage::Rotate => toggles.rotation_quadrants() != 0,
            Stage::Mirror => toggles.mirror_x || toggles.mirror_y,
        }
    }

    /// Run this stage unconditionally.
    pub fn apply(self, frame: Frame, toggles: &ToggleState, params: &ParameterStore) -> Frame {
        match self {
            Stage::GaussianBlur => vision::gaussian_blur(&frame, params.blur_size() as usize),
            Stage::EdgeDetect => {
                let high = params.edge_threshold() as f32;
                vision::canny(&frame, high / 3.0, high)
            }
            Stage::Gradient => vision::sobel_gradient(&frame),
            Stage::Brightness => vision::convert_scale(&frame, 1.0, params.brightness_offset()),
            Stage::Contrast => vision::convert_scale(&frame, params.contrast_factor(), 0.0),
            Stage::Negative => vision::convert_scale(&frame, -1.0, 255.0),
            Stage::Grayscale => frame.into_gray(),
            Stage::HalfWidth => vision::resize_linear(&frame, 0.5, 1.0),
            Stage::HalfHeight => vision::resize_linear(&frame, 1.0, 0.5),
            Stage::Rotate => {
                let mut frame = frame;
                for _ in 0..toggles.rotation_quadrants() {
                    frame = vision::rotate_90_clockwise(&frame);
                }
                frame
            }
            Stage::Mirror => match (toggles.mirror_x, toggles.mirror_y) {
                (true, true) => vision::flip(&frame, FlipAxis::Both),
                (true, false) => vision::flip(&frame, FlipAxis::X),
                (false, true) => vision::flip(&frame, FlipAxis::Y),
                (false, false) => frame,
            },
        }
    }
}

/// Apply every active stage, in order, to one frame.
pub fn process(frame: Frame, toggles: &ToggleState, params: &ParameterStore) -> Frame {
    Stage::ORDER
        .iter()
        .filter(|stage| stage.is_active(toggles))
        .fold(frame, |frame, stage| stage.apply(frame, toggles, params))
}
