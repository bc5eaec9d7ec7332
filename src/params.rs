// Numeric knobs for the filter stages.
// Every write goes through a validator, so the pipeline never sees a value
// it cannot use (e.g. an even Gaussian kernel).

pub const MIN_BLUR_SIZE: i32 = 3;
/// Larger kernels cost more than a frame period and stop looking like a blur.
pub const MAX_BLUR_SIZE: i32 = 101;
pub const MAX_EDGE_THRESHOLD: i32 = 255;
/// Brightness is stored shifted by this amount so the neutral value is mid-range.
pub const BRIGHTNESS_NEUTRAL: i32 = 255;
pub const MAX_BRIGHTNESS: i32 = 2 * BRIGHTNESS_NEUTRAL;
/// Contrast is stored in hundredths; 100 means ×1.0.
pub const CONTRAST_NEUTRAL: i32 = 100;
pub const MAX_CONTRAST: i32 = 2 * CONTRAST_NEUTRAL;

/// "Parameter X changed to v", as sent by whatever surface edits parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamChange {
    BlurSize(i32),
    EdgeThreshold(i32),
    Brightness(i32),
    Contrast(i32),
}

/// The parameter a live control is currently adjusting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Knob {
    #[default]
    BlurSize,
    EdgeThreshold,
    Brightness,
    Contrast,
}

impl Knob {
    pub fn next(self) -> Self {
        match self {
            Knob::BlurSize => Knob::EdgeThreshold,
            Knob::EdgeThreshold => Knob::Brightness,
            Knob::Brightness => Knob::Contrast,
            Knob::Contrast => Knob::BlurSize,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Knob::BlurSize => "blur size",
            Knob::EdgeThreshold => "edge threshold",
            Knob::Brightness => "brightness",
            Knob::Contrast => "contrast",
        }
    }

    // Blur moves between odd sizes.
    fn step(self) -> i32 {
        match self {
            Knob::BlurSize => 2,
            _ => 5,
        }
    }

    /// Change message moving this parameter `notches` steps from its stored value.
    /// The store still validates it, so nudging past either end is harmless.
    pub fn nudge(self, params: &ParameterStore, notches: i32) -> ParamChange {
        let delta = notches.saturating_mul(self.step());
        match self {
            Knob::BlurSize => ParamChange::BlurSize(params.blur_size().saturating_add(delta)),
            Knob::EdgeThreshold => {
                ParamChange::EdgeThreshold(params.edge_threshold().saturating_add(delta))
            }
            Knob::Brightness => ParamChange::Brightness(params.brightness().saturating_add(delta)),
            Knob::Contrast => ParamChange::Contrast(params.contrast().saturating_add(delta)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterStore {
    blur_size: i32,
    edge_threshold: i32,
    brightness: i32,
    contrast: i32,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self {
            blur_size: MIN_BLUR_SIZE,
            edge_threshold: MAX_EDGE_THRESHOLD,
            brightness: BRIGHTNESS_NEUTRAL,
            contrast: CONTRAST_NEUTRAL,
        }
    }
}

impl ParameterStore {
    /// Apply a change message; returns the value actually stored.
    pub fn apply(&mut self, change: ParamChange) -> i32 {
        match change {
            ParamChange::BlurSize(v) => self.set_blur_size(v),
            ParamChange::EdgeThreshold(v) => self.set_edge_threshold(v),
            ParamChange::Brightness(v) => self.set_brightness(v),
            ParamChange::Contrast(v) => self.set_contrast(v),
        }
    }

    /// Even sizes are bumped to the next odd one, then the result is clamped
    /// to 3..=101 (both ends odd, so the size stays odd).
    pub fn set_blur_size(&mut self, v: i32) -> i32 {
        let mut size = v;
        if size % 2 == 0 {
            size = size.saturating_add(1);
        }
        let size = size.clamp(MIN_BLUR_SIZE, MAX_BLUR_SIZE);
        self.blur_size = size;
        size
    }

    pub fn set_edge_threshold(&mut self, v: i32) -> i32 {
        self.edge_threshold = v.clamp(0, MAX_EDGE_THRESHOLD);
        self.edge_threshold
    }

    pub fn set_brightness(&mut self, v: i32) -> i32 {
        self.brightness = v.clamp(0, MAX_BRIGHTNESS);
        self.brightness
    }

    pub fn set_contrast(&mut self, v: i32) -> i32 {
        self.contrast = v.clamp(0, MAX_CONTRAST);
        self.contrast
    }

    pub fn blur_size(&self) -> i32 {
        self.blur_size
    }

    pub fn edge_threshold(&self) -> i32 {
        self.edge_threshold
    }

    pub fn brightness(&self) -> i32 {
        self.brightness
    }

    pub fn contrast(&self) -> i32 {
        self.contrast
    }

    /// Additive offset in [-255, 255].
    pub fn brightness_offset(&self) -> f32 {
        (self.brightness - BRIGHTNESS_NEUTRAL) as f32
    }

    /// Multiplicative factor in [0.0, 2.0].
    pub fn contrast_factor(&self) -> f32 {
        self.contrast as f32 / CONTRAST_NEUTRAL as f32
    }
}
