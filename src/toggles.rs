// Which pipeline stages are switched on, plus the run/record flags.

/// One on/off switch. Rotation is a counter, not a switch, so it lives outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Blur,
    Edge,
    Gradient,
    Brightness,
    Contrast,
    Negative,
    Grayscale,
    HalfWidth,
    HalfHeight,
    MirrorX,
    MirrorY,
    Recording,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToggleState {
    pub capturing: bool,
    pub blur: bool,
    pub edge: bool,
    pub gradient: bool,
    pub brightness: bool,
    pub contrast: bool,
    pub negative: bool,
    pub grayscale: bool,
    pub half_width: bool,
    pub half_height: bool,
    /// Number of 90° clockwise steps, always in 0..4.
    pub(crate) rotation_quadrants: u8,
    pub mirror_x: bool,
    pub mirror_y: bool,
    pub recording: bool,
}

impl ToggleState {
    /// Startup state: capturing, every stage off.
    pub fn new() -> Self {
        Self {
            capturing: true,
            ..Self::default()
        }
    }

    pub fn flip(&mut self, toggle: Toggle) -> bool {
        let flag = match toggle {
            Toggle::Blur => &mut self.blur,
            Toggle::Edge => &mut self.edge,
            Toggle::Gradient => &mut self.gradient,
            Toggle::Brightness => &mut self.brightness,
            Toggle::Contrast => &mut self.contrast,
            Toggle::Negative => &mut self.negative,
            Toggle::Grayscale => &mut self.grayscale,
            Toggle::HalfWidth => &mut self.half_width,
            Toggle::HalfHeight => &mut self.half_height,
            Toggle::MirrorX => &mut self.mirror_x,
            Toggle::MirrorY => &mut self.mirror_y,
            Toggle::Recording => &mut self.recording,
        };
        *flag = !*flag;
        *flag
    }

    pub fn rotate_clockwise(&mut self) -> u8 {
        self.rotation_quadrants = (self.rotation_quadrants % 4 + 1) % 4;
        self.rotation_quadrants
    }

    pub fn rotation_quadrants(&self) -> u8 {
        self.rotation_quadrants
    }

    pub fn stop(&mut self) {
        self.capturing = false;
    }

    /// Short upper-case tags for the active stages, e.g. "BLUR NEG ROT2 REC".
    /// Shown as the caption on the raw camera window.
    pub fn describe(&self) -> String {
        let flags = [
            (self.blur, "BLUR"),
            (self.edge, "EDGE"),
            (self.gradient, "GRAD"),
            (self.brightness, "BRIGHT"),
            (self.contrast, "CONTRAST"),
            (self.negative, "NEG"),
            (self.grayscale, "GRAY"),
            (self.half_width, "HALFX"),
            (self.half_height, "HALFY"),
        ];
        let mut tags: Vec<String> = flags
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, tag)| tag.to_string())
            .collect();
        if self.rotation_quadrants > 0 {
            tags.push(format!("ROT{}", self.rotation_quadrants));
        }
        if self.mirror_x {
            tags.push("MIRX".into());
        }
        if self.mirror_y {
            tags.push("MIRY".into());
        }
        if self.recording {
            tags.push("REC".into());
        }
        if tags.is_empty() {
            "RAW".into()
        } else {
            tags.join(" ")
        }
    }
}
