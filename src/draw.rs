// Window + software drawing utilities.
// Visual effects provided here:
// 1) Two windows: the raw camera feed and the processed feed.
// 2) A tiny 5x7 bitmap font to caption the raw feed with the active stages.
// 3) Live parameter control: Tab picks a parameter, Up/Down step it.

use crate::error::Error;
use crate::input::KEY_ESC;
use crate::params::{Knob, ParamChange, ParameterStore};
use crate::types::Frame;
use minifb::{Key, KeyRepeat, ScaleMode, Window, WindowOptions};
use tracing::info;

/// The two on-screen views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Raw,
    Processed,
}

impl View {
    pub fn label(self) -> &'static str {
        match self {
            View::Raw => "Camera feed",
            View::Processed => "Processed feed",
        }
    }
}

/// Where frames are shown and where key presses come from.
pub trait Display {
    /// Show `frame` in `view`, optionally with a caption drawn on top.
    fn show(&mut self, view: View, frame: &Frame, caption: Option<&str>) -> Result<(), Error>;

    /// At most one pending key press as an ASCII code. Never blocks.
    fn poll_key(&mut self) -> Option<u32>;

    /// False once the user has closed a window.
    fn is_open(&self) -> bool;

    /// Parameter edits made since the last call, oldest first. Never blocks.
    fn poll_param_changes(&mut self, params: &ParameterStore) -> Vec<ParamChange>;
}

pub struct Drawer {
    raw: Window,       // the live camera image
    processed: Window, // the filtered image
    knob: Knob,        // parameter the arrow keys adjust
}

impl Drawer {
    /// Create both windows sized to the camera feed.
    /// Visual: two empty windows appear with fixed titles.
    pub fn new(width: usize, height: usize) -> Result<Self, Error> {
        let options = WindowOptions {
            resize: true,
            // Processed frames change size (halving, rotation); keep their aspect.
            scale_mode: ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        };
        let raw = Window::new(View::Raw.label(), width, height, options)
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        let processed = Window::new(View::Processed.label(), width, height, options)
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self {
            raw,
            processed,
            knob: Knob::default(),
        })
    }

    fn window(&mut self, view: View) -> &mut Window {
        match view {
            View::Raw => &mut self.raw,
            View::Processed => &mut self.processed,
        }
    }
}

impl Display for Drawer {
    /// Visual: the window immediately displays the new image.
    fn show(&mut self, view: View, frame: &Frame, caption: Option<&str>) -> Result<(), Error> {
        let (w, h) = frame.dimensions();
        let mut pixels = frame.to_0rgb();
        if let Some(text) = caption {
            draw_text_5x7(&mut pixels, w as usize, h as usize, 8, 8, text, 0x00_FF_FF_FF);
        }
        self.window(view)
            .update_with_buffer(&pixels, w as usize, h as usize)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    fn poll_key(&mut self) -> Option<u32> {
        self.raw
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .chain(self.processed.get_keys_pressed(KeyRepeat::No))
            .find_map(key_code)
    }

    fn is_open(&self) -> bool {
        self.raw.is_open() && self.processed.is_open()
    }

    fn poll_param_changes(&mut self, params: &ParameterStore) -> Vec<ParamChange> {
        let mut keys = Vec::new();
        for window in [&self.raw, &self.processed] {
            // Tab once per press; arrows repeat while held.
            keys.extend(window.get_keys_pressed(KeyRepeat::No).into_iter().filter(|k| *k == Key::Tab));
            keys.extend(
                window
                    .get_keys_pressed(KeyRepeat::Yes)
                    .into_iter()
                    .filter(|k| matches!(k, Key::Up | Key::Down)),
            );
        }
        knob_changes(&mut self.knob, &keys, params).into_iter().collect()
    }
}

/// Tab selects the next parameter; each Up/Down moves the selected one a step.
/// All steps in one batch are folded into a single change message.
pub fn knob_changes(knob: &mut Knob, keys: &[Key], params: &ParameterStore) -> Option<ParamChange> {
    let mut notches = 0i32;
    for key in keys {
        match key {
            Key::Tab => {
                *knob = knob.next();
                info!(parameter = knob.label(), "adjusting");
            }
            Key::Up => notches += 1,
            Key::Down => notches -= 1,
            _ => {}
        }
    }
    (notches != 0).then(|| knob.nudge(params, notches))
}

/// ASCII code for the keys the controller understands.
pub fn key_code(key: Key) -> Option<u32> {
    let ch = match key {
        Key::Escape => return Some(KEY_ESC),
        Key::Key0 => '0',
        Key::Key1 => '1',
        Key::Key2 => '2',
        Key::Key3 => '3',
        Key::Key4 => '4',
        Key::Key5 => '5',
        Key::Key6 => '6',
        Key::Key7 => '7',
        Key::Key8 => '8',
        Key::Key9 => '9',
        Key::A => 'A',
        Key::B => 'B',
        Key::C => 'C',
        Key::D => 'D',
        _ => return None,
    };
    Some(ch as u32)
}

/* ---------- Software drawing: pixels and a tiny bitmap font ---------- */

/// Put a pixel into a 0x00RRGGBB buffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(buf: &mut [u32], width: usize, height: usize, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= width || y >= height {
        return;
    }
    buf[y * width + x] = color;
}

/* ---------- 5x7 bitmap font (digits, the capitals used by stage tags, space) ---------- */

/// Return a 5x7 glyph bitmap for a limited character set.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b11001,0b10101,0b10011,0b10001,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y), with a 1-pixel black shadow for contrast.
fn draw_char_5x7(buf: &mut [u32], width: usize, height: usize, x: i32, y: i32, ch: char, color: u32) {
    let Some(rows) = glyph5x7(ch) else { return };
    for (shadow, ink) in [(1, 0x0000_0000), (0, color)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    put_pixel(buf, width, height, x + rx + shadow, y + ry as i32 + shadow, ink);
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs; each glyph advances 6 pixels.
pub fn draw_text_5x7(buf: &mut [u32], width: usize, height: usize, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(buf, width, height, x, y, ch, color);
        x += 6; // 5 pixels glyph width + 1 pixel spacing
    }
}
