// Keyboard → state transitions.
// The mapping is a pure function of the key code, so it can be tested
// without a window.

use crate::toggles::{Toggle, ToggleState};
use tracing::{debug, info};

pub const KEY_ESC: u32 = 27;

/// What a single key press asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Stop,
    Flip(Toggle),
    RotateClockwise,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopped,
}

impl Action {
    /// Map an ASCII key code to its action. Unbound codes map to `None`.
    pub fn from_key_code(code: u32) -> Option<Action> {
        let action = match code {
            KEY_ESC => Action::Stop,
            0x31 => Action::Flip(Toggle::Blur),       // 1
            0x32 => Action::Flip(Toggle::Edge),       // 2
            0x33 => Action::Flip(Toggle::Gradient),   // 3
            0x34 => Action::Flip(Toggle::Brightness), // 4
            0x35 => Action::Flip(Toggle::Contrast),   // 5
            0x36 => Action::Flip(Toggle::Negative),   // 6
            0x37 => Action::Flip(Toggle::Grayscale),  // 7
            0x38 => Action::Flip(Toggle::HalfWidth),  // 8
            0x39 => Action::Flip(Toggle::HalfHeight), // 9
            0x41 => Action::RotateClockwise,          // A
            0x42 => Action::Flip(Toggle::MirrorX),    // B
            0x43 => Action::Flip(Toggle::MirrorY),    // C
            0x44 => Action::Flip(Toggle::Recording),  // D
            _ => return None,
        };
        Some(action)
    }
}

impl ToggleState {
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Stop => self.stop(),
            Action::Flip(toggle) => {
                self.flip(toggle);
            }
            Action::RotateClockwise => {
                self.rotate_clockwise();
            }
        }
    }

    pub fn run_state(&self) -> RunState {
        if self.capturing {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }
}

/// Turns the key polled this iteration into a toggle mutation.
pub struct InputController {
    recording_supported: bool,
}

impl InputController {
    pub fn new(recording_supported: bool) -> Self {
        Self {
            recording_supported,
        }
    }

    /// Apply at most one key press. Returns the run state afterwards.
    pub fn handle(&self, key: Option<u32>, toggles: &mut ToggleState) -> RunState {
        let Some(action) = key.and_then(Action::from_key_code) else {
            return toggles.run_state();
        };
        if action == Action::Flip(Toggle::Recording) && !self.recording_supported {
            debug!("recording disabled; ignoring record key");
            return toggles.run_state();
        }
        if toggles.run_state() == RunState::Stopped {
            return RunState::Stopped;
        }

        toggles.apply(action);
        match action {
            Action::Stop => info!("ESC pressed, stopping capture"),
            _ => debug!(?action, state = %toggles.describe(), "toggles changed"),
        }
        toggles.run_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn key_table() {
        assert_eq!(Action::from_key_code(27), Some(Action::Stop));
        assert_eq!(Action::from_key_code('1' as u32), Some(Action::Flip(Toggle::Blur)));
        assert_eq!(Action::from_key_code('7' as u32), Some(Action::Flip(Toggle::Grayscale)));
        assert_eq!(Action::from_key_code('9' as u32), Some(Action::Flip(Toggle::HalfHeight)));
        assert_eq!(Action::from_key_code('A' as u32), Some(Action::RotateClockwise));
        assert_eq!(Action::from_key_code('D' as u32), Some(Action::Flip(Toggle::Recording)));
        assert_eq!(Action::from_key_code('0' as u32), None);
        assert_eq!(Action::from_key_code('E' as u32), None);
    }

    #[test]
    fn esc_only_clears_capturing() {
        let controller = InputController::new(true);
        let mut toggles = ToggleState::new();
        toggles.blur = true;
        toggles.rotate_clockwise();
        toggles.rotate_clockwise();
        let before = toggles.clone();

        assert_eq!(controller.handle(Some(KEY_ESC), &mut toggles), RunState::Stopped);
        assert!(!toggles.capturing);
        assert_eq!(
            toggles,
            ToggleState {
                capturing: false,
                ..before
            }
        );
    }

    #[test]
    fn four_rotate_presses_return_to_start() {
        let controller = InputController::new(true);
        let mut toggles = ToggleState::new();
        for _ in 0..3 {
            toggles.rotate_clockwise();
        }
        for expected in [0, 1, 2, 3] {
            controller.handle(Some('A' as u32), &mut toggles);
            assert_eq!(toggles.rotation_quadrants(), expected);
        }
    }

    #[test]
    fn record_key_ignored_without_recording_support() {
        let mut toggles = ToggleState::new();
        InputController::new(false).handle(Some('D' as u32), &mut toggles);
        assert!(!toggles.recording);
        InputController::new(true).handle(Some('D' as u32), &mut toggles);
        assert!(toggles.recording);
    }

    #[test]
    fn nothing_pending_is_a_no_op() {
        let mut toggles = ToggleState::new();
        assert_eq!(InputController::new(true).handle(None, &mut toggles), RunState::Running);
        assert_eq!(toggles, ToggleState::new());
    }

    proptest! {
        #[test]
        fn non_esc_keys_keep_running(code in any::<u32>().prop_filter("not ESC", |c| *c != KEY_ESC)) {
            let mut toggles = ToggleState::new();
            let state = InputController::new(true).handle(Some(code), &mut toggles);
            prop_assert_eq!(state, RunState::Running);
            prop_assert!(toggles.capturing);
            prop_assert!(toggles.rotation_quadrants() < 4);
        }
    }
}
