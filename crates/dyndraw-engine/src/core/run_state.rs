use crate::input::{InputEvent, Key};

/// Why the loop stopped.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ExitReason {
    CloseRequested,
    EscapePressed,
    /// An app callback returned `AppControl::Exit`.
    App,
    /// A fatal error was recorded.
    Fatal,
}

/// The loop's `running` flag.
///
/// Starts running; once stopped it stays stopped and keeps the first reason.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    stopped: Option<ExitReason>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.stopped.is_none()
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.stopped
    }

    /// Applies one event; returns whether the loop is still running.
    pub fn apply(&mut self, event: &InputEvent) -> bool {
        if event == &InputEvent::CloseRequested {
            self.stop(ExitReason::CloseRequested);
        } else if event.is_press(Key::Escape) {
            self.stop(ExitReason::EscapePressed);
        }
        self.is_running()
    }

    pub fn stop(&mut self, reason: ExitReason) {
        if self.stopped.is_none() {
            log::debug!("run state stopped: {reason:?}");
            self.stopped = Some(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyState;

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key { key, state, repeat: false }
    }

    #[test]
    fn starts_running() {
        let state = RunState::new();
        assert!(state.is_running());
        assert_eq!(state.exit_reason(), None);
    }

    #[test]
    fn close_request_stops() {
        let mut state = RunState::new();
        assert!(!state.apply(&InputEvent::CloseRequested));
        assert_eq!(state.exit_reason(), Some(ExitReason::CloseRequested));
    }

    #[test]
    fn escape_press_stops_but_release_does_not() {
        let mut state = RunState::new();
        assert!(state.apply(&key(Key::Escape, KeyState::Released)));
        assert!(state.apply(&key(Key::Unknown(57), KeyState::Pressed)));
        assert!(!state.apply(&key(Key::Escape, KeyState::Pressed)));
        assert_eq!(state.exit_reason(), Some(ExitReason::EscapePressed));
    }

    #[test]
    fn stop_is_terminal_and_keeps_first_reason() {
        let mut state = RunState::new();
        state.stop(ExitReason::Fatal);
        state.apply(&InputEvent::CloseRequested);
        state.stop(ExitReason::App);
        assert!(!state.is_running());
        assert_eq!(state.exit_reason(), Some(ExitReason::Fatal));
    }

    #[test]
    fn quit_within_one_batch() {
        let batch = [
            InputEvent::Focused(true),
            key(Key::Escape, KeyState::Pressed),
            InputEvent::Resized { width: 10, height: 10 },
        ];
        let mut state = RunState::new();
        let running: Vec<bool> = batch.iter().map(|event| state.apply(event)).collect();
        assert_eq!(running, [true, false, false]);
        assert_eq!(state.exit_reason(), Some(ExitReason::EscapePressed));
    }
}
