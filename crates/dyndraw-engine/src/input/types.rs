/// Keyboard key identifier.
///
/// Only the keys the viewer reacts to are named; everything else maps to
/// `Key::Unknown` with the platform key code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,

    /// Platform-dependent key not represented here.
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Platform-agnostic window/input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The user asked the window to close.
    CloseRequested,

    /// Drawable size changed, physical pixels.
    Resized { width: u32, height: u32 },

    Focused(bool),

    Key {
        key: Key,
        state: KeyState,
        repeat: bool,
    },
}

impl InputEvent {
    /// True for a non-repeat press of `key`.
    pub fn is_press(&self, key: Key) -> bool {
        matches!(
            self,
            InputEvent::Key { key: k, state: KeyState::Pressed, repeat: false } if *k == key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_ignores_release_and_repeat() {
        let press = InputEvent::Key { key: Key::Escape, state: KeyState::Pressed, repeat: false };
        let release = InputEvent::Key { key: Key::Escape, state: KeyState::Released, repeat: false };
        let repeat = InputEvent::Key { key: Key::Escape, state: KeyState::Pressed, repeat: true };

        assert!(press.is_press(Key::Escape));
        assert!(!press.is_press(Key::Unknown(0)));
        assert!(!release.is_press(Key::Escape));
        assert!(!repeat.is_press(Key::Escape));
    }
}
