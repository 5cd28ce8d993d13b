// Desktop keyboard bindings onto the shared command vocabulary.
// A `Some` mapping means the key is consumed and the embedder must suppress
// the platform default (page scroll on arrows, space activation).

/// Keys recognized by the command map, in the platform's
/// `KeyboardEvent.key` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    K,
    J,
    L,
    M,
    F,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
}

impl Key {
    /// Parse a platform key string. Letters match case-insensitively.
    pub fn parse(key: &str) -> Option<Key> {
        match key {
            " " | "Spacebar" => return Some(Key::Space),
            _ => {}
        }
        match key.to_ascii_lowercase().as_str() {
            "k" => Some(Key::K),
            "j" => Some(Key::J),
            "l" => Some(Key::L),
            "m" => Some(Key::M),
            "f" => Some(Key::F),
            "escape" | "esc" => Some(Key::Escape),
            "arrowleft" => Some(Key::ArrowLeft),
            "arrowright" => Some(Key::ArrowRight),
            "arrowup" => Some(Key::ArrowUp),
            "arrowdown" => Some(Key::ArrowDown),
            _ => None,
        }
    }
}

/// Command vocabulary shared with touch gestures and overlay buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    TogglePlay,
    SeekForward,
    SeekBackward,
    VolumeUp,
    VolumeDown,
    ToggleMute,
    ToggleFullscreen,
    ExitFullscreen,
}

/// Map a key press to a command.
///
/// Keys inside text inputs are never handled. `Escape` maps only while
/// fullscreen, so the platform keeps its default meaning otherwise.
pub fn command_for_key(key: Key, is_fullscreen: bool, in_text_input: bool) -> Option<KeyCommand> {
    if in_text_input {
        return None;
    }
    match key {
        Key::Space | Key::K => Some(KeyCommand::TogglePlay),
        Key::ArrowRight | Key::L => Some(KeyCommand::SeekForward),
        Key::ArrowLeft | Key::J => Some(KeyCommand::SeekBackward),
        Key::ArrowUp => Some(KeyCommand::VolumeUp),
        Key::ArrowDown => Some(KeyCommand::VolumeDown),
        Key::M => Some(KeyCommand::ToggleMute),
        Key::F => Some(KeyCommand::ToggleFullscreen),
        Key::Escape => is_fullscreen.then_some(KeyCommand::ExitFullscreen),
    }
}
