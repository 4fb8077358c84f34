//! Single-byte remote commands
//!
//! The wire protocol is an unframed ASCII stream. Three bytes carry a
//! meaning, everything else passes through (it is still echoed).

use crate::playback::{PlayControl, Playback};

/// Byte selecting the next track
pub const NEXT_BYTE: u8 = b'n';

/// Byte selecting the previous track
pub const PREVIOUS_BYTE: u8 = b'p';

/// Byte toggling play/pause
pub const TOGGLE_BYTE: u8 = b' ';

/// Command decoded from one received byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Next,
    Previous,
    TogglePlayPause,
}

impl Command {
    /// Classify a received byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            NEXT_BYTE => Some(Command::Next),
            PREVIOUS_BYTE => Some(Command::Previous),
            TOGGLE_BYTE => Some(Command::TogglePlayPause),
            _ => None,
        }
    }

    /// Control operation for this command given the current play state
    pub fn resolve(self, is_playing: bool) -> PlayControl {
        match self {
            Command::Next => PlayControl::Next,
            Command::Previous => PlayControl::Previous,
            Command::TogglePlayPause if is_playing => PlayControl::Pause,
            Command::TogglePlayPause => PlayControl::Play,
        }
    }

    /// Resolve against the collaborator's state and invoke it
    ///
    /// The state read and the control call are not atomic; the dispatch
    /// task is the only caller that changes play state.
    pub fn apply<P: Playback + ?Sized>(self, playback: &mut P) -> PlayControl {
        let op = self.resolve(playback.is_playing());
        playback.control(op);
        op
    }
}
