//! Minimal playback collaborator
//!
//! Tracks the play state and current track and shows the play state on
//! the status LED. A real audio engine plugs in through the same
//! `Playback` trait.

use defmt::*;
use embassy_rp::gpio::Output;

use rcserial_core::{PlayControl, Playback};

pub struct Player {
    led: Output<'static>,
    playing: bool,
    track: u16,
    track_count: u16,
}

impl Player {
    pub fn new(led: Output<'static>, track_count: u16) -> Self {
        Self {
            led,
            playing: false,
            track: 0,
            track_count: track_count.max(1),
        }
    }
}

impl Playback for Player {
    fn control(&mut self, op: PlayControl) {
        match op {
            PlayControl::Next => {
                self.track = (self.track + 1) % self.track_count;
                info!("Next track: {}", self.track);
            }
            PlayControl::Previous => {
                self.track = self.track.checked_sub(1).unwrap_or(self.track_count - 1);
                info!("Previous track: {}", self.track);
            }
            PlayControl::Play => {
                self.playing = true;
                self.led.set_high();
                info!("Play (track {})", self.track);
            }
            PlayControl::Pause => {
                self.playing = false;
                self.led.set_low();
                info!("Pause (track {})", self.track);
            }
        }
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
