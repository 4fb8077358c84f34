//! Playback collaborator interface
//!
//! The playback engine is owned elsewhere; the dispatcher only needs to
//! fire control operations at it and ask whether it is playing.

/// Control operations the dispatcher can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayControl {
    Next,
    Previous,
    Play,
    Pause,
}

/// Playback subsystem as seen from the dispatcher
///
/// Called synchronously from the single dispatch context. Implementations
/// must be safe to call from that context; no locking is imposed here.
pub trait Playback {
    /// Fire-and-forget control request
    fn control(&mut self, op: PlayControl);

    /// Current play state, used to pick Play or Pause on a toggle
    fn is_playing(&self) -> bool;
}

impl<T: Playback + ?Sized> Playback for &mut T {
    fn control(&mut self, op: PlayControl) {
        (**self).control(op)
    }

    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
}
