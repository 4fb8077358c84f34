//! Board-agnostic core of the serial remote control receiver
//!
//! This crate contains all logic that does not depend on a specific chip:
//!
//! - Single-byte command classification
//! - The playback collaborator interface
//! - The event dispatcher (echo, classify, recover)
//! - The queued receive path between interrupt side and dispatch task
//! - The link lifecycle (begin, stop, raw writes, serve loop)
//! - Default configuration and the startup sequence

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod dispatch;
pub mod link;
pub mod playback;
pub mod rx;
pub mod startup;

pub use command::Command;
pub use config::RemoteConfig;
pub use dispatch::{write_fully, DispatchStats, Dispatcher, Outcome, WriteError};
pub use link::{Activity, LinkError, RemoteLink};
pub use playback::{PlayControl, Playback};
pub use rx::{QueuedPort, RxProducer, RxQueues};
pub use startup::bring_up;
