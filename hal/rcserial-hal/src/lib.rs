//! rcserial Hardware Abstraction Layer
//!
//! This crate defines the contract between the remote control core and
//! a chip-specific serial driver. A driver is used in two phases:
//!
//! ```text
//! ┌──────────────────────────────┐  configure / assign_pins / install
//! │  UartDriver (startup half)   │ ─────────────────────────────────┐
//! └──────────────────────────────┘                                  │
//!                                                                   ▼
//! ┌──────────────────────────────┐  next_event / read_bytes / write_bytes
//! │  UartPort (steady state)     │  flush_rx / buffered_len
//! └──────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartDriver`] - One-time line setup, fails with startup errors
//! - [`uart::UartPort`] - Event notification plus byte read/write primitives

#![no_std]
#![deny(unsafe_code)]

pub mod error;
pub mod event;
pub mod uart;

// Re-export key types at crate root for convenience
pub use error::{ConfigError, DriverInitError, PinError, StartupError};
pub use event::UartEvent;
pub use uart::{
    BufferConfig, DataBits, FlowControl, Parity, PinAssignment, StopBits, UartConfig, UartDriver,
    UartPort,
};
