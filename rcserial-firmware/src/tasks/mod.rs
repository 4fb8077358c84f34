//! Embassy async tasks
//!
//! The RX pump produces events, the remote task consumes them.

pub mod remote;
pub mod rx_pump;

pub use remote::remote_task;
pub use rx_pump::rx_pump_task;
