//! MegaD I2C sensor bus module
//!
//! - `channel`: Channel enumeration and query descriptors
//! - `client`: Low-level HTTP transport to the controller
//! - `parse`: Plain-text response decoding
//! - `poller`: Scheduled polling and refresh commands

pub mod channel;
pub mod client;
pub mod parse;
pub mod poller;

pub use channel::{Channel, I2cQuery};
pub use client::{MegaDClient, SensorTransport};
pub use parse::CombinedReading;
pub use poller::{PollMode, PollerConfig, SensorPoller};
