// ABOUTME: Crate root for the libGammu binding: phone state machines, SMS sending and engine drivers
// ABOUTME: Re-exports the client API; the libGammu engine itself sits behind the `native` feature

//! Send SMS through a phone driven by libGammu.
//!
//! A [`StateMachine`] owns one configured phone connection. It connects, reads
//! the service center number and sends single or multi-part text messages,
//! waiting for each network confirmation up to a timeout.
//!
//! The engine underneath is pluggable. With the `native` feature
//! `gammu::engine::native::NativeDriver` drives libGammu; the
//! [`engine::dummy::DummyDriver`] simulates a phone in process.
//!
//! ```rust
//! use gammu::{StateMachineBuilder, engine::dummy::DummyDriver};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), gammu::GammuError> {
//! let mut sm = StateMachineBuilder::new()
//!     .timeout(Duration::from_secs(5))
//!     .build_with(DummyDriver::new())?;
//!
//! sm.connect()?;
//! sm.send_sms("+15550123456", "Zażółć gęślą jaźń")?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod datatypes;
pub mod engine;

#[cfg(test)]
mod tests;

pub use client::{
    AsyncStateMachine, GammuError, GammuResult, NativeError, StateMachine, StateMachineBuilder,
};
pub use datatypes::{ErrorCode, UnicodeString};
