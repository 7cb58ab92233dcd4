// ABOUTME: Client module providing the state machine handle, its builder, async wrapper and error types
// ABOUTME: Exports all client components generic over the engine driver

//! Phone Client Module
//!
//! This module provides the state machine handle for talking to a phone
//! through an engine [`Driver`](crate::engine::Driver):
//!
//! * **Scoped resources** - the engine context is freed exactly once, on
//!   [`StateMachine::free`] or drop
//! * **Synchronous sends** - the callback-driven confirmation is awaited with
//!   a bounded poll loop
//! * **Long messages** - text is split into concatenated segments and sent in
//!   order, stopping at the first failure
//! * **Async facade** - [`AsyncStateMachine`] runs the blocking calls on the
//!   tokio blocking pool
//!
//! ## Quick Start
//!
//! ```rust
//! use gammu::client::{GammuError, StateMachine};
//! use gammu::engine::dummy::DummyDriver;
//!
//! # fn main() -> Result<(), GammuError> {
//! let mut sm = StateMachine::with_driver(DummyDriver::new(), None)?;
//! sm.connect()?;
//!
//! let reference = sm.send_sms("123456", "Hello!")?;
//! let references = sm.send_long_sms("123456", &"long text ".repeat(40))?;
//! assert!(references.len() > 1);
//! # let _ = reference;
//!
//! sm.disconnect()?;
//! sm.free();
//! # Ok(())
//! # }
//! ```

pub mod async_client;
pub mod builder;
pub mod error;
pub mod state_machine;

pub use async_client::AsyncStateMachine;
pub use builder::StateMachineBuilder;
pub use error::{GammuError, GammuResult, NativeError};
pub use state_machine::{DEFAULT_TIMEOUT, StateMachine};
