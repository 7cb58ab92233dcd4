// ABOUTME: Trait boundary between the state machine and the telephony engine it drives
// ABOUTME: Implemented by the libGammu FFI engine and by the in-process dummy phone

//! Telephony engine boundary
//!
//! The state machine never talks to a device itself. Everything that touches
//! configuration files, transports, PDUs or the modem goes through two traits:
//!
//! * [`Driver`] - library-wide entry points: configuration lookup, context
//!   allocation, the multi-part encoder and the error string table
//! * [`Context`] - one allocated engine context (`GSM_StateMachine`). Dropping
//!   the context releases it.
//!
//! Two engines ship with the crate:
//!
//! * [`dummy::DummyDriver`] - a scripted phone living in process memory
//! * `native::NativeDriver` - libGammu over FFI, behind the `native` feature

pub mod dummy;
#[cfg(feature = "native")]
pub mod native;
mod status;

pub use status::{SendStatus, StatusSlot};

use crate::datatypes::{ErrorCode, MultiPartSmsInfo, MultiSmsMessage, Smsc, SmsMessage};
use std::path::Path;

/// Library-wide engine entry points
pub trait Driver {
    /// Parsed configuration file
    type Config;

    /// Allocated engine context
    type Context: Context<Config = Self::Config>;

    /// Locates and parses the configuration.
    ///
    /// `None` searches the platform default locations.
    fn find_config(&self, path: Option<&Path>) -> Result<Self::Config, ErrorCode>;

    /// Allocates a fresh engine context, `None` when out of memory
    fn alloc_context(&self) -> Option<Self::Context>;

    /// Splits a long message into ready-to-send segments, in order
    fn encode_multipart(&self, info: &MultiPartSmsInfo) -> Result<MultiSmsMessage, ErrorCode>;

    /// Human readable description of a status code
    fn error_string(&self, code: ErrorCode) -> String {
        code.description().to_string()
    }

    /// Enables the engine's own debug log at `level`, written to `file`
    fn set_debug(&self, _level: &str, _file: &Path) -> Result<(), ErrorCode> {
        Ok(())
    }
}

/// One allocated engine context
pub trait Context {
    type Config;

    /// Loads `config` into connection slot `slot`
    fn read_config(&mut self, config: &Self::Config, slot: usize) -> Result<(), ErrorCode>;

    /// Marks the first `count` connection slots as active
    fn set_config_num(&mut self, count: usize);

    /// Opens the transport; `reply_num` is how many times each command is retried
    fn init_connection(&mut self, reply_num: i32) -> Result<(), ErrorCode>;

    /// Closes the transport
    fn terminate_connection(&mut self) -> Result<(), ErrorCode>;

    /// Registers the slot the send-completion callback writes into
    fn set_send_status_callback(&mut self, slot: StatusSlot);

    /// Reads the service center at `smsc.location` into `smsc`
    fn get_smsc(&mut self, smsc: &mut Smsc) -> Result<(), ErrorCode>;

    /// Submits one message; confirmation arrives later through the callback
    fn send_sms(&mut self, sms: &SmsMessage) -> Result<(), ErrorCode>;

    /// Pumps the device read channel once. Callbacks fire from inside this call.
    ///
    /// Returns the number of bytes read.
    fn read_device(&mut self, wait_for_reply: bool) -> usize;
}
