// ABOUTME: In-process scripted phone implementing the engine traits without hardware or libGammu
// ABOUTME: Lets callers script connection failures and send outcomes and inspect what was submitted

//! Dummy telephony engine
//!
//! Plays the part of libGammu's own `dummy` connection: configuration lookup,
//! connection setup and SMS submission all succeed against an imaginary phone
//! unless a failure has been scripted. Submitted messages are confirmed on the
//! next device pump, the same way the native library fires its send callback
//! from inside `GSM_ReadDevice`.
//!
//! ```rust
//! use gammu::client::StateMachine;
//! use gammu::engine::dummy::{DummyDriver, SendOutcome};
//!
//! let phone = DummyDriver::new().with_smsc("+4790002100");
//! phone.push_outcome(SendOutcome::Confirm);
//!
//! let mut sm = StateMachine::with_driver(phone.clone(), None)?;
//! sm.connect()?;
//! sm.send_sms("123456", "hi")?;
//!
//! assert_eq!(phone.submitted()[0].smsc.number.to_string(), "+4790002100");
//! # Ok::<(), gammu::client::GammuError>(())
//! ```

use crate::datatypes::{
    ErrorCode, MultiPartSmsInfo, MultiSmsMessage, PduType, SmsCoding, SmsMessage, Smsc, UdhType,
    UnicodeString, UserDataHeader,
};
use crate::engine::{Context, Driver, StatusSlot};
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Service center the dummy phone reports unless told otherwise
pub const DEFAULT_SMSC: &str = "+15550100000";

/// Connection slots a context can hold
const MAX_CONFIG_NUM: usize = 5;

/// Most segments one long message may be split into
const MAX_SEGMENTS: usize = 50;

/// What happens to the next submitted message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Network confirms the message on the next pump
    Confirm,
    /// Callback fires on the next pump with this nonzero status
    Fail(i32),
    /// The submit call itself returns this code
    Reject(ErrorCode),
    /// Accepted, but no confirmation ever arrives
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFile {
    Valid,
    Invalid,
}

#[derive(Debug)]
struct Phone {
    default_config: bool,
    config_files: HashMap<PathBuf, ConfigFile>,
    allocation_fails: bool,
    allocations: usize,
    frees: usize,
    connect_error: Option<ErrorCode>,
    disconnect_error: Option<ErrorCode>,
    smsc: Result<String, ErrorCode>,
    outcomes: VecDeque<SendOutcome>,
    in_flight: VecDeque<(SendOutcome, i32)>,
    submitted: Vec<SmsMessage>,
    next_reference: i32,
    next_concat_id: u8,
    pumps: usize,
    pump_delay: Duration,
    connected: bool,
    debug: Option<(String, PathBuf)>,
}

impl Default for Phone {
    fn default() -> Self {
        Self {
            default_config: true,
            config_files: HashMap::new(),
            allocation_fails: false,
            allocations: 0,
            frees: 0,
            connect_error: None,
            disconnect_error: None,
            smsc: Ok(DEFAULT_SMSC.to_string()),
            outcomes: VecDeque::new(),
            in_flight: VecDeque::new(),
            submitted: Vec::new(),
            next_reference: 1,
            next_concat_id: 1,
            pumps: 0,
            pump_delay: Duration::ZERO,
            connected: false,
            debug: None,
        }
    }
}

/// Scripted phone. Clones share the same phone, so a test can keep one clone
/// for inspection while the state machine owns another.
#[derive(Debug, Clone, Default)]
pub struct DummyDriver {
    phone: Arc<Mutex<Phone>>,
}

impl DummyDriver {
    /// Phone with a default configuration, a working connection and SMSC
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `path` a readable, valid configuration file
    pub fn with_config_file(self, path: impl Into<PathBuf>) -> Self {
        self.lock().config_files.insert(path.into(), ConfigFile::Valid);
        self
    }

    /// Makes `path` a configuration file that is found but cannot be applied
    pub fn with_invalid_config_file(self, path: impl Into<PathBuf>) -> Self {
        self.lock().config_files.insert(path.into(), ConfigFile::Invalid);
        self
    }

    /// Removes the configuration from the default search path
    pub fn without_default_config(self) -> Self {
        self.lock().default_config = false;
        self
    }

    /// Service center number reported on connect
    pub fn with_smsc(self, number: impl Into<String>) -> Self {
        self.lock().smsc = Ok(number.into());
        self
    }

    /// Makes SMSC retrieval fail with `code`
    pub fn with_smsc_error(self, code: ErrorCode) -> Self {
        self.lock().smsc = Err(code);
        self
    }

    /// Makes connection setup fail with `code`
    pub fn with_connect_error(self, code: ErrorCode) -> Self {
        self.lock().connect_error = Some(code);
        self
    }

    /// Makes connection teardown fail with `code`
    pub fn with_disconnect_error(self, code: ErrorCode) -> Self {
        self.lock().disconnect_error = Some(code);
        self
    }

    /// Makes context allocation report out-of-memory
    pub fn with_allocation_failure(self) -> Self {
        self.lock().allocation_fails = true;
        self
    }

    /// Time each waiting device pump takes
    pub fn with_pump_delay(self, delay: Duration) -> Self {
        self.lock().pump_delay = delay;
        self
    }

    /// Queues outcomes for the next submissions, in order
    pub fn with_outcomes(self, outcomes: impl IntoIterator<Item = SendOutcome>) -> Self {
        self.lock().outcomes.extend(outcomes);
        self
    }

    /// Queues the outcome of the next submission. Unscripted submissions are confirmed.
    pub fn push_outcome(&self, outcome: SendOutcome) {
        self.lock().outcomes.push_back(outcome);
    }

    /// Messages accepted by the phone, in submission order
    pub fn submitted(&self) -> Vec<SmsMessage> {
        self.lock().submitted.clone()
    }

    /// Removes and returns the messages accepted so far
    pub fn take_submitted(&self) -> Vec<SmsMessage> {
        std::mem::take(&mut self.lock().submitted)
    }

    /// Contexts allocated so far
    pub fn allocations(&self) -> usize {
        self.lock().allocations
    }

    /// Contexts released so far
    pub fn frees(&self) -> usize {
        self.lock().frees
    }

    /// Device pumps performed so far
    pub fn pump_count(&self) -> usize {
        self.lock().pumps
    }

    /// Returns true while a context holds the connection open
    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Debug level and log file requested through [`Driver::set_debug`]
    pub fn debug_settings(&self) -> Option<(String, PathBuf)> {
        self.lock().debug.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Phone> {
        lock_phone(&self.phone)
    }
}

fn lock_phone(phone: &Mutex<Phone>) -> MutexGuard<'_, Phone> {
    phone.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Configuration found by the dummy phone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyConfig {
    /// `None` for the default search path
    pub path: Option<PathBuf>,
    valid: bool,
}

impl Driver for DummyDriver {
    type Config = DummyConfig;
    type Context = DummyContext;

    fn find_config(&self, path: Option<&Path>) -> Result<DummyConfig, ErrorCode> {
        let phone = self.lock();
        match path {
            None if phone.default_config => Ok(DummyConfig {
                path: None,
                valid: true,
            }),
            None => Err(ErrorCode::CantOpenFile),
            Some(path) => match phone.config_files.get(path) {
                Some(file) => Ok(DummyConfig {
                    path: Some(path.to_path_buf()),
                    valid: *file == ConfigFile::Valid,
                }),
                None => Err(ErrorCode::CantOpenFile),
            },
        }
    }

    fn alloc_context(&self) -> Option<DummyContext> {
        let mut phone = self.lock();
        if phone.allocation_fails {
            return None;
        }
        phone.allocations += 1;
        Some(DummyContext {
            phone: Arc::clone(&self.phone),
            slot: None,
            loaded: false,
            active_slots: 0,
            connected: false,
        })
    }

    fn encode_multipart(&self, info: &MultiPartSmsInfo) -> Result<MultiSmsMessage, ErrorCode> {
        if info.entries.is_empty() {
            return Err(ErrorCode::Empty);
        }

        let coding = if info.unicode_coding {
            SmsCoding::UnicodeNoCompression
        } else {
            SmsCoding::DefaultNoCompression
        };

        let mut segments = Vec::new();
        for entry in &info.entries {
            // Counts UTF-16 units; GSM escape characters are not weighted
            let units: Vec<u16> = entry.buffer.units().collect();
            if units.len() <= coding.max_single_sms_length() {
                segments.push(segment(&units, coding, info, UserDataHeader::default()));
                continue;
            }
            if !entry.kind.is_concatenated() {
                return Err(ErrorCode::MoreMemory);
            }

            let chunks = split_units(&units, coding.max_segment_length());
            if segments.len() + chunks.len() > MAX_SEGMENTS {
                return Err(ErrorCode::MoreMemory);
            }

            let reference = {
                let mut phone = self.lock();
                let id = phone.next_concat_id;
                phone.next_concat_id = id.wrapping_add(1);
                id
            };
            let total = chunks.len();
            for (index, chunk) in chunks.iter().enumerate() {
                let part = index + 1;
                let udh = UserDataHeader {
                    kind: UdhType::ConcatenatedMessages,
                    data: Bytes::from(vec![0x05, 0x00, 0x03, reference, total as u8, part as u8]),
                    id8bit: i32::from(reference),
                    id16bit: -1,
                    part_number: part as i32,
                    all_parts: total as i32,
                };
                segments.push(segment(chunk, coding, info, udh));
            }
        }

        debug!(
            "Dummy encoder produced {} segment(s), unicode: {}",
            segments.len(),
            coding.is_unicode()
        );
        Ok(MultiSmsMessage::new(segments))
    }

    fn set_debug(&self, level: &str, file: &Path) -> Result<(), ErrorCode> {
        self.lock().debug = Some((level.to_string(), file.to_path_buf()));
        Ok(())
    }
}

fn segment(
    units: &[u16],
    coding: SmsCoding,
    info: &MultiPartSmsInfo,
    udh: UserDataHeader,
) -> SmsMessage {
    SmsMessage {
        smsc: Smsc::default(),
        number: UnicodeString::default(),
        text: UnicodeString::from_units(units),
        length: units.len(),
        pdu: PduType::Submit,
        udh,
        coding,
        class: info.class,
        native_image: None,
    }
}

/// Splits `units` into chunks of at most `size`, never separating a surrogate pair
fn split_units(units: &[u16], size: usize) -> Vec<&[u16]> {
    let mut chunks = Vec::new();
    let mut rest = units;
    while !rest.is_empty() {
        let mut end = size.min(rest.len());
        if end > 1 && end < rest.len() && (0xD800..0xDC00).contains(&rest[end - 1]) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Context allocated from a [`DummyDriver`]
#[derive(Debug)]
pub struct DummyContext {
    phone: Arc<Mutex<Phone>>,
    slot: Option<StatusSlot>,
    loaded: bool,
    active_slots: usize,
    connected: bool,
}

impl DummyContext {
    fn lock(&self) -> MutexGuard<'_, Phone> {
        lock_phone(&self.phone)
    }
}

impl Context for DummyContext {
    type Config = DummyConfig;

    fn read_config(&mut self, config: &DummyConfig, slot: usize) -> Result<(), ErrorCode> {
        if slot >= MAX_CONFIG_NUM {
            return Err(ErrorCode::InvalidLocation);
        }
        if !config.valid {
            return Err(ErrorCode::UnknownConnectionTypeString);
        }
        self.loaded = true;
        Ok(())
    }

    fn set_config_num(&mut self, count: usize) {
        self.active_slots = count;
    }

    fn init_connection(&mut self, _reply_num: i32) -> Result<(), ErrorCode> {
        if !self.loaded || self.active_slots == 0 {
            return Err(ErrorCode::Unconfigured);
        }
        let mut phone = self.lock();
        if let Some(code) = phone.connect_error {
            return Err(code);
        }
        phone.connected = true;
        drop(phone);
        self.connected = true;
        Ok(())
    }

    fn terminate_connection(&mut self) -> Result<(), ErrorCode> {
        if !self.connected {
            return Err(ErrorCode::NotConnected);
        }
        let mut phone = self.lock();
        if let Some(code) = phone.disconnect_error {
            return Err(code);
        }
        phone.connected = false;
        phone.in_flight.clear();
        drop(phone);
        self.connected = false;
        Ok(())
    }

    fn set_send_status_callback(&mut self, slot: StatusSlot) {
        self.slot = Some(slot);
    }

    fn get_smsc(&mut self, smsc: &mut Smsc) -> Result<(), ErrorCode> {
        if !self.connected {
            return Err(ErrorCode::NotConnected);
        }
        let number = self.lock().smsc.clone()?;
        smsc.number = UnicodeString::encode(&number);
        smsc.name = UnicodeString::encode("Dummy SMSC");
        Ok(())
    }

    fn send_sms(&mut self, sms: &SmsMessage) -> Result<(), ErrorCode> {
        if !self.connected {
            return Err(ErrorCode::NotConnected);
        }
        if sms.smsc.number.is_empty() {
            return Err(ErrorCode::EmptySmsc);
        }

        let mut phone = self.lock();
        let outcome = phone.outcomes.pop_front().unwrap_or(SendOutcome::Confirm);
        if let SendOutcome::Reject(code) = outcome {
            return Err(code);
        }

        let reference = phone.next_reference;
        phone.next_reference += 1;
        phone.submitted.push(sms.clone());
        phone.in_flight.push_back((outcome, reference));
        debug!("Dummy phone accepted message, reference {}", reference);
        Ok(())
    }

    fn read_device(&mut self, wait_for_reply: bool) -> usize {
        let (next, delay) = {
            let mut phone = self.lock();
            phone.pumps += 1;
            (phone.in_flight.pop_front(), phone.pump_delay)
        };

        if wait_for_reply && !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let Some(slot) = &self.slot else {
            return 0;
        };
        match next {
            Some((SendOutcome::Confirm, reference)) => {
                slot.complete(0, reference);
                1
            }
            Some((SendOutcome::Fail(status), reference)) => {
                slot.complete(status, reference);
                1
            }
            _ => 0,
        }
    }
}

impl Drop for DummyContext {
    fn drop(&mut self) {
        let mut phone = self.lock();
        phone.frees += 1;
        if self.connected {
            phone.connected = false;
        }
    }
}
